use crate::state::{State, StateId};
use std::any::Any;
use std::fmt;

/// Object-safe view of a [`State`], implemented for every state type.
trait ErasedState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedState>;
    fn erased_same_as(&self, other: &dyn Any) -> bool;
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<S: State> ErasedState for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedState> {
        Box::new(self.clone())
    }

    fn erased_same_as(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<S>().is_some_and(|other| self.same_as(other))
    }

    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type-erased state value that remembers which state type it holds.
///
/// This is what a cell stores and what `current_state` hands back. The
/// identifier is checked before any downcast, so a typed read can only
/// ever produce a value of exactly the requested type.
///
/// Two `AnyState`s are equal when their state types match and
/// [`State::same_as`] agrees, which by default ignores content.
pub struct AnyState {
    id: StateId,
    value: Box<dyn ErasedState>,
}

impl AnyState {
    /// Wraps a concrete state value
    pub fn new<S: State>(state: S) -> Self {
        Self {
            id: StateId::of::<S>(),
            value: Box::new(state),
        }
    }

    /// Identifier of the contained state type
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Check if the contained value is of state type `S`
    pub fn is<S: State>(&self) -> bool {
        self.id.is::<S>()
    }

    /// Get a reference to the contained value if it is of state type `S`
    pub fn downcast_ref<S: State>(&self) -> Option<&S> {
        if !self.is::<S>() {
            return None;
        }
        self.value.as_any().downcast_ref::<S>()
    }

    /// Copies the contained value out if it is of state type `S`
    pub fn cloned<S: State>(&self) -> Option<S> {
        self.downcast_ref::<S>().cloned()
    }
}

impl Clone for AnyState {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: self.value.clone_boxed(),
        }
    }
}

impl PartialEq for AnyState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value.erased_same_as(other.value.as_any())
    }
}

impl fmt::Debug for AnyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.debug_fmt(f)
    }
}

impl<S: State> From<S> for AnyState {
    fn from(state: S) -> Self {
        AnyState::new(state)
    }
}
