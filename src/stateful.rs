use crate::any_state::AnyState;
use crate::error::Result;
use crate::handle::StateHandle;
use crate::state::{State, StateId};
use crate::table::StateTable;
use std::sync::Arc;

/// Marks a type whose shared instances can carry a current state.
///
/// The state is not a field of the type: it lives in the process-wide
/// [`StateTable`], keyed by the identity of each `Arc` allocation. Implement
/// this marker and every `Arc<T>` gains the accessors of [`StatefulExt`].
///
/// # Examples
///
/// ```
/// use sovran_state::{State, Stateful, StatefulExt, WrongState};
/// use std::sync::Arc;
///
/// struct MyView;
/// impl Stateful for MyView {}
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Highlighted { color: u32 }
/// impl State for Highlighted {}
///
/// let view = Arc::new(MyView);
/// assert!(view.current_state().is_none());
///
/// view.set(Highlighted { color: 1 });
/// view.set(Highlighted { color: 2 });
/// assert_eq!(view.at::<Highlighted>()?, Highlighted { color: 2 });
///
/// view.reset();
/// assert!(view.current_state().is_none());
/// # Ok::<(), WrongState>(())
/// ```
pub trait Stateful: Send + Sync + 'static {}

/// State accessors for shared [`Stateful`] owners.
///
/// Every method resolves the owner's cell through [`StateTable::global`],
/// creating it on first use, and then delegates to [`StateHandle`].
pub trait StatefulExt {
    /// This owner's state handle
    fn state(&self) -> StateHandle;

    /// The current state without any type check
    fn current_state(&self) -> Option<AnyState> {
        self.state().current_state()
    }

    /// Identifier of the current state type
    fn current_id(&self) -> Option<StateId> {
        self.state().current_id()
    }

    /// Returns true if the current state is of type `S`
    fn is<S: State>(&self) -> bool {
        self.state().is::<S>()
    }

    /// Replaces the current state with `state`
    fn set<S: State>(&self, state: S) {
        self.state().set(state);
    }

    /// Replaces the current state, or clears it when given `None`
    fn set_or_clear<S: State>(&self, state: Option<S>) {
        self.state().set_or_clear(state);
    }

    /// Copy of the current state as an `S`, or [`WrongState`](crate::WrongState)
    fn at<S: State>(&self) -> Result<S> {
        self.state().at::<S>()
    }

    /// Reads the current state as an `S` in place
    fn with<S, F, R>(&self, f: F) -> Result<R>
    where
        S: State,
        F: FnOnce(&S) -> R,
    {
        self.state().with(f)
    }

    /// Evolves the current `S`; fails without touching it on a type mismatch
    fn update<S, F, R>(&self, f: F) -> Result<R>
    where
        S: State,
        F: FnOnce(&mut S) -> R,
    {
        self.state().update(f)
    }

    /// Clears the current state
    fn reset(&self) {
        self.state().reset();
    }
}

impl<T: Stateful + ?Sized> StatefulExt for Arc<T> {
    fn state(&self) -> StateHandle {
        StateTable::global().get_or_create(self)
    }
}
