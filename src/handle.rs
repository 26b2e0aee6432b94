use crate::any_state::AnyState;
use crate::cell::StateCell;
use crate::error::{Result, WrongState};
use crate::state::{State, StateId};
use std::fmt;
use std::sync::Arc;

/// Typed access to one owner's [`StateCell`].
///
/// A handle is what [`StateTable::get_or_create`](crate::StateTable::get_or_create)
/// and [`StatefulExt::state`](crate::StatefulExt::state) return. Handles are
/// cheap to clone; every clone for the same owner points at the same cell.
///
/// `set` and `reset` may change the type of the current state at any time.
/// `update` can only evolve a state that is already of the expected type.
///
/// # Examples
///
/// ```
/// use sovran_state::{State, StateHandle, WrongState};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Disabled { opacity: f32 }
/// impl State for Disabled {}
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Normal;
/// impl State for Normal {}
///
/// let state = StateHandle::detached();
/// state.set(Disabled { opacity: 0.3 });
///
/// state.update(|disabled: &mut Disabled| disabled.opacity = 0.5)?;
/// assert_eq!(state.at::<Disabled>()?, Disabled { opacity: 0.5 });
///
/// // Wrong expectation leaves the state alone
/// assert!(state.update(|_: &mut Normal| {}).is_err());
/// assert_eq!(state.at::<Disabled>()?, Disabled { opacity: 0.5 });
/// # Ok::<(), WrongState>(())
/// ```
#[derive(Clone)]
pub struct StateHandle {
    cell: Arc<StateCell>,
}

impl StateHandle {
    pub(crate) fn from_cell(cell: Arc<StateCell>) -> Self {
        Self { cell }
    }

    /// Creates a handle to a fresh cell that belongs to no side table
    pub fn detached() -> Self {
        Self::from_cell(Arc::new(StateCell::new()))
    }

    /// The underlying untyped cell
    pub fn cell(&self) -> &StateCell {
        &self.cell
    }

    /// Returns true if both handles refer to the same cell
    pub fn ptr_eq(&self, other: &StateHandle) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Replaces the current state.
    ///
    /// No check is made against the previous state.
    pub fn set<S: State>(&self, state: S) {
        self.cell.write(Some(AnyState::new(state)));
    }

    /// Replaces the current state, or clears it when given `None`
    pub fn set_or_clear<S: State>(&self, state: Option<S>) {
        self.cell.write(state.map(AnyState::new));
    }

    /// Returns a copy of the current state without any type check
    pub fn current_state(&self) -> Option<AnyState> {
        self.cell.read()
    }

    /// Identifier of the current state type, if a state is set
    pub fn current_id(&self) -> Option<StateId> {
        self.cell.with_slot(|slot| slot.as_ref().map(AnyState::id))
    }

    /// Returns true if the current state is of type `S`
    pub fn is<S: State>(&self) -> bool {
        self.cell
            .with_slot(|slot| slot.as_ref().is_some_and(AnyState::is::<S>))
    }

    /// Returns a copy of the current state as an `S`.
    ///
    /// # Errors
    ///
    /// Returns [`WrongState`] if no state is set or the current state is not
    /// exactly of type `S`.
    pub fn at<S: State>(&self) -> Result<S> {
        self.with::<S, _, _>(S::clone)
    }

    /// Reads the current state as an `S` without copying it out.
    ///
    /// The closure runs while this owner's cell is locked, so it must not
    /// touch the same owner's state.
    ///
    /// # Errors
    ///
    /// Returns [`WrongState`] if no state is set or the current state is not
    /// exactly of type `S`.
    pub fn with<S, F, R>(&self, f: F) -> Result<R>
    where
        S: State,
        F: FnOnce(&S) -> R,
    {
        self.cell.with_slot(|slot| {
            let state = expect_state::<S>(slot)?;
            Ok::<_, WrongState>(f(state))
        })
    }

    /// Applies `f` to a copy of the current `S` and stores the copy back.
    ///
    /// The read, the mutation and the write-back happen under this owner's
    /// cell lock, so concurrent updates to the same owner never interleave.
    /// The closure must not touch the same owner's state.
    ///
    /// # Errors
    ///
    /// Returns [`WrongState`] if no state is set or the current state is not
    /// exactly of type `S`. The stored state is left unchanged in that case.
    pub fn update<S, F, R>(&self, f: F) -> Result<R>
    where
        S: State,
        F: FnOnce(&mut S) -> R,
    {
        let (result, previous) = self.cell.with_slot(|slot| {
            let mut copy = expect_state::<S>(slot)?.clone();
            let result = f(&mut copy);
            Ok::<_, WrongState>((result, slot.replace(AnyState::new(copy))))
        })?;
        drop(previous);
        Ok(result)
    }

    /// Clears the current state
    pub fn reset(&self) {
        self.cell.write(None);
    }
}

fn expect_state<S: State>(slot: &Option<AnyState>) -> Result<&S> {
    let expected = StateId::of::<S>();
    match slot {
        Some(current) => current
            .downcast_ref::<S>()
            .ok_or_else(|| WrongState::new(expected, Some(current.id()))),
        None => Err(WrongState::new(expected, None)),
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateHandle").field(&*self.cell).finish()
    }
}
