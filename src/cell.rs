use crate::any_state::AnyState;
use parking_lot::Mutex;
use std::fmt;

/// A single slot holding at most one current state.
///
/// The cell is an opaque box: it never looks at the type of what it holds.
/// Typed access lives in [`StateHandle`](crate::StateHandle), which uses
/// [`StateCell::with_slot`] so that read-modify-write sequences happen under
/// this cell's lock.
#[derive(Default)]
pub struct StateCell {
    current: Mutex<Option<AnyState>>,
}

impl StateCell {
    /// Creates an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state, if any
    pub fn read(&self) -> Option<AnyState> {
        self.current.lock().clone()
    }

    /// Replaces the current state unconditionally; `None` clears the cell
    pub fn write(&self, state: Option<AnyState>) {
        let previous = {
            let mut current = self.current.lock();
            std::mem::replace(&mut *current, state)
        };
        // previous value is dropped outside the lock
        drop(previous);
    }

    /// Runs `f` with exclusive access to the slot
    pub(crate) fn with_slot<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Option<AnyState>) -> R,
    {
        let mut current = self.current.lock();
        f(&mut current)
    }
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current.try_lock() {
            Some(current) => f.debug_struct("StateCell").field("current", &*current).finish(),
            None => f.debug_struct("StateCell").field("current", &"<locked>").finish(),
        }
    }
}
