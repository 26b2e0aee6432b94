use crate::state::StateId;
use thiserror::Error;

/// Returned when the current state is not of the type the caller expected.
///
/// This is an ordinary, recoverable outcome: `at`, `with` and `update`
/// report it whenever the stored state is absent or of a different type.
/// The stored state is never modified when this error is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wrong state: expected {expected}, found {}", found_display(.found))]
pub struct WrongState {
    /// The state type the caller asked for
    pub expected: StateId,
    /// The state type actually stored, or `None` when no state is set
    pub found: Option<StateId>,
}

impl WrongState {
    pub(crate) fn new(expected: StateId, found: Option<StateId>) -> Self {
        Self { expected, found }
    }
}

fn found_display(found: &Option<StateId>) -> String {
    match found {
        Some(id) => id.to_string(),
        None => "no state".to_string(),
    }
}

/// Result type for typed state access.
pub type Result<T> = std::result::Result<T, WrongState>;
