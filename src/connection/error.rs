use thiserror::Error;

use super::state::State;

/// Error returned by state-guarded [`Connection`](crate::Connection) operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The operation is not allowed in the connection's current state.
    ///
    /// Guarded operations never silently no-op; an illegal call always
    /// surfaces here.
    #[error("`{operation}` is not valid in the {state} state; reset the connection first")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the connection was in.
        state: State,
    },
}

impl ConnectionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionError::InvalidState { .. } => "connection_invalid_state",
        }
    }
}
