//! Error types used by the dispatch and sequencing layers.
//!
//! This module defines three error enums:
//!
//! - [`BusError`] — violations of a bus's declared channel vocabulary.
//! - [`SequenceError`] — misuse or breakdown of a [`SequenceRunner`](crate::SequenceRunner).
//! - [`StageError`] — failures raised by an individual stage operation.
//!
//! All are raised synchronously at the point of violation; there is no retry
//! policy anywhere in this layer. Each type provides `as_label` for
//! logs/metrics.
//!
//! Connection state-guard errors live in
//! [`connection::ConnectionError`](crate::ConnectionError).

use thiserror::Error;

/// # Errors produced by a [`Bus`](crate::Bus).
///
/// A bus owns a closed, explicitly declared set of channel names; these
/// errors reject attempts to step outside that vocabulary.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The channel name is already declared on this bus (case-sensitive).
    #[error("event `{name}` is already declared on this bus")]
    DuplicateEvent {
        /// The offending channel name.
        name: String,
    },

    /// The channel name was never declared on this bus.
    #[error("event `{name}` is not declared on this bus")]
    UndeclaredEvent {
        /// The unknown channel name.
        name: String,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::DuplicateEvent { .. } => "bus_duplicate_event",
            BusError::UndeclaredEvent { .. } => "bus_undeclared_event",
        }
    }
}

/// # Errors produced by stage execution.
///
/// Raised by [`Stage::invoke`](crate::Stage::invoke) when an operation cannot
/// run or fails.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The stage does not expose the requested operation.
    #[error("stage `{stage}` has no operation `{operation}`")]
    UnknownOperation {
        /// The stage name.
        stage: String,
        /// The requested operation name.
        operation: String,
    },

    /// The operation started but failed.
    #[error("stage execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl StageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::UnknownOperation { .. } => "stage_unknown_operation",
            StageError::Failed { .. } => "stage_failed",
        }
    }
}

/// # Errors produced by a [`SequenceRunner`](crate::SequenceRunner).
///
/// A runner drives at most one traversal at a time; these errors reject
/// starts that would violate that, and surface stage failures that stall an
/// in-flight traversal.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SequenceError {
    /// A traversal is already in flight on this runner.
    #[error("a traversal is already running; wait for Finish or cancel first")]
    AlreadyRunning,

    /// The runner stalled on a failed stage and will not run again.
    #[error("runner is stalled after a stage failure")]
    Stalled,

    /// The runner was cancelled; cancellation is terminal for the instance.
    #[error("runner was cancelled")]
    Cancelled,

    /// A stage operation failed during the start call.
    #[error("stage `{stage}` failed")]
    StageFailed {
        /// Name of the failed stage.
        stage: String,
        /// The underlying stage error.
        #[source]
        source: StageError,
    },
}

impl SequenceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SequenceError::AlreadyRunning => "sequence_already_running",
            SequenceError::Stalled => "sequence_stalled",
            SequenceError::Cancelled => "sequence_cancelled",
            SequenceError::StageFailed { .. } => "sequence_stage_failed",
        }
    }
}
