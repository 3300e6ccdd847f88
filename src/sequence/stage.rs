//! # Stage abstraction and function-backed stage implementation.
//!
//! This module defines the [`Stage`] trait (the contract a collection item
//! must satisfy to be driven by a [`SequenceRunner`](crate::SequenceRunner))
//! and a convenient function-backed implementation [`StageFn`].
//! The common handle type is [`StageRef`], an `Arc<dyn Stage>` suitable for
//! sharing across handlers.
//!
//! A stage performs asynchronous work: invoking an operation only *starts*
//! it. The stage signals completion by emitting the agreed channel on its own
//! [`Emitter`], exactly once per invocation — a return value is not the
//! completion signal.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StageError;
use crate::events::Emitter;

/// Shared handle to a stage.
pub type StageRef = Arc<dyn Stage>;

/// # Unit of sequenced, completion-signalled work.
///
/// A `Stage` has a stable [`name`](Stage::name), an embedded [`Emitter`], and
/// named operations started through [`invoke`](Stage::invoke). The runner
/// subscribes to the stage's completion channel **before** invoking, so a
/// stage may legally complete synchronously, inside the `invoke` call stack.
///
/// # Example
/// ```
/// use signalbus::{Emitter, Stage, StageError};
///
/// struct Probe {
///     emitter: Emitter,
/// }
///
/// impl Stage for Probe {
///     fn name(&self) -> &str { "probe" }
///
///     fn emitter(&self) -> &Emitter { &self.emitter }
///
///     fn invoke(&self, operation: &str) -> Result<(), StageError> {
///         match operation {
///             "run" => {
///                 // kick off the work; completion fires later (or right now)
///                 self.emitter.emit("Done");
///                 Ok(())
///             }
///             other => Err(StageError::UnknownOperation {
///                 stage: "probe".into(),
///                 operation: other.into(),
///             }),
///         }
///     }
/// }
/// ```
pub trait Stage: Send + Sync + 'static {
    /// Returns a stable, human-readable stage name.
    fn name(&self) -> &str;

    /// The stage's own emitter, where its completion channel fires.
    fn emitter(&self) -> &Emitter;

    /// Starts the named operation.
    ///
    /// Returning `Ok(())` means the operation was *started*; the stage must
    /// later emit the completion channel on its emitter exactly once.
    fn invoke(&self, operation: &str) -> Result<(), StageError>;
}

type OpFn = Box<dyn Fn(&Emitter) -> Result<(), StageError> + Send + Sync>;

/// Function-backed [`Stage`].
///
/// Operations are registered by name at construction time; each receives the
/// stage's [`Emitter`] so it can fire the completion channel itself (or leave
/// that to some external driver for genuinely asynchronous work).
///
/// # Example
/// ```
/// use signalbus::{Stage, StageFn};
///
/// let stage = StageFn::new("greet")
///     .on("run", |emitter| {
///         emitter.emit("Done");
///         Ok(())
///     })
///     .arc();
///
/// stage.invoke("run").unwrap();
/// ```
pub struct StageFn {
    name: Arc<str>,
    emitter: Emitter,
    ops: HashMap<String, OpFn>,
}

impl StageFn {
    /// Creates a stage with no operations; chain [`StageFn::on`] to add them.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(Arc::clone(&name)),
            name,
            ops: HashMap::new(),
        }
    }

    /// Registers an operation under the given name (replaces any previous one).
    #[must_use]
    pub fn on(
        mut self,
        operation: &str,
        f: impl Fn(&Emitter) -> Result<(), StageError> + Send + Sync + 'static,
    ) -> Self {
        self.ops.insert(operation.to_string(), Box::new(f));
        self
    }

    /// Wraps the stage into the shared handle type.
    #[must_use]
    pub fn arc(self) -> StageRef {
        Arc::new(self)
    }
}

impl Stage for StageFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    fn invoke(&self, operation: &str) -> Result<(), StageError> {
        let f = self.ops.get(operation).ok_or_else(|| StageError::UnknownOperation {
            stage: self.name.to_string(),
            operation: operation.to_string(),
        })?;
        f(&self.emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_invoke_runs_registered_operation() {
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let stage = StageFn::new("s").on("run", move |_em| {
            *h.lock().unwrap() += 1;
            Ok(())
        });
        stage.invoke("run").unwrap();
        stage.invoke("run").unwrap();
        assert_eq!(*hits.lock().unwrap(), 2);
    }

    #[test]
    fn test_unknown_operation_fails() {
        let stage = StageFn::new("s").on("run", |_| Ok(()));
        let err = stage.invoke("stop").unwrap_err();
        assert!(matches!(
            err,
            StageError::UnknownOperation { ref stage, ref operation }
                if stage == "s" && operation == "stop"
        ));
    }

    #[test]
    fn test_operation_can_emit_completion() {
        let stage = StageFn::new("s").on("run", |em| {
            em.emit("Done");
            Ok(())
        });
        let seen = Arc::new(Mutex::new(0));
        let s = Arc::clone(&seen);
        stage
            .emitter()
            .subscribe("Done", Arc::new(move |_| *s.lock().unwrap() += 1));
        stage.invoke("run").unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
