//! # SequenceRunner: one-at-a-time traversal of completion-signalled stages.
//!
//! Drives a fixed, ordered collection of [`Stage`]s through an asynchronous
//! operation, strictly one stage in flight at a time. A stage's completion is
//! detected through its own [`Emitter`](crate::Emitter) — never through a
//! return value — so the runner works equally for stages that finish inside
//! the `invoke` call stack and for stages that finish much later from some
//! external callback.
//!
//! ## Event flow
//! Per stage, the runner emits on its own emitter:
//! ```text
//! BeforeItemProcess ─► [subscribe to stage completion] ─► invoke(operation)
//!                                                              │
//!                       ┌──────────── completion fires ────────┘
//!                       ▼
//!                  ItemProcessed ─► next stage ... ─► Finish
//! ```
//!
//! ## Rules
//! - **Subscribe before invoke**: a completion that fires synchronously,
//!   inside `invoke`, must not be missed.
//! - **Single flight**: step *n+1* never begins before step *n*'s completion
//!   signal; starting while running is rejected.
//! - **No leaked listeners**: the one-shot completion subscription is removed
//!   as soon as it fires, and also on cancellation and stage failure.
//! - **Flat stepping**: synchronous completions are absorbed by the pump loop
//!   instead of recursing, so a long all-synchronous collection cannot
//!   overflow the stack.
//! - Cancellation is checked before each step and is terminal for the runner
//!   instance. A stage failure stalls the runner permanently (`running` stays
//!   true: the traversal never completed).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{SequenceError, StageError};
use crate::events::{Emitter, Handler, Signal};

use super::stage::StageRef;

/// Channel emitted just before a stage's operation is invoked.
pub const BEFORE_ITEM_PROCESS: &str = "BeforeItemProcess";
/// Channel emitted once a stage's completion signal has fired.
pub const ITEM_PROCESSED: &str = "ItemProcessed";
/// Channel emitted when the cursor reaches the boundary.
pub const FINISH: &str = "Finish";
/// Channel emitted when a traversal is cancelled.
pub const CANCELLED: &str = "Cancelled";
/// Channel emitted when a stage failure stalls the runner.
pub const STALLED: &str = "Stalled";

/// Traversal direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// First stage to last.
    Forward,
    /// Last stage to first.
    Backward,
}

/// Payload of [`BEFORE_ITEM_PROCESS`] and [`ITEM_PROCESSED`] signals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Index of the stage within the runner's collection.
    pub index: usize,
    /// Name of the stage.
    pub stage: Arc<str>,
}

/// The one-shot completion subscription for the stage currently in flight.
struct PendingStep {
    index: usize,
    handler: Handler,
}

struct RunState {
    /// Position within the collection; `-1` and `len` are the two terminal
    /// boundaries (pre-first for forward, post-last for backward).
    cursor: i64,
    direction: Direction,
    running: bool,
    stalled: bool,
    /// True while the pump loop is on the stack; a completion arriving then
    /// lets the loop continue in place instead of re-entering it.
    pumping: bool,
    /// Completion observed for the step currently in flight.
    step_done: bool,
    /// Step counter; stale completion callbacks compare against it.
    generation: u64,
    current: Option<usize>,
    pending: Option<PendingStep>,
}

struct RunnerInner {
    /// Self-reference handed to one-shot completion handlers; weak, so a
    /// dropped runner never keeps a stage's channel alive.
    weak: Weak<RunnerInner>,
    emitter: Emitter,
    stages: Vec<StageRef>,
    operation: Arc<str>,
    completion: Arc<str>,
    cancel: CancellationToken,
    running_tx: watch::Sender<bool>,
    state: Mutex<RunState>,
}

/// Sequential, completion-driven traversal of a fixed stage collection.
///
/// Cheap to clone (`Arc`-backed); clones drive the same traversal. A runner
/// holds no active computation between a stage's invocation and its
/// completion signal — control returns entirely to the caller during that
/// gap.
#[derive(Clone)]
pub struct SequenceRunner {
    inner: Arc<RunnerInner>,
}

impl SequenceRunner {
    /// Creates a runner over the given stages.
    ///
    /// `operation` is the stage operation invoked per step; `completion` is
    /// the channel each stage is expected to fire on its own emitter exactly
    /// once per invocation.
    pub fn new(
        stages: Vec<StageRef>,
        operation: impl Into<Arc<str>>,
        completion: impl Into<Arc<str>>,
    ) -> Self {
        let (running_tx, _) = watch::channel(false);
        let operation = operation.into();
        let completion = completion.into();
        Self {
            inner: Arc::new_cyclic(|weak| RunnerInner {
                weak: weak.clone(),
                emitter: Emitter::new("sequence"),
                stages,
                operation,
                completion,
                cancel: CancellationToken::new(),
                running_tx,
                state: Mutex::new(RunState {
                    cursor: -1,
                    direction: Direction::Forward,
                    running: false,
                    stalled: false,
                    pumping: false,
                    step_done: false,
                    generation: 0,
                    current: None,
                    pending: None,
                }),
            }),
        }
    }

    /// Begins a first-to-last traversal.
    ///
    /// # Errors
    /// - [`SequenceError::AlreadyRunning`] while a traversal is in flight.
    /// - [`SequenceError::Stalled`] / [`SequenceError::Cancelled`] on a dead runner.
    /// - [`SequenceError::StageFailed`] when a stage fails inside this call stack.
    pub fn start_forward(&self) -> Result<(), SequenceError> {
        self.start(Direction::Forward)
    }

    /// Begins a last-to-first traversal.
    ///
    /// # Errors
    /// Same conditions as [`SequenceRunner::start_forward`].
    pub fn start_backward(&self) -> Result<(), SequenceError> {
        self.start(Direction::Backward)
    }

    /// Requests cancellation.
    ///
    /// A runner parked between a stage's invocation and its completion is
    /// unwound immediately: the pending completion subscription is removed
    /// (no late callbacks), `running` clears, and [`CANCELLED`] is emitted.
    /// A runner mid-step observes the flag before parking and before its
    /// next step, and a completion that arrives after cancellation is
    /// dropped without emitting [`ITEM_PROCESSED`].
    /// Cancellation is terminal: later starts fail with
    /// [`SequenceError::Cancelled`].
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
        let pending = {
            let mut st = self.inner.lock();
            if !st.running || st.pumping {
                // Not in flight, or the pump loop will see the flag itself.
                return;
            }
            st.running = false;
            st.current = None;
            st.pending.take()
        };
        self.inner.drop_pending(pending);
        self.inner.running_tx.send_replace(false);
        self.inner.emitter.emit(CANCELLED);
    }

    /// Waits until no traversal is running.
    ///
    /// Returns immediately for a runner that is idle (including one that was
    /// never started). A stalled runner never finishes; callers that may hit
    /// that case should observe the [`STALLED`] channel instead.
    pub async fn wait_finished(&self) {
        let mut rx = self.inner.running_tx.subscribe();
        let _ = rx.wait_for(|running| !*running).await;
    }

    /// Lifecycle emitter: [`BEFORE_ITEM_PROCESS`], [`ITEM_PROCESSED`],
    /// [`FINISH`], [`CANCELLED`], [`STALLED`].
    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    /// True while a traversal is in flight (including a stalled one: a stall
    /// is an incomplete traversal, not a finished one).
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// True once a stage failure has permanently stalled the runner.
    pub fn is_stalled(&self) -> bool {
        self.inner.lock().stalled
    }

    /// Current cursor position; `-1` and `len` are the terminal boundaries.
    pub fn cursor(&self) -> i64 {
        self.inner.lock().cursor
    }

    /// The stage currently (or most recently) being processed.
    pub fn current(&self) -> Option<StageRef> {
        let idx = self.inner.lock().current?;
        self.inner.stages.get(idx).cloned()
    }

    /// Number of stages in the collection.
    pub fn len(&self) -> usize {
        self.inner.stages.len()
    }

    /// True for an empty collection.
    pub fn is_empty(&self) -> bool {
        self.inner.stages.is_empty()
    }

    fn start(&self, direction: Direction) -> Result<(), SequenceError> {
        {
            let mut st = self.inner.lock();
            if st.stalled {
                return Err(SequenceError::Stalled);
            }
            if st.running {
                return Err(SequenceError::AlreadyRunning);
            }
            if self.inner.cancel.is_cancelled() {
                return Err(SequenceError::Cancelled);
            }
            st.running = true;
            st.direction = direction;
            st.current = None;
            // Reset to the pre-start boundary for the requested direction;
            // a finished runner restarts from there.
            st.cursor = match direction {
                Direction::Forward => -1,
                Direction::Backward => self.inner.stages.len() as i64,
            };
        }
        self.inner.running_tx.send_replace(true);
        self.inner.pump()
    }
}

impl RunnerInner {
    /// Advances the traversal until it parks on an asynchronous stage,
    /// reaches the boundary, is cancelled, or a stage fails.
    ///
    /// Entered from `start_*` and re-entered from a completion callback that
    /// arrived outside the loop (an asynchronous completion). Never holds the
    /// state lock across an emit or an invoke.
    fn pump(&self) -> Result<(), SequenceError> {
        loop {
            if self.cancel.is_cancelled() {
                self.finish_cancelled();
                return Ok(());
            }

            let step = {
                let mut st = self.lock();
                st.pumping = true;
                st.cursor = match st.direction {
                    Direction::Forward => st.cursor + 1,
                    Direction::Backward => st.cursor - 1,
                };
                if st.cursor < 0 || st.cursor >= self.stages.len() as i64 {
                    st.running = false;
                    st.pumping = false;
                    st.current = None;
                    None
                } else {
                    let index = st.cursor as usize;
                    st.current = Some(index);
                    st.step_done = false;
                    st.generation += 1;
                    Some((index, st.generation))
                }
            };

            let Some((index, generation)) = step else {
                self.running_tx.send_replace(false);
                self.emitter.emit(FINISH);
                return Ok(());
            };

            let stage = Arc::clone(&self.stages[index]);
            let progress = Arc::new(Progress {
                index,
                stage: stage.name().into(),
            });
            self.emitter.emit_with(BEFORE_ITEM_PROCESS, progress);

            // Subscribe before invoke: a completion fired inside the invoke
            // call stack must be observed. The pending record goes in first
            // so the callback always finds it, even if the completion signal
            // races in from another thread.
            let weak = self.weak.clone();
            let handler: Handler = Arc::new(move |_sig: &Signal| {
                if let Some(inner) = Weak::upgrade(&weak) {
                    inner.complete_step(generation);
                }
            });
            {
                let mut st = self.lock();
                st.pending = Some(PendingStep { index, handler: Arc::clone(&handler) });
            }
            stage.emitter().subscribe_managed(&self.completion, handler);

            if let Err(err) = stage.invoke(&self.operation) {
                self.mark_stalled(stage.name(), &err);
                return Err(SequenceError::StageFailed {
                    stage: stage.name().to_string(),
                    source: err,
                });
            }

            let parked = {
                let mut st = self.lock();
                if st.step_done {
                    false
                } else {
                    st.pumping = false;
                    true
                }
            };
            if parked {
                // A handler may have cancelled during this step's dispatch;
                // the top-of-loop check never runs again once parked, so the
                // flag has to be observed here or the runner would sit
                // cancelled-but-subscribed waiting on a completion.
                if self.cancel.is_cancelled() {
                    self.finish_cancelled();
                }
                return Ok(());
            }
        }
    }

    /// Completion callback for the stage in flight.
    ///
    /// Stale callbacks (wrong generation, duplicate completion signal, runner
    /// no longer traversing) are ignored.
    fn complete_step(&self, generation: u64) {
        let (pending, resume) = {
            let mut st = self.lock();
            if !st.running || st.stalled || st.generation != generation || st.step_done {
                return;
            }
            st.step_done = true;
            (st.pending.take(), !st.pumping)
        };

        if self.cancel.is_cancelled() {
            // Cancelled between invoke and completion: the subscription is
            // dropped and the step's ItemProcessed is suppressed.
            self.drop_pending(pending);
            self.finish_cancelled();
            return;
        }

        let Some(pending) = pending else { return };
        let stage = &self.stages[pending.index];
        stage.emitter().unsubscribe(&self.completion, &pending.handler);
        let progress = Arc::new(Progress {
            index: pending.index,
            stage: stage.name().into(),
        });
        self.emitter.emit_with(ITEM_PROCESSED, progress);

        if resume {
            // Asynchronous arrival: the traversal continues from here. A
            // stage failure on this path has no caller to propagate to; it is
            // surfaced through the STALLED channel by mark_stalled.
            let _ = self.pump();
        }
    }

    /// Stage failure policy: permanent stall.
    ///
    /// `running` stays true — the traversal never completed — and any later
    /// start is rejected with [`SequenceError::Stalled`].
    fn mark_stalled(&self, stage: &str, err: &StageError) {
        let pending = {
            let mut st = self.lock();
            st.stalled = true;
            st.pumping = false;
            st.pending.take()
        };
        self.drop_pending(pending);
        self.emitter
            .emit_with(STALLED, Arc::new(format!("stage `{stage}` failed: {err}")));
    }

    fn finish_cancelled(&self) {
        let pending = {
            let mut st = self.lock();
            if !st.running {
                // Cancellation already unwound elsewhere (e.g. from a handler
                // while the pump loop was still on the stack).
                return;
            }
            st.running = false;
            st.pumping = false;
            st.current = None;
            st.pending.take()
        };
        self.drop_pending(pending);
        self.running_tx.send_replace(false);
        self.emitter.emit(CANCELLED);
    }

    /// Removes a pending one-shot completion subscription, if any.
    fn drop_pending(&self, pending: Option<PendingStep>) {
        if let Some(p) = pending {
            self.stages[p.index]
                .emitter()
                .unsubscribe(&self.completion, &p.handler);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SequenceRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.lock();
        f.debug_struct("SequenceRunner")
            .field("stages", &self.inner.stages.len())
            .field("operation", &self.inner.operation)
            .field("completion", &self.inner.completion)
            .field("cursor", &st.cursor)
            .field("running", &st.running)
            .field("stalled", &st.stalled)
            .finish()
    }
}
