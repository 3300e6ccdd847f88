//! # signalbus
//!
//! **Signalbus** is a lightweight event-dispatch and sequencing library for Rust.
//!
//! It provides primitives to wire components together through named event
//! channels, to drive ordered collections of asynchronous work one item at a
//! time, and to guard a request lifecycle behind an explicit state machine.
//! The crate is designed as a coordination substrate for higher-level
//! application frameworks.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐        ┌──────────────┐        ┌──────────────┐
//!  │  component   │        │  component   │        │  Connection  │
//!  │  + Emitter   │        │  + Emitter   │        │  + Emitter   │
//!  └──────┬───────┘        └──────┬───────┘        └──────┬───────┘
//!         │ emit("Foo")           │ subscribe             │ ReadyStateChanged
//!         ▼                       ▼                       ▼
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │  Bus (declared channels, relay default-handlers)              │
//!  └───────────────────────────────────────────────────────────────┘
//!
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │  SequenceRunner                                               │
//!  │   stages: [S1] ─► [S2] ─► [S3]      (one in flight at a time) │
//!  │   per step: BeforeItemProcess ─► subscribe completion         │
//!  │             ─► invoke(operation) ─► ... ─► ItemProcessed      │
//!  │   boundary: Finish                                            │
//!  └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Dispatch model
//! Everything here is synchronous and cooperative: an emit runs the
//! channel's default handler, then every subscriber, in subscription order,
//! against a snapshot taken before the first callback. There are no worker
//! threads inside the crate; "asynchronous" work is work whose completion
//! arrives later through a callback, and the [`SequenceRunner`] holds no
//! computation while it waits for one.
//!
//! ## Features
//! | Area             | Description                                                   | Key types / traits                     |
//! |------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Dispatch**     | Named channels per component, ordered snapshot delivery.      | [`Emitter`], [`Signal`], [`Handler`]   |
//! | **Shared bus**   | Declared channel vocabulary for unrelated components.         | [`Bus`], [`BusError`]                  |
//! | **Sequencing**   | One-at-a-time traversal driven by completion signals.         | [`SequenceRunner`], [`Stage`], [`StageFn`] |
//! | **Connections**  | State-guarded request lifecycle over an external transport.   | [`Connection`], [`State`], [`Transport`] |
//! | **Errors**       | Typed errors for vocabulary, sequencing, and state guards.    | [`BusError`], [`SequenceError`], [`ConnectionError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use signalbus::{SequenceRunner, StageFn, StageRef};
//!
//! let stages: Vec<StageRef> = ["fetch", "parse", "store"]
//!     .iter()
//!     .map(|name| {
//!         StageFn::new(*name)
//!             .on("run", |emitter| {
//!                 // start the work; here it completes immediately
//!                 emitter.emit("Done");
//!                 Ok(())
//!             })
//!             .arc()
//!     })
//!     .collect();
//!
//! let runner = SequenceRunner::new(stages, "run", "Done");
//! runner.start_forward()?;
//! assert!(!runner.is_running());
//! # Ok::<(), signalbus::SequenceError>(())
//! ```

mod connection;
mod error;
mod events;
mod sequence;

// ---- Public re-exports ----

pub use connection::{
    Connection, ConnectionError, NotifyFn, READY_STATE_CHANGED, ReadyState, State, Transition,
    Transport, next_state,
};
pub use error::{BusError, SequenceError, StageError};
pub use events::{Bus, Emitter, Handler, Signal};
pub use sequence::{
    BEFORE_ITEM_PROCESS, CANCELLED, Direction, FINISH, ITEM_PROCESSED, Progress, STALLED,
    SequenceRunner, Stage, StageFn, StageRef,
};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
