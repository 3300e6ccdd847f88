//! Sequential traversal of completion-signalled work.
//!
//! ## Contents
//! - [`Stage`], [`StageRef`], [`StageFn`] — the contract a collection item
//!   must satisfy, and a function-backed implementation
//! - [`SequenceRunner`] — one-at-a-time traversal driven by each stage's
//!   completion channel, with lifecycle channels of its own
//!
//! This is the closest thing in the crate to a scheduler: cooperative,
//! single-flight sequencing built purely on callback registration.

mod runner;
mod stage;

pub use runner::{
    BEFORE_ITEM_PROCESS, CANCELLED, Direction, FINISH, ITEM_PROCESSED, Progress, STALLED,
    SequenceRunner,
};
pub use stage::{Stage, StageFn, StageRef};
