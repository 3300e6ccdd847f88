//! Event dispatch: per-component registries and the shared bus.
//!
//! This module groups the dispatch **data model** and the two registries
//! built on it.
//!
//! ## Contents
//! - [`Signal`], [`Handler`] — the dispatched occurrence and the callback type
//! - [`Emitter`] — per-component table of named channels (permissive)
//! - [`Bus`] — shared channels with an explicitly declared name set (strict)
//!
//! ## Quick reference
//! - **Publishers**: any component embedding an `Emitter`; producers wired to
//!   a bus via [`Bus::declare_for`].
//! - **Consumers**: handlers subscribed on an emitter or a bus channel; the
//!   [`SequenceRunner`](crate::SequenceRunner) subscribing to stage
//!   completion channels.

mod bus;
mod emitter;
mod signal;

pub use bus::Bus;
pub use emitter::Emitter;
pub use signal::{Handler, Signal};
