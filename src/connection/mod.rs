//! Request lifecycle state machine over an external transport.
//!
//! ## Contents
//! - [`State`], [`Transition`], [`next_state`] — the lifecycle as data plus a
//!   pure transition function
//! - [`ReadyState`] — the transport's five-stage progress code
//! - [`Transport`] — the external collaborator contract
//! - [`Connection`] — state-guarded operations and progress relay
//!
//! ## Quick reference
//! - **Producers**: the transport's notify slot, relayed as
//!   [`READY_STATE_CHANGED`] signals.
//! - **Consumers**: anything subscribed on the connection's emitter —
//!   including stages driven by a
//!   [`SequenceRunner`](crate::SequenceRunner) that wrap a connection.

#[allow(clippy::module_inception)]
mod connection;
mod error;
mod ready_state;
mod state;
mod transport;

pub use connection::{Connection, READY_STATE_CHANGED};
pub use error::ConnectionError;
pub use ready_state::ReadyState;
pub use state::{State, Transition, next_state};
pub use transport::{NotifyFn, Transport};
