//! Connection lifecycle states and the transition function.
//!
//! The lifecycle is a straight line:
//! ```text
//! New ──(Send)──► Active ──(Complete | Abort)──► Closed
//! ```
//!
//! States are plain enum values; transitions go through [`next_state`], a
//! pure function. A transition that does not apply to the given state leaves
//! the state unchanged — state guards on the operations themselves are what
//! reject illegal calls.

/// Lifecycle state of a [`Connection`](crate::Connection).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Headers may be set; the request has not been sent.
    New,
    /// Request in flight; only abort is allowed.
    Active,
    /// Terminal: the transport finished or the request was aborted.
    Closed,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::New => "new",
            State::Active => "active",
            State::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Events that move a connection between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The request was handed to the transport.
    Send,
    /// The transport reported [`ReadyState::Complete`](crate::ReadyState::Complete).
    Complete,
    /// The request was aborted.
    Abort,
}

/// Pure transition function of the connection lifecycle.
///
/// Inapplicable combinations return the state unchanged.
pub fn next_state(state: State, transition: Transition) -> State {
    match (state, transition) {
        (State::New, Transition::Send) => State::Active,
        (State::Active, Transition::Complete) => State::Closed,
        (State::Active, Transition::Abort) => State::Closed,
        (state, _) => state,
    }
}
