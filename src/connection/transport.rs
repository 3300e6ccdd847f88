//! External transport contract consumed by [`Connection`](crate::Connection).
//!
//! The transport is an outside collaborator (an HTTP client binding, a test
//! double); this crate never implements one. It must follow the standard
//! five-stage request lifecycle and report progress through the notify slot.

use super::ready_state::ReadyState;

/// Progress callback installed on a transport.
pub type NotifyFn = Box<dyn Fn() + Send + Sync>;

/// One outbound request channel with five-stage progress reporting.
///
/// ### Contract
/// - [`ready_state`](Transport::ready_state) moves monotonically through
///   `Uninitialized → Loading → Loaded → Interactive → Complete`.
/// - Every progress change invokes the callback installed via
///   [`set_notify`](Transport::set_notify) (the last one installed wins).
/// - [`status`](Transport::status) / [`status_text`](Transport::status_text) /
///   [`response_text`](Transport::response_text) are readable in any state
///   but only meaningful once the transport has progressed far enough.
///
/// Methods take `&self`; implementations keep their mutable state behind
/// interior mutability, since the connection and the transport's own driver
/// both hold shared references.
pub trait Transport: Send + Sync {
    /// Opens and sends the request with the accumulated headers.
    fn start(&self, method: &str, url: &str, headers: &[(String, String)]);

    /// Aborts the in-flight request.
    fn abort(&self);

    /// Current progress code.
    fn ready_state(&self) -> ReadyState;

    /// Response status code (e.g. 200).
    fn status(&self) -> u16;

    /// Response status line text (e.g. "OK").
    fn status_text(&self) -> String;

    /// Response body received so far.
    fn response_text(&self) -> String;

    /// Installs the progress callback; replaces any previous one.
    fn set_notify(&self, notify: NotifyFn);
}
