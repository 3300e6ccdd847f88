//! # Signal: the unit of dispatch.
//!
//! A [`Signal`] is produced every time an [`Emitter`](crate::Emitter) or a
//! [`Bus`](crate::Bus) channel fires. It carries the channel name, the name
//! of the emitting component, an optional type-erased payload, and ordering
//! metadata.
//!
//! ## Ordering guarantees
//! Each signal gets a globally unique sequence number (`seq`) that increases
//! monotonically across the whole process. Handlers that observe signals from
//! several emitters can use `seq` to reconstruct the exact dispatch order.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use signalbus::Emitter;
//!
//! let emitter = Emitter::new("demo");
//! let sig = emitter.emit_with("Ping", Arc::new(42u32));
//!
//! assert_eq!(sig.channel(), "Ping");
//! assert_eq!(sig.source(), "demo");
//! assert_eq!(sig.payload_as::<u32>().as_deref(), Some(&42));
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for signal ordering.
static SIGNAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Subscriber callback invoked for every signal dispatched on a channel.
///
/// Handlers are cheap to clone (`Arc`) and are compared by pointer identity:
/// [`Emitter::unsubscribe`](crate::Emitter::unsubscribe) removes the record
/// whose `Arc` points at the same callback that was subscribed.
pub type Handler = Arc<dyn Fn(&Signal) + Send + Sync>;

/// One dispatched event occurrence.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `channel` / `source`: where the signal fired and who fired it
/// - `payload`: optional type-erased data attached by the publisher
#[derive(Clone)]
pub struct Signal {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    channel: Arc<str>,
    source: Arc<str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Signal {
    /// Creates a new signal with the current timestamp and next sequence number.
    pub fn new(channel: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        Self {
            seq: SIGNAL_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            channel: channel.into(),
            source: source.into(),
            payload: None,
        }
    }

    /// Attaches a type-erased payload.
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Arc<dyn Any + Send + Sync>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Name of the channel this signal fired on.
    #[inline]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Name of the component that emitted this signal.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Downcasts the payload to a concrete type, if one was attached.
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload.clone().and_then(|p| p.downcast::<T>().ok())
    }

    /// True if a payload was attached (of any type).
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("seq", &self.seq)
            .field("channel", &self.channel)
            .field("source", &self.source)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Signal::new("X", "t");
        let b = Signal::new("X", "t");
        let c = Signal::new("Y", "t");
        assert!(a.seq < b.seq);
        assert!(b.seq < c.seq);
    }

    #[test]
    fn test_payload_downcast() {
        let sig = Signal::new("X", "t").with_payload(Arc::new(String::from("hello")));
        assert_eq!(sig.payload_as::<String>().as_deref().map(String::as_str), Some("hello"));
        assert!(sig.payload_as::<u32>().is_none());
    }

    #[test]
    fn test_no_payload() {
        let sig = Signal::new("X", "t");
        assert!(!sig.has_payload());
        assert!(sig.payload_as::<u32>().is_none());
    }
}
