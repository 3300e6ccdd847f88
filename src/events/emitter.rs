//! # Emitter: per-component subscription registry.
//!
//! An [`Emitter`] owns a table of named channels; each channel holds an
//! ordered list of subscriber [`Handler`]s plus an optional default handler
//! that the owning component installs for itself.
//!
//! ## Architecture
//! ```text
//! component.emitter
//!     │
//!     ├─ channel "Foo" ─► [default handler] ─► sub1 ─► sub2 ─► subN
//!     └─ channel "Bar" ─► [default handler] ─► ...
//! ```
//!
//! ## Rules
//! - Channels are created on demand; subscribing to an unknown name is fine.
//! - Dispatch order is subscription order (prepends via [`Emitter::subscribe_first`]).
//! - Every dispatch runs against a **snapshot** taken before the first
//!   callback: handlers subscribed or removed by an in-flight callback never
//!   affect the dispatch that is already underway.
//! - `unsubscribe` of an unknown handler is a silent no-op. Nothing here errors.
//! - Records added by external coordinators (via [`Emitter::subscribe_managed`])
//!   can be bulk-removed with [`Emitter::detach`]; direct subscriptions survive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::signal::{Handler, Signal};

/// One subscriber entry on a channel.
struct SubscriberRecord {
    handler: Handler,
    /// True when the record was installed by an external coordinator
    /// (bus relay, sequence runner) rather than by the owner directly.
    managed: bool,
}

/// A named channel: the owner's default handler plus ordered subscribers.
#[derive(Default)]
struct Channel {
    default: Option<Handler>,
    subs: Vec<SubscriberRecord>,
}

/// Per-component registry of named event channels.
///
/// Components embed an `Emitter` as a field (composition); there is no
/// inheritance or trait mixing involved. All methods take `&self` — the
/// channel table lives behind a mutex, and dispatch releases it before any
/// callback runs, so handlers may freely subscribe, unsubscribe, or emit on
/// the same emitter.
pub struct Emitter {
    source: Arc<str>,
    channels: Mutex<HashMap<String, Channel>>,
}

impl Emitter {
    /// Creates an emitter for the named component.
    ///
    /// The name is carried on every [`Signal`] as its `source`.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the owning component.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Appends a subscriber to the named channel (created on demand).
    pub fn subscribe(&self, channel: &str, handler: Handler) {
        self.insert(channel, handler, false, false);
    }

    /// Prepends a subscriber: it will run before all current subscribers.
    pub fn subscribe_first(&self, channel: &str, handler: Handler) {
        self.insert(channel, handler, false, true);
    }

    /// Appends a subscriber flagged as coordinator-installed.
    ///
    /// Use this when registering on someone else's emitter on behalf of a
    /// coordinating component, so the owner can bulk-clean such records with
    /// [`Emitter::detach`] without touching its own subscriptions.
    pub fn subscribe_managed(&self, channel: &str, handler: Handler) {
        self.insert(channel, handler, true, false);
    }

    /// Removes the first record whose handler is the same `Arc` as `handler`.
    ///
    /// Silent no-op when the channel or the handler is unknown.
    pub fn unsubscribe(&self, channel: &str, handler: &Handler) {
        let mut table = self.lock();
        if let Some(ch) = table.get_mut(channel) {
            if let Some(pos) = ch.subs.iter().position(|r| Arc::ptr_eq(&r.handler, handler)) {
                ch.subs.remove(pos);
            }
        }
    }

    /// Installs the owner's default handler for the channel.
    ///
    /// The default runs before subscribers on every dispatch. Unset channels
    /// behave as if the default were a no-op. Setting again replaces the
    /// previous default.
    pub fn set_default(&self, channel: &str, handler: Handler) {
        let mut table = self.lock();
        table.entry(channel.to_string()).or_default().default = Some(handler);
    }

    /// Emits a payload-less signal on the channel.
    pub fn emit(&self, channel: &str) -> Signal {
        let signal = Signal::new(channel, Arc::clone(&self.source));
        self.dispatch(&signal);
        signal
    }

    /// Emits a signal carrying the given payload.
    pub fn emit_with(
        &self,
        channel: &str,
        payload: Arc<dyn std::any::Any + Send + Sync>,
    ) -> Signal {
        let signal = Signal::new(channel, Arc::clone(&self.source)).with_payload(payload);
        self.dispatch(&signal);
        signal
    }

    /// Delivers an existing signal on this emitter's channel of the same name.
    ///
    /// The signal keeps its original `seq` and `source`; this is how a bus
    /// relays a component's signal to its own subscribers without re-stamping
    /// it as a new occurrence.
    pub fn dispatch(&self, signal: &Signal) {
        // Snapshot under the lock, invoke outside it: callbacks may re-enter
        // this emitter, and subscribe/unsubscribe during dispatch must not
        // affect the dispatch already underway.
        let (default, snapshot) = {
            let table = self.lock();
            match table.get(signal.channel()) {
                Some(ch) => (
                    ch.default.clone(),
                    ch.subs.iter().map(|r| Arc::clone(&r.handler)).collect::<Vec<_>>(),
                ),
                None => (None, Vec::new()),
            }
        };
        if let Some(default) = default {
            default(signal);
        }
        for handler in snapshot {
            handler(signal);
        }
    }

    /// Removes every coordinator-installed record from every channel.
    pub fn detach(&self) {
        let mut table = self.lock();
        for ch in table.values_mut() {
            ch.subs.retain(|r| !r.managed);
        }
    }

    /// Number of subscribers currently on the channel (default not counted).
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, |ch| ch.subs.len())
    }

    fn insert(&self, channel: &str, handler: Handler, managed: bool, first: bool) {
        let mut table = self.lock();
        let ch = table.entry(channel.to_string()).or_default();
        let record = SubscriberRecord { handler, managed };
        if first {
            ch.subs.insert(0, record);
        } else {
            ch.subs.push(record);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        // A poisoned table only means a handler panicked mid-registration;
        // the data itself is still consistent.
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("source", &self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Handler {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Arc::new(move |sig: &Signal| {
            log.lock().unwrap().push(format!("{tag}:{}", sig.channel()));
        })
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let emitter = Emitter::new("t");
        let log = Arc::new(Mutex::new(Vec::new()));
        emitter.subscribe("Go", recorder(&log, "a"));
        emitter.subscribe("Go", recorder(&log, "b"));
        emitter.subscribe("Go", recorder(&log, "c"));
        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["a:Go", "b:Go", "c:Go"]);
    }

    #[test]
    fn test_subscribe_first_runs_before_others() {
        let emitter = Emitter::new("t");
        let log = Arc::new(Mutex::new(Vec::new()));
        emitter.subscribe("Go", recorder(&log, "late"));
        emitter.subscribe_first("Go", recorder(&log, "early"));
        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["early:Go", "late:Go"]);
    }

    #[test]
    fn test_default_handler_runs_first() {
        let emitter = Emitter::new("t");
        let log = Arc::new(Mutex::new(Vec::new()));
        emitter.subscribe("Go", recorder(&log, "sub"));
        emitter.set_default("Go", recorder(&log, "default"));
        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["default:Go", "sub:Go"]);
    }

    #[test]
    fn test_unsubscribe_removes_by_identity() {
        let emitter = Emitter::new("t");
        let log = Arc::new(Mutex::new(Vec::new()));
        let keep = recorder(&log, "keep");
        let drop_me = recorder(&log, "drop");
        emitter.subscribe("Go", Arc::clone(&drop_me));
        emitter.subscribe("Go", Arc::clone(&keep));
        emitter.unsubscribe("Go", &drop_me);
        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["keep:Go"]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let emitter = Emitter::new("t");
        let never: Handler = Arc::new(|_| {});
        emitter.unsubscribe("Missing", &never);
        emitter.subscribe("Go", Arc::new(|_| {}));
        emitter.unsubscribe("Go", &never);
        assert_eq!(emitter.subscriber_count("Go"), 1);
    }

    #[test]
    fn test_dispatch_uses_pre_trigger_snapshot() {
        let emitter = Arc::new(Emitter::new("t"));
        let log = Arc::new(Mutex::new(Vec::new()));

        // First handler subscribes a new one mid-dispatch; the newcomer must
        // not run during this dispatch.
        let em = Arc::clone(&emitter);
        let inner_log = Arc::clone(&log);
        emitter.subscribe(
            "Go",
            Arc::new(move |_sig: &Signal| {
                let l = Arc::clone(&inner_log);
                em.subscribe(
                    "Go",
                    Arc::new(move |_| l.lock().unwrap().push("newcomer".into())),
                );
            }),
        );
        emitter.subscribe("Go", recorder(&log, "second"));
        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["second:Go"]);

        // The newcomer participates in the next dispatch (appended after
        // "second", so it runs last).
        emitter.emit("Go");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["second:Go", "second:Go", "newcomer"]
        );
    }

    #[test]
    fn test_unsubscribe_mid_dispatch_does_not_skip() {
        let emitter = Arc::new(Emitter::new("t"));
        let log = Arc::new(Mutex::new(Vec::new()));

        let victim = recorder(&log, "victim");
        let em = Arc::clone(&emitter);
        let v = Arc::clone(&victim);
        emitter.subscribe(
            "Go",
            Arc::new(move |_sig: &Signal| {
                em.unsubscribe("Go", &v);
            }),
        );
        emitter.subscribe("Go", Arc::clone(&victim));
        emitter.emit("Go");
        // Removed mid-dispatch, but the snapshot still delivers this round.
        assert_eq!(*log.lock().unwrap(), vec!["victim:Go"]);

        emitter.emit("Go");
        assert_eq!(*log.lock().unwrap(), vec!["victim:Go"]);
    }

    #[test]
    fn test_detach_removes_only_managed() {
        let emitter = Emitter::new("t");
        let log = Arc::new(Mutex::new(Vec::new()));
        emitter.subscribe("Go", recorder(&log, "direct"));
        emitter.subscribe_managed("Go", recorder(&log, "managed"));
        emitter.subscribe_managed("Other", recorder(&log, "managed2"));
        emitter.detach();
        emitter.emit("Go");
        emitter.emit("Other");
        assert_eq!(*log.lock().unwrap(), vec!["direct:Go"]);
    }

    #[test]
    fn test_signal_carries_owner_and_payload() {
        let emitter = Emitter::new("owner");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        emitter.subscribe(
            "Go",
            Arc::new(move |sig: &Signal| {
                s.lock()
                    .unwrap()
                    .push((sig.source().to_string(), sig.payload_as::<u32>()));
            }),
        );
        emitter.emit_with("Go", Arc::new(7u32));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "owner");
        assert_eq!(seen[0].1.as_deref(), Some(&7));
    }
}
