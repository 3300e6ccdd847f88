//! # Bus: shared channels with a declared vocabulary.
//!
//! A [`Bus`] lets otherwise-unrelated components notify each other without
//! holding references to one another. Unlike an [`Emitter`], whose channels
//! appear on demand, a bus owns a **closed set** of channel names that must
//! be declared up front — publishing or subscribing on an undeclared name is
//! an error, never a silent creation.
//!
//! ## Architecture
//! ```text
//! producer.emitter ──(default relay)──► Bus channel "Foo" ──► consumer handlers
//!                                        ▲
//! other producer ───── publish("Foo") ───┘
//! ```
//!
//! ## Rules
//! - Declarations are case-sensitive; re-declaring a name fails with
//!   [`BusError::DuplicateEvent`].
//! - [`Bus::declare_for`] additionally installs a forwarding default handler
//!   on a producer's emitter, so the producer publishes through the bus by
//!   emitting locally — it never needs a reference to any consumer.
//! - Relayed signals keep their original `seq` and `source`.
//! - A bus is an explicit value passed to whoever needs it; there is no
//!   ambient global instance.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::BusError;

use super::emitter::Emitter;
use super::signal::{Handler, Signal};

struct BusInner {
    emitter: Emitter,
    declared: Mutex<BTreeSet<String>>,
}

/// Shared event channels with an explicitly declared name set.
///
/// Cheap to clone (`Arc`-backed); clones address the same channels.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Creates an empty bus with the given name (used as the `source` of
    /// signals published directly through [`Bus::publish`]).
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                emitter: Emitter::new(name),
                declared: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Declares a new channel on the bus.
    ///
    /// # Errors
    /// [`BusError::DuplicateEvent`] if the name is already declared
    /// (comparison is case-sensitive).
    pub fn declare(&self, name: &str) -> Result<(), BusError> {
        let mut declared = self.lock_declared();
        if !declared.insert(name.to_string()) {
            return Err(BusError::DuplicateEvent { name: name.to_string() });
        }
        Ok(())
    }

    /// Declares a channel and wires a producer's emitter to it.
    ///
    /// Installs a forwarding default handler on `owner` for the same channel
    /// name: whenever `owner` emits it, the signal is relayed into the bus
    /// channel (keeping its `seq` and `source`). This is how components
    /// publish through a shared bus without referencing each other.
    ///
    /// # Errors
    /// [`BusError::DuplicateEvent`] if the name is already declared.
    pub fn declare_for(&self, name: &str, owner: &Emitter) -> Result<(), BusError> {
        self.declare(name)?;
        let bus = self.clone();
        owner.set_default(
            name,
            Arc::new(move |sig: &Signal| {
                bus.relay(sig);
            }),
        );
        Ok(())
    }

    /// Publishes a payload-less signal on a declared channel.
    ///
    /// # Errors
    /// [`BusError::UndeclaredEvent`] if the name was never declared.
    pub fn publish(&self, name: &str) -> Result<Signal, BusError> {
        self.check_declared(name)?;
        Ok(self.inner.emitter.emit(name))
    }

    /// Publishes a signal carrying the given payload on a declared channel.
    ///
    /// # Errors
    /// [`BusError::UndeclaredEvent`] if the name was never declared.
    pub fn publish_with(
        &self,
        name: &str,
        payload: Arc<dyn std::any::Any + Send + Sync>,
    ) -> Result<Signal, BusError> {
        self.check_declared(name)?;
        Ok(self.inner.emitter.emit_with(name, payload))
    }

    /// Subscribes a handler to a declared channel.
    ///
    /// # Errors
    /// [`BusError::UndeclaredEvent`] if the name was never declared.
    pub fn subscribe(&self, name: &str, handler: Handler) -> Result<(), BusError> {
        self.check_declared(name)?;
        self.inner.emitter.subscribe(name, handler);
        Ok(())
    }

    /// Removes a previously subscribed handler. No-op for unknown handlers
    /// and undeclared names, matching [`Emitter::unsubscribe`].
    pub fn unsubscribe(&self, name: &str, handler: &Handler) {
        self.inner.emitter.unsubscribe(name, handler);
    }

    /// True if the channel name has been declared on this bus.
    pub fn is_declared(&self, name: &str) -> bool {
        self.lock_declared().contains(name)
    }

    /// Relays an existing signal to the bus channel of the same name.
    ///
    /// Undeclared names are dropped: relays are only ever installed by
    /// [`Bus::declare_for`], which declares first.
    fn relay(&self, signal: &Signal) {
        if self.is_declared(signal.channel()) {
            self.inner.emitter.dispatch(signal);
        }
    }

    fn check_declared(&self, name: &str) -> Result<(), BusError> {
        if !self.is_declared(name) {
            return Err(BusError::UndeclaredEvent { name: name.to_string() });
        }
        Ok(())
    }

    fn lock_declared(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.inner.declared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("source", &self.inner.emitter.source())
            .field("declared", &self.lock_declared().len())
            .finish()
    }
}
