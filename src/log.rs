//! Built-in stdout handler (demo/reference only).
//!
//! Enabled via the `logging` feature.

use std::sync::Arc;

use crate::events::{Handler, Signal};
use crate::sequence::Progress;

/// Handler factory that logs signals to stdout.
///
/// Useful for demos and debugging; real consumers should install their own
/// handlers.
pub struct LogWriter;

impl LogWriter {
    /// Returns a handler that prints one line per signal.
    pub fn handler() -> Handler {
        Arc::new(|sig: &Signal| {
            match sig.payload_as::<Progress>() {
                Some(p) => println!(
                    "[signalbus] seq={} channel={} source={} stage={} index={}",
                    sig.seq,
                    sig.channel(),
                    sig.source(),
                    p.stage,
                    p.index
                ),
                None => println!(
                    "[signalbus] seq={} channel={} source={}",
                    sig.seq,
                    sig.channel(),
                    sig.source()
                ),
            }
        })
    }
}
