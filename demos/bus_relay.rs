//! # Example: bus_relay
//!
//! Two components communicating through a shared [`Bus`] without holding
//! references to each other.
//!
//! Demonstrates how to:
//! - Declare the bus vocabulary up front (duplicates are rejected).
//! - Wire a producer's emitter to the bus with [`Bus::declare_for`].
//! - Consume from the bus with a plain handler and the built-in [`LogWriter`].
//!
//! ## Run
//! ```bash
//! cargo run --example bus_relay --features logging
//! ```

use std::sync::Arc;

use signalbus::{Bus, BusError, Emitter, LogWriter, Signal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::new("app-bus");

    // The producer only knows its own emitter; the bus wires the relay.
    let producer = Emitter::new("downloader");
    bus.declare_for("FileReady", &producer)?;

    // Re-declaring is an error, not a silent overwrite.
    assert!(matches!(
        bus.declare("FileReady"),
        Err(BusError::DuplicateEvent { .. })
    ));

    // Consumers subscribe on the bus; they never see the producer.
    bus.subscribe("FileReady", LogWriter::handler())?;
    bus.subscribe(
        "FileReady",
        Arc::new(|sig: &Signal| {
            println!("consumer saw `{}` from `{}`", sig.channel(), sig.source());
        }),
    )?;

    // Publishing is just a local emit on the producer side.
    producer.emit("FileReady");
    Ok(())
}
