//! # Example: connection_lifecycle
//!
//! Drives a [`Connection`] through its full lifecycle over a scripted
//! transport.
//!
//! Demonstrates how to:
//! - Set headers while the connection is `New`.
//! - Observe `ReadyStateChanged` signals as the transport progresses.
//! - Hit the state guards (aborting a `Closed` connection fails loudly).
//!
//! ## Run
//! ```bash
//! cargo run --example connection_lifecycle
//! ```

use std::sync::{Arc, Mutex};

use signalbus::{
    Connection, NotifyFn, READY_STATE_CHANGED, ReadyState, Signal, State, Transport,
};

/// Scripted transport: the demo advances it by hand.
#[derive(Default)]
struct ScriptedTransport {
    ready_state: Mutex<Option<ReadyState>>,
    notify: Mutex<Option<NotifyFn>>,
}

impl ScriptedTransport {
    fn advance(&self, rs: ReadyState) {
        *self.ready_state.lock().unwrap() = Some(rs);
        if let Some(n) = self.notify.lock().unwrap().as_ref() {
            n();
        }
    }
}

impl Transport for ScriptedTransport {
    fn start(&self, method: &str, url: &str, headers: &[(String, String)]) {
        println!("transport: {method} {url} ({} headers)", headers.len());
    }

    fn abort(&self) {
        println!("transport: aborted");
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
            .lock()
            .unwrap()
            .unwrap_or(ReadyState::Uninitialized)
    }

    fn status(&self) -> u16 {
        200
    }

    fn status_text(&self) -> String {
        "OK".to_string()
    }

    fn response_text(&self) -> String {
        "{\"ok\":true}".to_string()
    }

    fn set_notify(&self, notify: NotifyFn) {
        *self.notify.lock().unwrap() = Some(notify);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(ScriptedTransport::default());
    let conn = Connection::new(Arc::clone(&transport) as Arc<dyn Transport>);

    conn.set_request_header("Accept", "application/json")?;
    conn.emitter().subscribe(
        READY_STATE_CHANGED,
        Arc::new(|sig: &Signal| {
            if let Some(rs) = sig.payload_as::<ReadyState>() {
                println!("progress: {rs} (code {})", rs.as_code());
            }
        }),
    );

    conn.request("GET", "http://example.test/status")?;
    for rs in [
        ReadyState::Loading,
        ReadyState::Loaded,
        ReadyState::Interactive,
        ReadyState::Complete,
    ] {
        transport.advance(rs);
    }

    assert_eq!(conn.state(), State::Closed);
    println!("response: {} {} → {}", conn.status(), conn.status_text(), conn.response_text());

    // Guards fail loudly on a closed connection.
    if let Err(err) = conn.abort() {
        println!("guard: {err}");
    }
    Ok(())
}
