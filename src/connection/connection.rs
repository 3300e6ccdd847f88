//! # Connection: state-guarded lifecycle of one outbound request.
//!
//! A [`Connection`] wraps an external [`Transport`] and models the request
//! lifecycle as `New → Active → Closed`. Every operation is guarded by the
//! current [`State`]; illegal calls fail with
//! [`ConnectionError::InvalidState`] — never a silent no-op.
//!
//! ## Event flow
//! ```text
//! transport progress ─► notify slot ─► ready_state_changed()
//!                                          ├─ cache ReadyState
//!                                          ├─ Active + Complete → Closed
//!                                          └─ emit ReadyStateChanged
//! ```
//!
//! Subscribers observe progress through the connection's [`Emitter`], fully
//! decoupled from the transport's native notification mechanism.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::events::Emitter;

use super::error::ConnectionError;
use super::ready_state::ReadyState;
use super::state::{State, Transition, next_state};
use super::transport::Transport;

/// Channel emitted on every transport progress change (payload: [`ReadyState`]).
pub const READY_STATE_CHANGED: &str = "ReadyStateChanged";

struct ConnState {
    state: State,
    headers: Vec<(String, String)>,
    ready_state: ReadyState,
}

/// One outbound request over an external [`Transport`].
///
/// Created per request; once `Closed` it stays a read-only projection of the
/// transport's final values.
pub struct Connection {
    /// Self-reference handed to the transport's notify slot; weak, so a
    /// dropped connection never keeps the transport's callback alive.
    weak: Weak<Connection>,
    emitter: Emitter,
    transport: Arc<dyn Transport>,
    state: Mutex<ConnState>,
}

impl Connection {
    /// Creates a connection in the `New` state.
    ///
    /// Returns an `Arc` handle: the transport's notify slot holds a weak
    /// reference back to the connection once a request is sent.
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            emitter: Emitter::new("connection"),
            transport,
            state: Mutex::new(ConnState {
                state: State::New,
                headers: Vec::new(),
                ready_state: ReadyState::Uninitialized,
            }),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.lock().state
    }

    /// Progress emitter: [`READY_STATE_CHANGED`].
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Adds a request header. Allowed only in `New`.
    ///
    /// # Errors
    /// [`ConnectionError::InvalidState`] outside `New`.
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), ConnectionError> {
        let mut st = self.lock();
        if st.state != State::New {
            return Err(Self::invalid("set_request_header", st.state));
        }
        st.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    /// Sends the request. Allowed only in `New`; transitions to `Active`.
    ///
    /// The transport's notify slot is wired to
    /// [`ready_state_changed`](Connection::ready_state_changed) **before** the
    /// request starts, so a transport that completes synchronously is still
    /// observed.
    ///
    /// # Errors
    /// [`ConnectionError::InvalidState`] outside `New`.
    pub fn request(&self, method: &str, url: &str) -> Result<(), ConnectionError> {
        let headers = {
            let mut st = self.lock();
            if st.state != State::New {
                return Err(Self::invalid("request", st.state));
            }
            st.state = next_state(st.state, Transition::Send);
            st.headers.clone()
        };

        let weak = self.weak.clone();
        self.transport.set_notify(Box::new(move || {
            if let Some(conn) = Weak::upgrade(&weak) {
                conn.ready_state_changed();
            }
        }));
        self.transport.start(method, url, &headers);
        Ok(())
    }

    /// Aborts the in-flight request. Allowed only in `Active`; transitions to
    /// `Closed`.
    ///
    /// # Errors
    /// [`ConnectionError::InvalidState`] outside `Active`.
    pub fn abort(&self) -> Result<(), ConnectionError> {
        {
            let mut st = self.lock();
            if st.state != State::Active {
                return Err(Self::invalid("abort", st.state));
            }
            st.state = next_state(st.state, Transition::Abort);
        }
        // Outside the lock: aborting may drive the transport's notify slot
        // synchronously, which re-enters ready_state_changed.
        self.transport.abort();
        Ok(())
    }

    /// Relays a transport progress change.
    ///
    /// Invoked from the transport's notify slot (installed by
    /// [`request`](Connection::request)); callable in any state. Caches the
    /// transport's ready state, applies `Active → Closed` once the transport
    /// reports `Complete`, and emits [`READY_STATE_CHANGED`] so subscribers
    /// see the post-transition state.
    pub fn ready_state_changed(&self) {
        let rs = self.transport.ready_state();
        {
            let mut st = self.lock();
            st.ready_state = rs;
            if rs == ReadyState::Complete && st.state == State::Active {
                st.state = next_state(st.state, Transition::Complete);
            }
        }
        self.emitter.emit_with(READY_STATE_CHANGED, Arc::new(rs));
    }

    /// Last progress code relayed from the transport (cached).
    pub fn ready_state(&self) -> ReadyState {
        self.lock().ready_state
    }

    /// Projects the transport's status code. Available in every state, only
    /// meaningful once the transport has progressed.
    pub fn status(&self) -> u16 {
        self.transport.status()
    }

    /// Projects the transport's status line text.
    pub fn status_text(&self) -> String {
        self.transport.status_text()
    }

    /// Projects the transport's response body.
    pub fn response_text(&self) -> String {
        self.transport.response_text()
    }

    fn invalid(operation: &'static str, state: State) -> ConnectionError {
        ConnectionError::InvalidState { operation, state }
    }

    fn lock(&self) -> MutexGuard<'_, ConnState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.lock();
        f.debug_struct("Connection")
            .field("state", &st.state)
            .field("ready_state", &st.ready_state)
            .field("headers", &st.headers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::transport::NotifyFn;
    use crate::events::Signal;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeInner {
        ready_state: Option<ReadyState>,
        started: Option<(String, String, Vec<(String, String)>)>,
        aborted: bool,
        status: u16,
        status_text: String,
        response_text: String,
    }

    /// Transport double driven by hand from the tests.
    #[derive(Default)]
    struct FakeTransport {
        inner: Mutex<FakeInner>,
        notify: Mutex<Option<NotifyFn>>,
    }

    impl FakeTransport {
        fn advance(&self, rs: ReadyState) {
            self.inner.lock().unwrap().ready_state = Some(rs);
            let notify = self.notify.lock().unwrap();
            if let Some(n) = notify.as_ref() {
                n();
            }
        }

        fn respond(&self, status: u16, status_text: &str, body: &str) {
            let mut inner = self.inner.lock().unwrap();
            inner.status = status;
            inner.status_text = status_text.to_string();
            inner.response_text = body.to_string();
        }
    }

    impl Transport for FakeTransport {
        fn start(&self, method: &str, url: &str, headers: &[(String, String)]) {
            self.inner.lock().unwrap().started =
                Some((method.to_string(), url.to_string(), headers.to_vec()));
        }

        fn abort(&self) {
            self.inner.lock().unwrap().aborted = true;
        }

        fn ready_state(&self) -> ReadyState {
            self.inner
                .lock()
                .unwrap()
                .ready_state
                .unwrap_or(ReadyState::Uninitialized)
        }

        fn status(&self) -> u16 {
            self.inner.lock().unwrap().status
        }

        fn status_text(&self) -> String {
            self.inner.lock().unwrap().status_text.clone()
        }

        fn response_text(&self) -> String {
            self.inner.lock().unwrap().response_text.clone()
        }

        fn set_notify(&self, notify: NotifyFn) {
            *self.notify.lock().unwrap() = Some(notify);
        }
    }

    #[test]
    fn test_new_allows_headers_rejects_abort() {
        let conn = Connection::new(Arc::new(FakeTransport::default()));
        conn.set_request_header("Accept", "text/plain").unwrap();

        let err = conn.abort().unwrap_err();
        assert_eq!(
            err,
            ConnectionError::InvalidState { operation: "abort", state: State::New }
        );
        assert!(err.to_string().contains("reset the connection first"));
    }

    #[test]
    fn test_request_transitions_to_active_and_guards_flip() {
        let transport = Arc::new(FakeTransport::default());
        let conn = Connection::new(Arc::clone(&transport) as Arc<dyn Transport>);
        conn.set_request_header("X-Trace", "1").unwrap();
        conn.request("GET", "http://example.test/data").unwrap();
        assert_eq!(conn.state(), State::Active);

        // Headers made it to the transport.
        let started = transport.inner.lock().unwrap().started.clone().unwrap();
        assert_eq!(started.0, "GET");
        assert_eq!(started.1, "http://example.test/data");
        assert_eq!(started.2, vec![("X-Trace".to_string(), "1".to_string())]);

        assert!(matches!(
            conn.set_request_header("Accept", "*/*"),
            Err(ConnectionError::InvalidState { operation: "set_request_header", state: State::Active })
        ));
        assert!(matches!(
            conn.request("GET", "http://example.test/other"),
            Err(ConnectionError::InvalidState { operation: "request", state: State::Active })
        ));
    }

    #[test]
    fn test_abort_closes_the_connection() {
        let transport = Arc::new(FakeTransport::default());
        let conn = Connection::new(Arc::clone(&transport) as Arc<dyn Transport>);
        conn.request("GET", "http://example.test/").unwrap();

        conn.abort().unwrap();
        assert_eq!(conn.state(), State::Closed);
        assert!(transport.inner.lock().unwrap().aborted);

        // Closed is terminal: everything guarded now fails.
        assert!(conn.abort().is_err());
        assert!(conn.set_request_header("a", "b").is_err());
        assert!(conn.request("GET", "http://example.test/").is_err());
    }

    #[test]
    fn test_transport_progress_relays_and_closes() {
        let transport = Arc::new(FakeTransport::default());
        let conn = Connection::new(Arc::clone(&transport) as Arc<dyn Transport>);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        conn.emitter().subscribe(
            READY_STATE_CHANGED,
            Arc::new(move |sig: &Signal| {
                if let Some(rs) = sig.payload_as::<ReadyState>() {
                    s.lock().unwrap().push(*rs);
                }
            }),
        );

        conn.request("POST", "http://example.test/submit").unwrap();
        transport.respond(200, "OK", "hello world");
        for rs in [
            ReadyState::Loading,
            ReadyState::Loaded,
            ReadyState::Interactive,
            ReadyState::Complete,
        ] {
            transport.advance(rs);
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ReadyState::Loading,
                ReadyState::Loaded,
                ReadyState::Interactive,
                ReadyState::Complete,
            ]
        );
        assert_eq!(conn.ready_state(), ReadyState::Complete);
        assert_eq!(conn.state(), State::Closed);
        assert_eq!(conn.status(), 200);
        assert_eq!(conn.status_text(), "OK");
        assert_eq!(conn.response_text(), "hello world");

        assert!(conn.request("GET", "http://example.test/").is_err());
        assert!(conn.abort().is_err());
        assert!(conn.set_request_header("a", "b").is_err());
    }

    #[test]
    fn test_subscribers_observe_post_transition_state() {
        let transport = Arc::new(FakeTransport::default());
        let conn = Connection::new(Arc::clone(&transport) as Arc<dyn Transport>);

        let states = Arc::new(Mutex::new(Vec::new()));
        let st = Arc::clone(&states);
        let probe = Arc::clone(&conn);
        conn.emitter().subscribe(
            READY_STATE_CHANGED,
            Arc::new(move |_sig: &Signal| {
                st.lock().unwrap().push(probe.state());
            }),
        );

        conn.request("GET", "http://example.test/").unwrap();
        transport.advance(ReadyState::Complete);
        assert_eq!(*states.lock().unwrap(), vec![State::Closed]);
    }
}
