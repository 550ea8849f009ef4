//! Session store for the streamable HTTP transport.
//!
//! A session groups the requests of one client, starting with the
//! `initialize` handshake. The server assigns each session an opaque
//! identifier which the client echoes in the `mcp-session-id` header on
//! every subsequent request. The store owns all live sessions; a session
//! leaves the store on explicit termination (DELETE) or when the idle
//! sweep reclaims it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Maximum number of queued server-to-client messages per session.
/// The oldest message is dropped once the queue is full.
const OUTBOX_CAPACITY: usize = 64;

/// A single live session.
///
/// The session is the per-client transport context: a serialization gate
/// (one in-flight request at a time), a bounded outbound message queue for
/// continuation polling, and lifecycle flags.
pub struct Session {
    id: String,
    /// Serializes request handling for this session. Held across dispatch.
    gate: Mutex<()>,
    /// Server-to-client messages awaiting a continuation (GET) request.
    outbox: parking_lot::Mutex<VecDeque<serde_json::Value>>,
    /// Set once the client has completed the initialize handshake.
    initialized: AtomicBool,
    /// Set on termination; requests observing this must be rejected even if
    /// they already hold an `Arc` to the session.
    closed: AtomicBool,
    last_seen: parking_lot::Mutex<Instant>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            gate: Mutex::new(()),
            outbox: parking_lot::Mutex::new(VecDeque::new()),
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_seen: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// The opaque session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire the per-session serialization gate.
    ///
    /// Concurrent requests for the same session queue here instead of
    /// interleaving.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Record activity for idle-expiry bookkeeping.
    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since the last request on this session.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Transition to the closed state. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Queue a server-to-client message for the next continuation poll.
    pub fn push_message(&self, message: serde_json::Value) {
        let mut outbox = self.outbox.lock();
        if outbox.len() >= OUTBOX_CAPACITY {
            outbox.pop_front();
            debug!(session_id = %self.id, "Outbox full, dropping oldest message");
        }
        outbox.push_back(message);
    }

    /// Take all queued server-to-client messages.
    pub fn drain_messages(&self) -> Vec<serde_json::Value> {
        self.outbox.lock().drain(..).collect()
    }
}

/// Owned mapping from session identifier to live session.
///
/// Process-wide shared state: every request handler resolves its session
/// here, so all mutations go through the map's write lock. The
/// check-then-insert in [`SessionStore::create`] is atomic under that lock,
/// which is what keeps client-supplied identifier hints from ever producing
/// two sessions with the same id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a live session by identifier.
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Create a new session and insert it into the store.
    ///
    /// A client-supplied `id_hint` is accepted when it is not already in
    /// use; otherwise a fresh 128-bit random identifier is generated.
    pub async fn create(&self, id_hint: Option<&str>) -> Arc<Session> {
        let mut sessions = self.sessions.write().await;

        let id = match id_hint {
            Some(hint) if !hint.is_empty() && !sessions.contains_key(hint) => hint.to_string(),
            _ => {
                let mut id = Uuid::new_v4().to_string();
                while sessions.contains_key(&id) {
                    id = Uuid::new_v4().to_string();
                }
                id
            }
        };

        let session = Arc::new(Session::new(id.clone()));
        sessions.insert(id, session.clone());
        session
    }

    /// Remove a session. Idempotent: removing an absent identifier is a
    /// no-op and returns `false`.
    pub async fn remove(&self, id: &str) -> bool {
        match self.sessions.write().await.remove(id) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove every session idle for longer than `max_idle`.
    ///
    /// This is the cleanup path for clients that vanished without sending
    /// DELETE; without it the store grows without bound.
    pub async fn remove_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.idle_for() <= max_idle;
            if !keep {
                session.close();
            }
            keep
        });
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
