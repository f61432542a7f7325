//! Connection registry: the set of currently registered participants and
//! their outbound message channels.
//!
//! Sessions are keyed by a server-assigned id, not by name - participant
//! names are self-declared and may collide, in which case both connections
//! are tracked independently. All methods are synchronous and non-blocking
//! (channel pushes never wait), so the network layer can call them while
//! holding the round lock.

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

pub type SessionId = u64;

/// One registered participant connection.
#[derive(Debug)]
struct Session {
    name: String,
    sender: UnboundedSender<String>,
}

/// Tracks registered participants and fans out server lines to them.
pub struct SessionRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    sessions: HashMap<SessionId, Session>,
    next_id: SessionId,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Adds a participant and returns its session id. Name collisions are
    /// allowed; each connection stays an independent entry.
    pub fn register(&self, name: &str, sender: UnboundedSender<String>) -> SessionId {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.sessions.insert(
            id,
            Session {
                name: name.to_string(),
                sender,
            },
        );
        info!("Session {} registered for {}", id, name);
        id
    }

    /// Removes a participant by connection identity. Returns true if the
    /// session was still registered.
    pub fn unregister(&self, id: SessionId) -> bool {
        let mut inner = self.inner.lock();
        match inner.sessions.remove(&id) {
            Some(session) => {
                info!("Session {} unregistered ({})", id, session.name);
                true
            }
            None => false,
        }
    }

    /// Number of currently registered participants. For round-completion
    /// checks this must be read while the round lock is held.
    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }

    /// Queues a line for one participant. A closed channel only means the
    /// connection is on its way out; the reader task handles the departure.
    pub fn send_to(&self, id: SessionId, line: &str) {
        let inner = self.inner.lock();
        if let Some(session) = inner.sessions.get(&id) {
            if session.sender.send(line.to_string()).is_err() {
                debug!("Dropped message for closing session {}", id);
            }
        }
    }

    /// Queues a line for every registered participant. Delivery failure on
    /// one channel never prevents delivery to the others.
    pub fn broadcast(&self, line: &str) {
        let inner = self.inner.lock();
        for (id, session) in &inner.sessions {
            if session.sender.send(line.to_string()).is_err() {
                debug!("Dropped broadcast for closing session {}", id);
            }
        }
    }
}
