//! Chat backend seam and the per-session conversation map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;

/// Failure reported by a chat backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(String),

    #[error("chat backend returned an empty reply")]
    EmptyReply,
}

/// A conversational model that can open sessions.
pub trait ChatBackend: Send + Sync {
    fn start_session(&self) -> Box<dyn ChatSession>;
}

/// One conversation. Calls block until the full reply is available.
pub trait ChatSession: Send {
    fn send(&mut self, prompt: &str) -> Result<String, ChatError>;
}

type SharedSession = Arc<Mutex<Box<dyn ChatSession>>>;

/// Open chat sessions by id. Sessions live for the process lifetime.
#[derive(Default)]
pub(super) struct SessionStore {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub(super) fn len(&self) -> usize {
        self.lock().len()
    }

    /// The session for `id`, opened on `backend` if absent.
    pub(super) fn get_or_start(&self, id: &str, backend: &dyn ChatBackend) -> SharedSession {
        let mut sessions = self.lock();
        Arc::clone(
            sessions
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(backend.start_session()))),
        )
    }

    /// Register a fresh session under a new random id.
    pub(super) fn start_new(&self, backend: Option<&dyn ChatBackend>) -> String {
        let mut sessions = self.lock();
        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = format!("{:08x}", rng.gen::<u32>());
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        if let Some(backend) = backend {
            sessions.insert(id.clone(), Arc::new(Mutex::new(backend.start_session())));
        }
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Send `prompt` on `session`, holding it for the whole exchange.
pub(super) fn send(session: &SharedSession, prompt: &str) -> Result<String, ChatError> {
    let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
    session.send(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    struct EchoSession {
        turns: usize,
    }

    impl ChatBackend for Echo {
        fn start_session(&self) -> Box<dyn ChatSession> {
            Box::new(EchoSession { turns: 0 })
        }
    }

    impl ChatSession for EchoSession {
        fn send(&mut self, prompt: &str) -> Result<String, ChatError> {
            self.turns += 1;
            Ok(format!("{}:{prompt}", self.turns))
        }
    }

    #[test]
    fn sessions_keep_their_history() {
        let store = SessionStore::default();
        let a = store.get_or_start("a", &Echo);
        assert_eq!(send(&a, "hi").unwrap(), "1:hi");
        let again = store.get_or_start("a", &Echo);
        assert_eq!(send(&again, "hi").unwrap(), "2:hi");

        let b = store.get_or_start("b", &Echo);
        assert_eq!(send(&b, "hi").unwrap(), "1:hi");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn new_ids_are_eight_hex_chars() {
        let store = SessionStore::default();
        let id = store.start_new(Some(&Echo));
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(store.len(), 1);

        let unregistered = store.start_new(None);
        assert_ne!(unregistered, id);
        assert_eq!(store.len(), 1);
    }
}
