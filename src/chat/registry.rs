//! Shared user registry and chat history.
//!
//! The registry is the only state shared across sessions. A single
//! exclusive lock guards both the name map and the history log, including
//! the whole broadcast iteration, so the order of join/rename/message/leave
//! notices observed in history and on any client matches real-time arrival
//! order across all sessions.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::event::{prompt_for, ChatEvent};

/// Errors from registry mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested name is held by a live session.
    #[error("name {0:?} is already taken")]
    NameTaken(String),

    /// The registry is at its capacity cap.
    #[error("chat is at capacity ({0} users)")]
    CapacityFull(usize),
}

/// Writable handle to a registered session's transport.
///
/// The session task owns the read half; the write half is shared between
/// the session (for its own prompts) and the registry (for broadcasts).
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl SessionHandle {
    /// Create a handle for a session's write half.
    pub fn new(id: Uuid, writer: Arc<Mutex<OwnedWriteHalf>>) -> Self {
        Self { id, writer }
    }

    /// The session id, used for logging.
    pub fn id(&self) -> Uuid {
        self.id
    }

    async fn send(&self, text: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await
    }
}

struct RegistryInner {
    sessions: HashMap<String, SessionHandle>,
    history: Vec<String>,
}

/// The shared, lock-protected structure mapping names to sessions and
/// storing the chat history.
pub struct Registry {
    max_users: usize,
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Create a registry with the given capacity cap.
    pub fn new(max_users: usize) -> Self {
        Self {
            max_users,
            inner: Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                history: Vec::new(),
            }),
        }
    }

    /// The capacity cap.
    pub fn max_users(&self) -> usize {
        self.max_users
    }

    /// Number of registered (named) sessions.
    pub async fn count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Whether the registry is at its capacity cap.
    pub async fn is_full(&self) -> bool {
        self.inner.lock().await.sessions.len() >= self.max_users
    }

    /// Try to register a name for a session.
    ///
    /// On success returns the history snapshot taken under the same lock
    /// acquisition, so the caller can replay exactly the events that
    /// happened before its join, none missing and none duplicated.
    pub async fn register(
        &self,
        name: &str,
        handle: SessionHandle,
    ) -> Result<Vec<String>, RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.sessions.len() >= self.max_users {
            return Err(RegistryError::CapacityFull(self.max_users));
        }
        if inner.sessions.contains_key(name) {
            return Err(RegistryError::NameTaken(name.to_string()));
        }
        debug!("Registered {:?} (session {})", name, handle.id());
        inner.sessions.insert(name.to_string(), handle);
        Ok(inner.history.clone())
    }

    /// Atomically rename a session.
    ///
    /// Fails with `NameTaken` if `new` is occupied, including by the caller
    /// itself. Renaming a name that is no longer registered is a no-op.
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.sessions.contains_key(new) {
            return Err(RegistryError::NameTaken(new.to_string()));
        }
        if let Some(handle) = inner.sessions.remove(old) {
            debug!("Renamed {:?} -> {:?} (session {})", old, new, handle.id());
            inner.sessions.insert(new.to_string(), handle);
        }
        Ok(())
    }

    /// Remove a name from the registry. Idempotent.
    ///
    /// Returns true if the name was present.
    pub async fn remove(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.sessions.remove(name).is_some();
        if removed {
            debug!(
                "Removed {:?} from registry ({} remaining)",
                name,
                inner.sessions.len()
            );
        }
        removed
    }

    /// Append a line to the history log.
    pub async fn append_history(&self, line: &str) {
        self.inner.lock().await.history.push(line.to_string());
    }

    /// Snapshot of the full history.
    pub async fn history(&self) -> Vec<String> {
        self.inner.lock().await.history.clone()
    }

    /// Append an event to history and broadcast it to every registered
    /// session except the event's originator.
    ///
    /// Each recipient gets the event line prefixed with a newline, followed
    /// by a newline and its own fresh prompt. The lock is held for the
    /// entire iteration, so no registry mutation can interleave with a
    /// broadcast. A write failure to one recipient is logged and does not
    /// abort delivery to the rest; that peer's own read failure will drive
    /// its removal.
    ///
    /// Returns the number of sessions the event was delivered to.
    pub async fn publish(&self, event: &ChatEvent) -> usize {
        let line = event.line();
        let exclude = event.originator();

        let mut inner = self.inner.lock().await;
        inner.history.push(line.clone());

        let mut delivered = 0;
        for (name, handle) in &inner.sessions {
            if name == exclude {
                continue;
            }
            let text = format!("\n{}\n{}", line, prompt_for(name));
            match handle.send(&text).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to deliver to {:?} (session {}): {}",
                        name,
                        handle.id(),
                        e
                    );
                }
            }
        }
        delivered
    }
}
