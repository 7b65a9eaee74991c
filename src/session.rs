//! Per-conversation state: message history and idle eviction.
//!
//! Sessions are keyed by an opaque identifier and live in an injected
//! [`SessionStore`] rather than module-level state, so tests and
//! embedders can construct isolated stores. A session is seeded with a
//! system prompt on first access and evicted after a configurable idle
//! period.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default idle period after which a session is eligible for eviction.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

/// System prompt seeded into every new session.
const SYSTEM_PROMPT: &str = "You are a helpful research assistant. Ground your answers \
in the provided search results, cite URLs where available, and finish with a line \
starting with **Answer:** that states the direct answer.";

/// Opaque conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug)]
struct Session {
    history: Vec<ChatMessage>,
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

/// In-memory session store keyed by [`SessionId`].
///
/// Interior mutability via a standard mutex; all operations are short
/// critical sections with no await points inside.
#[derive(Debug)]
pub struct SessionStore {
    max_idle: Duration,
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new(max_idle: Duration) -> Self {
        Self {
            max_idle,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Append a message to a session, creating and seeding the session
    /// if it does not exist yet.
    pub fn append(&self, id: &SessionId, message: ChatMessage) {
        let mut sessions = self.sessions.lock().expect("session store lock");
        let session = sessions
            .entry(id.clone())
            .or_insert_with(Session::new);
        session.history.push(message);
        session.touch();
    }

    /// Snapshot of a session's full history, seeding the session if it
    /// does not exist yet.
    pub fn history(&self, id: &SessionId) -> Vec<ChatMessage> {
        let mut sessions = self.sessions.lock().expect("session store lock");
        let session = sessions
            .entry(id.clone())
            .or_insert_with(Session::new);
        session.touch();
        session.history.clone()
    }

    /// Remove a session entirely. Returns whether it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .expect("session store lock")
            .remove(id)
            .is_some()
    }

    /// Evict sessions idle longer than the configured period. Returns
    /// the number evicted.
    pub fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().expect("session store lock");
        let before = sessions.len();
        let max_idle = self.max_idle;
        sessions.retain(|_, s| s.last_active.elapsed() < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

/// Fold the most recent user/assistant exchanges into a prompt prefix.
/// The system message is excluded; it travels separately.
pub fn history_prompt(history: &[ChatMessage], max_messages: usize) -> String {
    let turns: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| m.role != Role::System)
        .collect();
    let start = turns.len().saturating_sub(max_messages);

    let mut out = String::new();
    for message in &turns[start..] {
        let speaker = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => continue,
        };
        out.push_str(&format!("{speaker}: {}\n", message.content));
    }
    out
}

/// Convert conversation history into role-tagged wire pairs for
/// backends that accept conversational context: one
/// `("human" | "assistant", text)` entry per message, system messages
/// excluded.
pub fn history_pairs(history: &[ChatMessage]) -> Vec<(String, String)> {
    history
        .iter()
        .filter_map(|message| {
            let role = match message.role {
                Role::User => "human",
                Role::Assistant => "assistant",
                Role::System => return None,
            };
            Some((role.to_string(), message.content.clone()))
        })
        .collect()
}
