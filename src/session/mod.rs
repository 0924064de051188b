//! Per-session conversation state.
//!
//! Each session owns an append-only log of role-tagged messages. Sessions
//! are explicit objects keyed by id - nothing here is process-global, so
//! concurrent sessions never share mutable state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

const GREETING: &str = "Hi, I'm a math assistant. Ask me any math or reasoning question.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A chat message. Immutable once created; owned by its conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered, append-only message log for one session.
///
/// There is deliberately no deletion or mutation API.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message in chronological order.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages, oldest first.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One user session: an id and its conversation.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub conversation: Conversation,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session seeded with the assistant greeting.
    pub fn new() -> Self {
        let mut conversation = Conversation::new();
        conversation.append(Message::assistant(GREETING));

        Self {
            id: Uuid::new_v4(),
            conversation,
            created_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Store of live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session and return its id.
    pub async fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.sessions.write().await.insert(id, session);
        tracing::info!(session = %id, "session created");
        id
    }

    /// Check whether a session exists.
    pub async fn exists(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Append a message to a session's conversation.
    ///
    /// Returns `false` if the session is unknown.
    pub async fn append(&self, id: Uuid, message: Message) -> bool {
        match self.sessions.write().await.get_mut(&id) {
            Some(session) => {
                session.conversation.append(message);
                true
            }
            None => false,
        }
    }

    /// Snapshot of a session's transcript, oldest first.
    pub async fn messages(&self, id: Uuid) -> Option<Vec<Message>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|s| s.conversation.all().to_vec())
    }
}
