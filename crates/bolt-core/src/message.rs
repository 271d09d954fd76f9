//! Chat Messages
//!
//! Message format shared by the chat endpoint and the knowledge backends.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of recent messages forwarded to a knowledge backend
pub const HISTORY_LIMIT: usize = 5;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Member input
    User,
    /// Assistant response
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The most recent `HISTORY_LIMIT` messages of a history, oldest first
pub fn recent(messages: &[ChatMessage]) -> &[ChatMessage] {
    let start = messages.len().saturating_sub(HISTORY_LIMIT);
    &messages[start..]
}

/// Conversation identifier handed back to the chat client
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Generate a fresh id of the form `conv_<millis>_<suffix>`
    pub fn generate() -> Self {
        let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self(format!("conv_{}_{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_recent_keeps_last_five() {
        let history: Vec<_> = (0..8).map(|i| ChatMessage::user(format!("m{i}"))).collect();
        let kept = recent(&history);
        assert_eq!(kept.len(), 5);
        assert_eq!(kept[0].content, "m3");
        assert_eq!(kept[4].content, "m7");
    }

    #[test]
    fn test_recent_short_history_untouched() {
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];
        assert_eq!(recent(&history).len(), 2);
    }

    #[test]
    fn test_conversation_id_format() {
        let id = ConversationId::generate();
        assert!(id.as_str().starts_with("conv_"));
        assert_eq!(id.as_str().split('_').count(), 3);
    }

    #[test]
    fn test_role_deserializes_lowercase() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
    }
}
