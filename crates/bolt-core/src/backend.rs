//! Knowledge Backend Strategy
//!
//! Common interface for the services that can answer member questions
//! (Pinecone assistant, internal DeepSeek knowledge base, test doubles),
//! so the gateway can swap between them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bolt_core::backend::KnowledgeBackend;
//!
//! let backend = PineconeBackend::new(config)?;
//! let status = backend.test_connection().await?;
//! let answer = backend.query("What are my overtime rights?", &history).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::ChatMessage;
use crate::tokens::TokenUsage;

/// Answer produced by a knowledge backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub usage: TokenUsage,
}

/// Result of a backend connection test
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,

    pub assistant_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Round-trip time of the test, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    /// Status before any test has run
    pub fn unknown(assistant_id: impl Into<String>) -> Self {
        Self {
            connected: false,
            assistant_id: assistant_id.into(),
            error: None,
            response_time: None,
            last_checked: None,
        }
    }

    pub fn connected(assistant_id: impl Into<String>, response_time: u64) -> Self {
        Self {
            connected: true,
            assistant_id: assistant_id.into(),
            error: None,
            response_time: Some(response_time),
            last_checked: Some(Utc::now()),
        }
    }

    pub fn disconnected(assistant_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            assistant_id: assistant_id.into(),
            error: Some(error.into()),
            response_time: None,
            last_checked: Some(Utc::now()),
        }
    }
}

/// Strategy trait for knowledge backends
///
/// `test_connection` returns `Err` only for configuration problems; an
/// unreachable backend is reported as `Ok` with `connected: false`.
#[async_trait]
pub trait KnowledgeBackend: Send + Sync {
    /// Backend name used in logs and health output
    fn name(&self) -> &str;

    /// Assistant identifier reported to clients
    fn assistant_id(&self) -> &str;

    /// Probe the backend
    async fn test_connection(&self) -> Result<ConnectionStatus>;

    /// Answer a member question given the preceding messages
    async fn query(&self, query: &str, context: &[ChatMessage]) -> Result<Answer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_camel_case() {
        let status = ConnectionStatus::connected("business-agent-bot", 42);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["assistantId"], "business-agent-bot");
        assert_eq!(json["responseTime"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_unknown_status_is_disconnected() {
        let status = ConnectionStatus::unknown("deepseek-r1-agent");
        assert!(!status.connected);
        assert!(status.last_checked.is_none());
    }
}
