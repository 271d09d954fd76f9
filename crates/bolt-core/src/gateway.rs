//! Assistant Gateway
//!
//! Routes a member question to the knowledge backend while it reports
//! itself connected, and degrades to a canned reply otherwise. `ask` never
//! fails: every backend problem ends in a fallback reply.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::backend::{ConnectionStatus, KnowledgeBackend};
use crate::error::{AssistantError, Result};
use crate::fallback::fallback_reply;
use crate::message::{ChatMessage, recent};
use crate::tokens::TokenUsage;

/// Upper bound for a single connection test
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval of the background connection poll
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Where a reply came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Backend,
    Fallback,
}

/// Reply returned to the chat endpoint
#[derive(Clone, Debug, Serialize)]
pub struct Reply {
    pub text: String,
    pub usage: TokenUsage,
    pub source: ReplySource,
}

impl Reply {
    fn fallback(message: &str) -> Self {
        let text = fallback_reply(message);
        Self {
            text: text.to_string(),
            usage: TokenUsage::for_fallback(message, text),
            source: ReplySource::Fallback,
        }
    }
}

/// Fallback-aware front door to a knowledge backend
pub struct AssistantGateway {
    backend: Arc<dyn KnowledgeBackend>,
    status: RwLock<ConnectionStatus>,
    connection_timeout: Duration,
}

impl AssistantGateway {
    pub fn new(backend: Arc<dyn KnowledgeBackend>) -> Self {
        let status = ConnectionStatus::unknown(backend.assistant_id());
        Self {
            backend,
            status: RwLock::new(status),
            connection_timeout: CONNECTION_TIMEOUT,
        }
    }

    /// Override the connection test timeout
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn backend(&self) -> &Arc<dyn KnowledgeBackend> {
        &self.backend
    }

    /// Last known connection status
    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    /// Test the backend, bounded by the connection timeout, and cache the result
    pub async fn check_connection(&self) -> Result<ConnectionStatus> {
        let outcome = tokio::time::timeout(self.connection_timeout, self.backend.test_connection()).await;

        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(AssistantError::Timeout(self.connection_timeout.as_secs())),
        };

        let cached = match &result {
            Ok(status) => status.clone(),
            Err(e) => ConnectionStatus::disconnected(self.backend.assistant_id(), e.to_string()),
        };

        tracing::debug!(
            backend = self.backend.name(),
            connected = cached.connected,
            error = ?cached.error,
            "Assistant connection checked"
        );

        *self.status.write().await = cached;
        result
    }

    /// Answer a member message, never failing
    pub async fn ask(&self, message: &str, history: &[ChatMessage]) -> Reply {
        let context = recent(history);

        if !self.status.read().await.connected {
            tracing::debug!(backend = self.backend.name(), "Backend disconnected, using fallback");
            return Reply::fallback(message);
        }

        match self.backend.query(message, context).await {
            Ok(answer) => {
                tracing::info!(
                    backend = self.backend.name(),
                    prompt_tokens = answer.usage.prompt,
                    completion_tokens = answer.usage.completion,
                    "Backend answered"
                );
                Reply {
                    text: answer.text,
                    usage: answer.usage,
                    source: ReplySource::Backend,
                }
            }
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "Backend query failed, using fallback");
                Reply::fallback(message)
            }
        }
    }

    /// Re-test the backend on a fixed interval; only the cached status changes
    pub fn spawn_status_poller(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.check_connection().await {
                    tracing::warn!(error = %e, "Assistant status poll failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Answer;
    use async_trait::async_trait;

    struct StubBackend {
        reachable: bool,
        fail_queries: bool,
        slow: bool,
    }

    #[async_trait]
    impl KnowledgeBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        fn assistant_id(&self) -> &str {
            "stub-assistant"
        }

        async fn test_connection(&self) -> Result<ConnectionStatus> {
            if self.slow {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if self.reachable {
                Ok(ConnectionStatus::connected("stub-assistant", 1))
            } else {
                Ok(ConnectionStatus::disconnected("stub-assistant", "unreachable"))
            }
        }

        async fn query(&self, query: &str, context: &[ChatMessage]) -> Result<Answer> {
            if self.fail_queries {
                return Err(AssistantError::Backend("boom".into()));
            }
            Ok(Answer {
                text: format!("answer to {query} with {} context", context.len()),
                usage: TokenUsage::for_exchange(query, context, "x"),
            })
        }
    }

    fn gateway(reachable: bool, fail_queries: bool) -> AssistantGateway {
        AssistantGateway::new(Arc::new(StubBackend {
            reachable,
            fail_queries,
            slow: false,
        }))
    }

    #[tokio::test]
    async fn test_unchecked_gateway_falls_back() {
        let gw = gateway(true, false);
        let reply = gw.ask("safety question", &[]).await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.text.contains("safety"));
    }

    #[tokio::test]
    async fn test_connected_gateway_delegates() {
        let gw = gateway(true, false);
        assert!(gw.check_connection().await.unwrap().connected);

        let history: Vec<_> = (0..7).map(|i| ChatMessage::user(format!("m{i}"))).collect();
        let reply = gw.ask("hello", &history).await;
        assert_eq!(reply.source, ReplySource::Backend);
        assert_eq!(reply.text, "answer to hello with 5 context");
    }

    #[tokio::test]
    async fn test_backend_error_degrades_to_fallback() {
        let gw = gateway(true, true);
        gw.check_connection().await.unwrap();

        let reply = gw.ask("benefits?", &[]).await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.text.contains("benefit information"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_stays_disconnected() {
        let gw = gateway(false, false);
        let status = gw.check_connection().await.unwrap();
        assert!(!status.connected);
        assert_eq!(gw.ask("hi", &[]).await.source, ReplySource::Fallback);
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        let gw = AssistantGateway::new(Arc::new(StubBackend {
            reachable: true,
            fail_queries: false,
            slow: true,
        }))
        .with_connection_timeout(Duration::from_millis(20));

        let err = gw.check_connection().await.unwrap_err();
        assert!(matches!(err, AssistantError::Timeout(_)));
        assert!(!gw.status().await.connected);
    }
}
