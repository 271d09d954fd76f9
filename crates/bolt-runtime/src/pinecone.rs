//! Pinecone Assistant Backend
//!
//! Implementation of `KnowledgeBackend` on top of the Pinecone Assistant
//! chat API. Connection tests list indexes on the control plane; questions
//! go to the assistant data plane with the recent conversation attached.

use std::time::Instant;

use async_trait::async_trait;
use bolt_core::{
    backend::{Answer, ConnectionStatus, KnowledgeBackend},
    error::{AssistantError, Result},
    message::{ChatMessage, Role},
    tokens::{TokenUsage, compress_message, format_union_query, trim_context},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::network_error;

/// Assistant id used when `PINECONE_ASSISTANT_ID` is unset
pub const DEFAULT_ASSISTANT_ID: &str = "business-agent-bot";

/// Prefix every valid Pinecone API key carries
pub const API_KEY_PREFIX: &str = "pcsk_";

const API_VERSION: &str = "2025-01";

/// Estimated-token budget for history sent with a question
const CONTEXT_TOKEN_BUDGET: u32 = 1000;

/// Pinecone backend configuration
#[derive(Clone, Debug)]
pub struct PineconeConfig {
    /// API key; validated on every connection test
    pub api_key: Option<String>,

    /// Assistant name on the Pinecone project
    pub assistant_id: String,

    /// Data-plane host serving assistant chat
    pub assistant_host: String,

    /// Control-plane host used for connection tests
    pub control_host: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: DEFAULT_ASSISTANT_ID.into(),
            assistant_host: "https://prod-1-data.ke.pinecone.io".into(),
            control_host: "https://api.pinecone.io".into(),
        }
    }
}

impl PineconeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_key: std::env::var("PINECONE_API_KEY").ok().filter(|k| !k.is_empty()),
            assistant_id: std::env::var("PINECONE_ASSISTANT_ID").unwrap_or(defaults.assistant_id),
            assistant_host: std::env::var("PINECONE_ASSISTANT_HOST")
                .unwrap_or(defaults.assistant_host),
            control_host: std::env::var("PINECONE_CONTROL_HOST").unwrap_or(defaults.control_host),
        }
    }

    /// Return the API key, or a configuration error if it is missing or malformed
    pub fn validated_key(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AssistantError::Config("PINECONE_API_KEY environment variable is not set".into()))?;

        if !key.starts_with(API_KEY_PREFIX) {
            return Err(AssistantError::Config(format!(
                "Invalid PINECONE_API_KEY format. Must start with \"{API_KEY_PREFIX}\""
            )));
        }

        Ok(key)
    }

    /// Key prefix safe to print in logs
    pub fn key_hint(&self) -> String {
        self.api_key.as_deref().map_or_else(
            || "not configured".into(),
            |k| format!("{}...", k.chars().take(8).collect::<String>()),
        )
    }
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<serde_json::Value>,
}

/// Pinecone Assistant knowledge backend
pub struct PineconeBackend {
    client: Client,
    config: PineconeConfig,
}

impl PineconeBackend {
    pub fn new(config: PineconeConfig) -> Self {
        tracing::info!(
            assistant_id = %config.assistant_id,
            api_key = %config.key_hint(),
            "Pinecone backend configured"
        );

        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::new(PineconeConfig::from_env())
    }

    /// History trimmed to the token budget and compressed, then the topic-tagged query
    fn wire_messages(query: &str, context: &[ChatMessage]) -> Vec<WireMessage> {
        trim_context(context, CONTEXT_TOKEN_BUDGET)
            .into_iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: compress_message(&m.content),
            })
            .chain(std::iter::once(WireMessage {
                role: "user",
                content: format_union_query(query),
            }))
            .collect()
    }
}

#[async_trait]
impl KnowledgeBackend for PineconeBackend {
    fn name(&self) -> &str {
        "pinecone"
    }

    fn assistant_id(&self) -> &str {
        &self.config.assistant_id
    }

    async fn test_connection(&self) -> Result<ConnectionStatus> {
        let key = self.config.validated_key()?;
        let started = Instant::now();

        let response = self
            .client
            .get(format!("{}/indexes", self.config.control_host))
            .header("Api-Key", key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Pinecone connection test failed");
                return Ok(ConnectionStatus::disconnected(&self.config.assistant_id, e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Pinecone rejected connection test");
            return Ok(ConnectionStatus::disconnected(
                &self.config.assistant_id,
                format!("Pinecone returned {status}"),
            ));
        }

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let index_count = response
            .json::<IndexList>()
            .await
            .map(|l| l.indexes.len())
            .unwrap_or_default();

        tracing::info!(response_time_ms = elapsed, index_count, "Pinecone connection test successful");

        Ok(ConnectionStatus::connected(&self.config.assistant_id, elapsed))
    }

    async fn query(&self, query: &str, context: &[ChatMessage]) -> Result<Answer> {
        let key = self.config.validated_key()?;

        let request = ChatRequest {
            messages: Self::wire_messages(query, context),
            stream: false,
        };

        let url = format!(
            "{}/assistant/chat/{}",
            self.config.assistant_host, self.config.assistant_id
        );

        tracing::debug!(query_len = query.len(), context_items = context.len(), "Querying Pinecone assistant");

        let response = self
            .client
            .post(&url)
            .header("Api-Key", key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(AssistantError::Backend(format!(
                "Pinecone assistant returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let text = parsed.message.content;

        let usage = parsed.usage.map_or_else(
            || TokenUsage::for_exchange(query, context, &text),
            |u| TokenUsage {
                prompt: u.prompt_tokens,
                completion: u.completion_tokens,
                total: u.total_tokens,
            },
        );

        Ok(Answer { text, usage })
    }
}
