//! Tavus Video Persona Client
//!
//! Creates and ends hosted video conversations with the union steward
//! persona through the Tavus v2 REST API.

use chrono::Utc;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::{VideoError, VideoResult};

/// Tavus v2 API base used when `TAVUS_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "https://tavusapi.com/v2";

/// Tavus client configuration
#[derive(Clone, Debug, Default)]
pub struct TavusConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub persona_id: Option<String>,
    pub replica_id: Option<String>,
}

impl TavusConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            api_key: var("TAVUS_API_KEY"),
            base_url: var("TAVUS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            persona_id: var("TAVUS_PERSONA_ID"),
            replica_id: var("TAVUS_REPLICA_ID"),
        }
    }

    /// Whether an API key is present
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> VideoResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| VideoError::Config("TAVUS_API_KEY is not set".into()))
    }
}

/// Per-request persona overrides
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverrides {
    pub replica_id: Option<String>,
    pub persona_id: Option<String>,
}

/// A live video conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSession {
    pub id: String,
    pub join_url: String,
    pub status: Option<String>,
}

/// Fixed call limits applied to every session
#[derive(Clone, Debug, Serialize)]
pub struct SessionProperties {
    pub max_call_duration: u32,
    pub participant_left_timeout: u32,
    pub participant_absent_timeout: u32,
    pub enable_recording: bool,
    pub enable_transcription: bool,
}

impl Default for SessionProperties {
    fn default() -> Self {
        Self {
            max_call_duration: 1800,
            participant_left_timeout: 60,
            participant_absent_timeout: 300,
            enable_recording: false,
            enable_transcription: true,
        }
    }
}

#[derive(Serialize)]
struct CreateConversation<'a> {
    replica_id: &'a str,
    persona_id: &'a str,
    conversation_name: String,
    properties: SessionProperties,
}

#[derive(Deserialize)]
struct ConversationCreated {
    conversation_id: String,
    conversation_url: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct ReplicaList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Tavus REST client
#[derive(Clone)]
pub struct TavusClient {
    client: Client,
    config: TavusConfig,
}

impl TavusClient {
    pub fn new(config: TavusConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub const fn config(&self) -> &TavusConfig {
        &self.config
    }

    /// Start a conversation, preferring request overrides over configured ids
    pub async fn create_session(&self, overrides: &SessionOverrides) -> VideoResult<VideoSession> {
        let api_key = self.config.api_key()?;
        let replica_id = overrides
            .replica_id
            .as_deref()
            .or(self.config.replica_id.as_deref())
            .ok_or_else(|| VideoError::Config("TAVUS_REPLICA_ID is not set".into()))?;
        let persona_id = overrides
            .persona_id
            .as_deref()
            .or(self.config.persona_id.as_deref())
            .ok_or_else(|| VideoError::Config("TAVUS_PERSONA_ID is not set".into()))?;

        let body = CreateConversation {
            replica_id,
            persona_id,
            conversation_name: format!("UnionBolt Steward Chat - {}", Utc::now().to_rfc3339()),
            properties: SessionProperties::default(),
        };

        tracing::info!(replica_id, persona_id, "Creating Tavus conversation");

        let response = self
            .client
            .post(format!("{}/conversations", self.config.base_url))
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let created: ConversationCreated = serde_json::from_str(&Self::success_body(response).await?)?;

        tracing::info!(conversation_id = %created.conversation_id, "Tavus conversation created");

        Ok(VideoSession {
            id: created.conversation_id,
            join_url: created.conversation_url,
            status: created.status,
        })
    }

    /// End a conversation
    pub async fn end_session(&self, conversation_id: &str) -> VideoResult<()> {
        let api_key = self.config.api_key()?;

        let response = self
            .client
            .delete(format!("{}/conversations/{conversation_id}", self.config.base_url))
            .header("x-api-key", api_key)
            .send()
            .await?;

        Self::success_body(response).await?;
        tracing::info!(conversation_id, "Tavus conversation ended");
        Ok(())
    }

    /// Count the replicas visible to the API key
    pub async fn replica_count(&self) -> VideoResult<usize> {
        let api_key = self.config.api_key()?;

        let response = self
            .client
            .get(format!("{}/replicas", self.config.base_url))
            .header("x-api-key", api_key)
            .send()
            .await?;

        let list: ReplicaList = serde_json::from_str(&Self::success_body(response).await?)?;
        Ok(list.data.len())
    }

    async fn success_body(response: Response) -> VideoResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            tracing::warn!(status = %status, body = %body, "Tavus request failed");
            Err(VideoError::Api {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}
