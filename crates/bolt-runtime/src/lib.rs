//! # bolt-runtime
//!
//! Concrete integrations for the UnionBolt assistant and video persona.
//!
//! ## Backends
//!
//! - **Internal** (default): built-in DeepSeek union knowledge base
//! - **Pinecone**: Pinecone Assistant chat API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bolt_runtime::{BackendKind, build_backend};
//!
//! let backend = build_backend(BackendKind::from_env());
//! let gateway = Arc::new(AssistantGateway::new(backend));
//! ```

use std::sync::Arc;

use bolt_core::{AssistantError, KnowledgeBackend};

pub mod error;
pub mod internal;
#[cfg(feature = "pinecone")]
pub mod pinecone;
pub mod tavus;

pub use error::{VideoError, VideoResult};
pub use internal::InternalKnowledgeBase;
#[cfg(feature = "pinecone")]
pub use pinecone::{PineconeBackend, PineconeConfig};
pub use tavus::{SessionOverrides, TavusClient, TavusConfig, VideoSession};

/// Which knowledge backend answers chat questions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Internal,
    Pinecone,
}

impl BackendKind {
    /// Parse a backend name; unknown names select the internal backend
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pinecone" => Self::Pinecone,
            other => {
                if other != "internal" {
                    tracing::warn!(backend = other, "Unknown assistant backend, using internal");
                }
                Self::Internal
            }
        }
    }

    /// Read `ASSISTANT_BACKEND`
    pub fn from_env() -> Self {
        std::env::var("ASSISTANT_BACKEND").map_or_else(|_| Self::default(), |v| Self::parse(&v))
    }
}

/// Build the configured knowledge backend
pub fn build_backend(kind: BackendKind) -> Arc<dyn KnowledgeBackend> {
    match kind {
        #[cfg(feature = "pinecone")]
        BackendKind::Pinecone => Arc::new(PineconeBackend::from_env()),
        #[cfg(not(feature = "pinecone"))]
        BackendKind::Pinecone => {
            tracing::warn!("Pinecone support not compiled in, using internal backend");
            Arc::new(InternalKnowledgeBase::new())
        }
        BackendKind::Internal => Arc::new(InternalKnowledgeBase::new()),
    }
}

#[cfg(feature = "pinecone")]
pub(crate) fn network_error(err: reqwest::Error) -> AssistantError {
    AssistantError::Network(err.to_string())
}

// Re-export core types for convenience
pub use bolt_core::{AssistantGateway, ConnectionStatus, Reply, ReplySource};
