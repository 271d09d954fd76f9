//! # bolt-core
//!
//! Assistant domain for UnionBolt: chat messages, token estimation, canned
//! fallbacks and the gateway that decides between a knowledge backend and
//! the fallback path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    AssistantGateway                       │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │  Connection  │  │   Fallback   │  │ KnowledgeBackend│  │
//! │  │    Status    │──│   Replies    │──│   (Strategy)   │  │
//! │  └──────────────┘  └──────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The `KnowledgeBackend` trait lets the server swap between the Pinecone
//! assistant and the internal knowledge base without touching chat logic.

pub mod backend;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod message;
pub mod tokens;

pub use backend::{Answer, ConnectionStatus, KnowledgeBackend};
pub use error::{AssistantError, Result};
pub use gateway::{AssistantGateway, Reply, ReplySource};
pub use message::{ChatMessage, ConversationId, Role};
pub use tokens::TokenUsage;
