//! # Governance Assistant
//!
//! A multi-agent assistant for data governance questions. Each user message
//! is routed by keyword to one of five specialist agents, which ground their
//! answer in fragments retrieved from a vector index of the client's PDF
//! documents before calling an OpenAI-compatible chat model.
//!
//! ## Agents
//!
//! - **Knowledge**: grounded lookup in the client documents
//! - **Summary**: executive summary for a steering committee
//! - **Compliance**: review against EU AI Act, GDPR, NIST AI RMF or ISO 42001
//! - **Governance**: strategic advice, no retrieval
//! - **Deliverable**: roadmap, strategic pillars or deck outline
//!
//! ## Architecture
//!
//! ```text
//! user text → Router → Agent ─→ Retriever → SQLite vector store
//!                          └──→ Chat model (HTTP)
//!
//! PDFs → Ingestor → splitter → embeddings → new store generation → activate
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use governance_assistant::{Assistant, Config, Session, TurnRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let assistant = Assistant::from_config(&config)?;
//!     let mut session = Session::new();
//!     let reply = assistant
//!         .handle_turn(&mut session, TurnRequest::new("Résume la politique"), &CancellationToken::new())
//!         .await?;
//!     println!("[{}] {}", reply.agent_label, reply.answer_text);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Specialist agents and their shared core.
pub mod agents;
/// Turn handling over a session.
pub mod assistant;
/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Document loading, splitting and store rebuilds.
pub mod ingest;
/// Chat and embedding model clients.
pub mod llm;
/// System prompts for the agents.
pub mod prompts;
/// Similarity search over the vector store.
pub mod retrieval;
/// Keyword routing of messages to agents.
pub mod router;
/// Conversation transcript.
pub mod session;
/// SQLite vector store.
pub mod storage;

pub use agents::{AgentKind, ComplianceFramework, RiskTolerance};
pub use assistant::{Assistant, TurnReply, TurnRequest};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use ingest::{IngestOutcome, IngestReport, Ingestor};
pub use retrieval::Retriever;
pub use router::{select_agent, AgentChoice};
pub use session::Session;
