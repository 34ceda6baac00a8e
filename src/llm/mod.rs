//! Model API access: chat completions and embeddings.
//!
//! Agents and the retriever depend on the [`ChatModel`] and [`Embedder`]
//! traits; [`OpenAiClient`] implements both over HTTP.

mod client;
mod types;


pub use client::OpenAiClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::LlmResult;

/// A chat-completion backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one request and wait for the full reply.
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatResponse>;
}

/// A text-embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every input, returning vectors in input order.
    async fn embed(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>>;

    /// Identifier of the embedding model, recorded on each store generation.
    fn model_name(&self) -> &str;
}
