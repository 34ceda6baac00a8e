//! Core infrastructure shared by all agents.
//!
//! [`AgentCore`] bundles the chat model, the retriever and the chat model
//! name, and maps their failures to [`AgentError`] tagged with the agent.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::AgentKind;
use crate::error::{AgentError, RetrievalError};
use crate::llm::{ChatModel, ChatRequest, Message};
use crate::retrieval::Retriever;
use crate::storage::Fragment;

/// Dependencies every agent needs.
#[derive(Clone)]
pub struct AgentCore {
    chat: Arc<dyn ChatModel>,
    retriever: Arc<Retriever>,
    chat_model: String,
}

impl AgentCore {
    /// Bundle the chat model, the retriever and the chat model name.
    pub fn new(
        chat: Arc<dyn ChatModel>,
        retriever: Arc<Retriever>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            retriever,
            chat_model: chat_model.into(),
        }
    }

    /// Retrieve `k` fragments for `query` on behalf of `agent`.
    pub async fn retrieve(
        &self,
        agent: AgentKind,
        query: &str,
        k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Fragment>, AgentError> {
        match self.retriever.retrieve_cancellable(query, k, cancel).await {
            Ok(fragments) => {
                debug!(agent = %agent, fragments = fragments.len(), "Context retrieved");
                Ok(fragments)
            }
            Err(RetrievalError::Cancelled) => Err(AgentError::Cancelled {
                agent: agent.label().to_string(),
            }),
            Err(source) => {
                warn!(agent = %agent, error = %source, "Retrieval failed");
                Err(AgentError::Retrieval {
                    agent: agent.label().to_string(),
                    source,
                })
            }
        }
    }

    /// Send `messages` to the chat model and return the trimmed reply.
    pub async fn complete(
        &self,
        agent: AgentKind,
        messages: Vec<Message>,
        temperature: f64,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let start = Instant::now();
        let request = ChatRequest::new(&self.chat_model, messages).with_temperature(temperature);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AgentError::Cancelled {
                    agent: agent.label().to_string(),
                })
            }
            response = self.chat.complete(request) => response,
        };

        let answer = response
            .and_then(|r| r.completion())
            .map_err(|source| {
                warn!(agent = %agent, error = %source, "Model call failed");
                AgentError::Execution {
                    agent: agent.label().to_string(),
                    source,
                }
            })?;

        debug!(
            agent = %agent,
            latency_ms = start.elapsed().as_millis() as u64,
            answer_chars = answer.len(),
            "Model answered"
        );
        Ok(answer)
    }
}
