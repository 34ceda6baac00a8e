use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{join_context, provenance, AgentCore, AgentKind, AgentResult};
use crate::error::AgentError;
use crate::llm::Message;
use crate::prompts::{KNOWLEDGE_NOT_FOUND_ANSWER, KNOWLEDGE_PROMPT};
use crate::storage::Fragment;

const KIND: AgentKind = AgentKind::Knowledge;

/// Provenance line for knowledge answers.
pub const KNOWLEDGE_PROVENANCE: &str = "Extraits de la base documentaire client.";

/// Answers strictly from the client document base.
pub struct KnowledgeAgent {
    core: AgentCore,
}

impl KnowledgeAgent {
    /// Create the agent.
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Answer `question` from retrieved fragments.
    ///
    /// When nothing is retrieved the fixed not-found answer is returned
    /// without calling the model.
    pub async fn run(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        let fragments = self
            .core
            .retrieve(KIND, question, KIND.retrieval_depth(), cancel)
            .await?;

        if fragments.is_empty() {
            info!(agent = %KIND, "No matching fragment, answering without the model");
            return Ok(AgentResult::new(
                KIND,
                KNOWLEDGE_NOT_FOUND_ANSWER.to_string(),
                Vec::new(),
                String::new(),
            ));
        }

        let messages = self.build_messages(question, &fragments);
        let answer = self
            .core
            .complete(KIND, messages, KIND.temperature(), cancel)
            .await?;

        let sources = provenance(KNOWLEDGE_PROVENANCE, &fragments);
        Ok(AgentResult::new(KIND, answer, fragments, sources))
    }

    fn build_messages(&self, question: &str, fragments: &[Fragment]) -> Vec<Message> {
        vec![
            Message::system(KNOWLEDGE_PROMPT),
            Message::user(format!(
                "Question du client : {}\n\nCONTEXTE EXTRAIT :\n{}",
                question,
                join_context(fragments)
            )),
        ]
    }
}
