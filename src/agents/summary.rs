use tokio_util::sync::CancellationToken;

use super::{join_context, provenance, AgentCore, AgentKind, AgentResult};
use crate::error::AgentError;
use crate::llm::Message;
use crate::prompts::SUMMARY_PROMPT;
use crate::storage::Fragment;

const KIND: AgentKind = AgentKind::Summary;

/// Provenance line for summaries.
pub const SUMMARY_PROVENANCE: &str = "Synthèse consolidée des documents stratégiques.";

/// Writes an executive summary of the retrieved material.
pub struct SummaryAgent {
    core: AgentCore,
}

impl SummaryAgent {
    /// Create the agent.
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Summarize the documents relevant to `question`.
    pub async fn run(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        let fragments = self
            .core
            .retrieve(KIND, question, KIND.retrieval_depth(), cancel)
            .await?;

        let messages = self.build_messages(question, &fragments);
        let answer = self
            .core
            .complete(KIND, messages, KIND.temperature(), cancel)
            .await?;

        let sources = provenance(SUMMARY_PROVENANCE, &fragments);
        Ok(AgentResult::new(KIND, answer, fragments, sources))
    }

    fn build_messages(&self, question: &str, fragments: &[Fragment]) -> Vec<Message> {
        vec![
            Message::system(SUMMARY_PROMPT),
            Message::user(format!(
                "Sujet de la demande : {}\n\nCONTEXTE DOCUMENTAIRE BRUT :\n{}",
                question,
                join_context(fragments)
            )),
        ]
    }
}
