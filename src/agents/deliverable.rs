use tokio_util::sync::CancellationToken;

use super::{join_context, provenance, AgentCore, AgentKind, AgentResult};
use crate::error::AgentError;
use crate::llm::Message;
use crate::prompts::{DELIVERABLE_PROMPT, NO_SPECIFIC_DOCUMENT};
use crate::storage::Fragment;

const KIND: AgentKind = AgentKind::Deliverable;

/// Provenance line for deliverables.
pub const DELIVERABLE_PROVENANCE: &str =
    "Recommandation basée sur les standards du cabinet et le contexte client.";

/// Produces a structured deliverable: roadmap, strategic pillars or deck outline.
pub struct DeliverableAgent {
    core: AgentCore,
}

impl DeliverableAgent {
    /// Create the agent.
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Draft the deliverable asked for in `question`.
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

        let sources = provenance(DELIVERABLE_PROVENANCE, &fragments);
        Ok(AgentResult::new(KIND, answer, fragments, sources))
    }

    fn build_messages(&self, question: &str, fragments: &[Fragment]) -> Vec<Message> {
        let context = if fragments.is_empty() {
            NO_SPECIFIC_DOCUMENT.to_string()
        } else {
            join_context(fragments)
        };
        vec![
            Message::system(DELIVERABLE_PROMPT),
            Message::user(format!(
                "Demande du client : {}\n\nContexte projet (si applicable) :\n{}",
                question, context
            )),
        ]
    }
}
