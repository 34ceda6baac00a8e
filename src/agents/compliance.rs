use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    join_context, provenance, AgentCore, AgentKind, AgentResult, ComplianceFramework,
    RiskTolerance,
};
use crate::error::AgentError;
use crate::llm::Message;
use crate::prompts::compliance_prompt;
use crate::storage::Fragment;

const KIND: AgentKind = AgentKind::Compliance;

/// Reviews the client documents against a regulatory framework.
pub struct ComplianceAgent {
    core: AgentCore,
}

impl ComplianceAgent {
    /// Create the agent.
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Review `question` against `framework` at the given risk level.
    pub async fn run(
        &self,
        question: &str,
        framework: ComplianceFramework,
        risk: RiskTolerance,
        cancel: &CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        debug!(agent = %KIND, framework = %framework, risk = %risk, "Running compliance review");

        let fragments = self
            .core
            .retrieve(KIND, question, KIND.retrieval_depth(), cancel)
            .await?;

        let messages = Self::build_messages(question, framework, risk, &fragments);
        let answer = self
            .core
            .complete(KIND, messages, KIND.temperature(), cancel)
            .await?;

        let line = format!(
            "Analyse croisée : documents internes vs référentiel {}.",
            framework.label()
        );
        let sources = provenance(&line, &fragments);
        Ok(AgentResult::new(KIND, answer, fragments, sources))
    }

    /// Messages sent to the model for one review.
    pub fn build_messages(
        question: &str,
        framework: ComplianceFramework,
        risk: RiskTolerance,
        fragments: &[Fragment],
    ) -> Vec<Message> {
        vec![
            Message::system(compliance_prompt(framework, risk)),
            Message::user(format!(
                "QUESTION : {}\n\nCONTEXTE DOCUMENTAIRE :\n{}",
                question,
                join_context(fragments)
            )),
        ]
    }
}
