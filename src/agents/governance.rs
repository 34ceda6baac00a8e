use tokio_util::sync::CancellationToken;

use super::{AgentCore, AgentKind, AgentResult, RiskTolerance};
use crate::error::AgentError;
use crate::llm::Message;
use crate::prompts::governance_prompt;

const KIND: AgentKind = AgentKind::Governance;

/// Strategic data governance advice. Works from the question alone.
pub struct GovernanceAgent {
    core: AgentCore,
}

impl GovernanceAgent {
    /// Create the agent.
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Advise on `question` at the given risk level.
    pub async fn run(
        &self,
        question: &str,
        risk: RiskTolerance,
        cancel: &CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        let messages = self.build_messages(question, risk);
        let answer = self
            .core
            .complete(KIND, messages, KIND.temperature(), cancel)
            .await?;

        Ok(AgentResult::new(KIND, answer, Vec::new(), String::new()))
    }

    fn build_messages(&self, question: &str, risk: RiskTolerance) -> Vec<Message> {
        vec![
            Message::system(governance_prompt(risk)),
            Message::user(question.to_string()),
        ]
    }
}
