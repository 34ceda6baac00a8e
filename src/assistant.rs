//! Turn handling: route, run the agent, record the transcript.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::agents::{
    AgentCore, AgentKind, AgentParams, AgentSet, ComplianceFramework, RiskTolerance,
};
use crate::config::Config;
use crate::error::AppResult;
use crate::llm::{ChatModel, Embedder, OpenAiClient};
use crate::retrieval::Retriever;
use crate::router::{select_agent, AgentChoice};
use crate::session::Session;

/// One user message plus the sidebar parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user message.
    pub text: String,
    /// Automatic routing or a forced agent.
    #[serde(default)]
    pub choice: AgentChoice,
    /// Framework for compliance reviews.
    #[serde(default)]
    pub framework: ComplianceFramework,
    /// Risk tolerance for compliance and governance answers.
    #[serde(default)]
    pub risk: RiskTolerance,
}

impl TurnRequest {
    /// Request with automatic routing and default parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the agent choice.
    pub fn with_choice(mut self, choice: AgentChoice) -> Self {
        self.choice = choice;
        self
    }

    /// Set the compliance framework.
    pub fn with_framework(mut self, framework: ComplianceFramework) -> Self {
        self.framework = framework;
        self
    }

    /// Set the risk tolerance.
    pub fn with_risk(mut self, risk: RiskTolerance) -> Self {
        self.risk = risk;
        self
    }
}

/// Answer of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    /// Agent that answered.
    pub agent: AgentKind,
    /// Display label of that agent.
    pub agent_label: String,
    /// The answer.
    pub answer_text: String,
    /// Provenance line and source listing, possibly empty.
    pub sources_summary: String,
}

/// Query entry point.
pub struct Assistant {
    agents: AgentSet,
}

impl Assistant {
    /// Wire the agents over explicit model backends.
    pub fn new(config: &Config, chat: Arc<dyn ChatModel>, embedder: Arc<dyn Embedder>) -> Self {
        let retriever = Arc::new(Retriever::from_config(config, embedder));
        let core = AgentCore::new(chat, retriever, config.models.chat.clone());
        Self {
            agents: AgentSet::new(core),
        }
    }

    /// Wire the agents over the HTTP model client.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = Arc::new(OpenAiClient::new(
            &config.openai,
            &config.models,
            config.request.clone(),
        )?);
        Ok(Self::new(config, client.clone(), client))
    }

    /// Answer one user message and record both turns in `session`.
    ///
    /// A failed turn is recorded as an error turn and the error returned.
    pub async fn handle_turn(
        &self,
        session: &mut Session,
        request: TurnRequest,
        cancel: &CancellationToken,
    ) -> AppResult<TurnReply> {
        let start = Instant::now();
        let agent = select_agent(&request.text, request.choice);
        session.append_user(request.text.clone());

        let params = AgentParams::new(request.text)
            .with_framework(request.framework)
            .with_risk(request.risk);

        match self.agents.run(agent, &params, cancel).await {
            Ok(result) => {
                session.append_assistant(&result);
                info!(
                    session_id = %session.id,
                    agent = %agent,
                    fragments = result.raw_fragments.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Turn completed"
                );
                Ok(TurnReply {
                    agent: result.agent,
                    agent_label: result.agent_label,
                    answer_text: result.answer_text,
                    sources_summary: result.sources_summary,
                })
            }
            Err(e) => {
                error!(session_id = %session.id, agent = %agent, error = %e, "Turn failed");
                session.append_error(Some(agent), e.to_string());
                Err(e.into())
            }
        }
    }
}
