//! Conversation transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::{AgentKind, AgentResult};
use crate::prompts::WELCOME_MESSAGE;

/// Agent label of the greeting turn.
pub const SYSTEM_LABEL: &str = "System";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message typed by the user.
    User,
    /// Answer, greeting or error report.
    Assistant,
}

/// One entry of the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub role: TurnRole,
    /// Turn text.
    pub text: String,
    /// Label of the producing agent, assistant turns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Source listing of an answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,
    /// The turn reports a failure instead of an answer.
    #[serde(default)]
    pub is_error: bool,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            agent: None,
            sources: None,
            is_error: false,
            created_at: Utc::now(),
        }
    }
}

/// A conversation: ordered, append-only turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    turns: Vec<Turn>,
    last_agent: Option<AgentKind>,
    /// When the session started.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session with the greeting turn.
    pub fn new() -> Self {
        let mut welcome = Turn::new(TurnRole::Assistant, WELCOME_MESSAGE);
        welcome.agent = Some(SYSTEM_LABEL.to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            turns: vec![welcome],
            last_agent: None,
            created_at: Utc::now(),
        }
    }

    /// Turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Agent that produced the latest successful answer.
    pub fn last_agent(&self) -> Option<AgentKind> {
        self.last_agent
    }

    /// Record a user message.
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::new(TurnRole::User, text));
    }

    /// Record an agent answer. An empty sources summary is stored as `None`.
    pub fn append_assistant(&mut self, result: &AgentResult) {
        let mut turn = Turn::new(TurnRole::Assistant, result.answer_text.clone());
        turn.agent = Some(result.agent_label.clone());
        turn.sources = (!result.sources_summary.is_empty()).then(|| result.sources_summary.clone());
        self.turns.push(turn);
        self.last_agent = Some(result.agent);
    }

    /// Record a failed turn.
    pub fn append_error(&mut self, agent: Option<AgentKind>, message: impl Into<String>) {
        let mut turn = Turn::new(TurnRole::Assistant, message);
        turn.agent = agent.map(|a| a.label().to_string());
        turn.is_error = true;
        self.turns.push(turn);
    }

    /// Drop every turn.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.last_agent = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
