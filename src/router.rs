//! Keyword routing of user messages to agents.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::AgentKind;

/// Keywords that select the summary agent.
pub const SUMMARY_KEYWORDS: &[&str] = &["résume", "synthèse", "summary", "tl;dr"];

/// Keywords that select the compliance agent.
pub const COMPLIANCE_KEYWORDS: &[&str] = &[
    "conformité",
    "compliance",
    "risque",
    "rgpd",
    "ai act",
    "security",
    "règlement",
];

/// Keywords that select the governance agent.
pub const GOVERNANCE_KEYWORDS: &[&str] = &[
    "gouvernance",
    "data owner",
    "steward",
    "qualité",
    "lineage",
    "mesh",
    "architecture",
];

/// Keywords that select the deliverable agent.
pub const DELIVERABLE_KEYWORDS: &[&str] = &[
    "plan",
    "action",
    "slide",
    "présentation",
    "email",
    "stratégie",
    "migration",
];

/// Keyword sets in priority order. The first set with a hit wins.
const ROUTES: [(AgentKind, &[&str]); 4] = [
    (AgentKind::Summary, SUMMARY_KEYWORDS),
    (AgentKind::Compliance, COMPLIANCE_KEYWORDS),
    (AgentKind::Governance, GOVERNANCE_KEYWORDS),
    (AgentKind::Deliverable, DELIVERABLE_KEYWORDS),
];

/// How the agent of a turn is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentChoice {
    /// Pick from the message keywords.
    #[default]
    Auto,
    /// Always use this agent.
    Manual(AgentKind),
}

impl std::fmt::Display for AgentChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentChoice::Auto => write!(f, "auto"),
            AgentChoice::Manual(kind) => write!(f, "{}", kind),
        }
    }
}

impl std::str::FromStr for AgentChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(AgentChoice::Auto);
        }
        s.parse().map(AgentChoice::Manual)
    }
}

/// Agent that should answer `text`.
pub fn select_agent(text: &str, choice: AgentChoice) -> AgentKind {
    if let AgentChoice::Manual(kind) = choice {
        return kind;
    }

    let lowered = text.to_lowercase();
    let selected = ROUTES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(AgentKind::Knowledge);

    debug!(agent = %selected, "Routed message");
    selected
}
