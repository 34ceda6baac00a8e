//! Specialist agents.
//!
//! Five agents answer a turn, each with its own prompt, retrieval depth and
//! sampling temperature:
//! - [`KnowledgeAgent`]: grounded lookup in the client documents
//! - [`SummaryAgent`]: executive summary of the retrieved material
//! - [`ComplianceAgent`]: review against a regulatory framework
//! - [`GovernanceAgent`]: strategic advice, no retrieval
//! - [`DeliverableAgent`]: roadmap, pillars or deck outline
//!
//! All agents share their dependencies via [`AgentCore`] composition, and
//! [`AgentSet::run`] dispatches on the closed [`AgentKind`] enumeration.

mod compliance;
mod core;
mod deliverable;
mod governance;
mod knowledge;
mod summary;

pub use compliance::*;
pub use core::*;
pub use deliverable::*;
pub use governance::*;
pub use knowledge::*;
pub use summary::*;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::retrieval::format_sources;
use crate::storage::Fragment;

/// Agent identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Grounded question answering over the client documents.
    Knowledge,
    /// Executive summary.
    Summary,
    /// Compliance review.
    Compliance,
    /// Data governance strategy advice.
    Governance,
    /// Structured consulting deliverable.
    Deliverable,
}

impl AgentKind {
    /// Every agent.
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Knowledge,
        AgentKind::Summary,
        AgentKind::Compliance,
        AgentKind::Governance,
        AgentKind::Deliverable,
    ];

    /// Get the agent name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Knowledge => "knowledge",
            AgentKind::Summary => "summary",
            AgentKind::Compliance => "compliance",
            AgentKind::Governance => "governance",
            AgentKind::Deliverable => "deliverable",
        }
    }

    /// Human-readable label shown with each answer.
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Knowledge => "Knowledge Base Analyst",
            AgentKind::Summary => "Executive Summary Lead",
            AgentKind::Compliance => "Compliance Agent",
            AgentKind::Governance => "Data Strategy Director",
            AgentKind::Deliverable => "Consulting Delivery Lead",
        }
    }

    /// Fragments retrieved per turn. Zero means no retrieval.
    pub fn retrieval_depth(&self) -> usize {
        match self {
            AgentKind::Knowledge => 5,
            AgentKind::Summary => 7,
            AgentKind::Compliance => 6,
            AgentKind::Governance => 0,
            AgentKind::Deliverable => 4,
        }
    }

    /// Sampling temperature.
    pub fn temperature(&self) -> f64 {
        match self {
            AgentKind::Knowledge => 0.0,
            AgentKind::Summary => 0.2,
            AgentKind::Compliance => 0.1,
            AgentKind::Governance => 0.5,
            AgentKind::Deliverable => 0.5,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "knowledge" | "rag" => Ok(AgentKind::Knowledge),
            "summary" => Ok(AgentKind::Summary),
            "compliance" => Ok(AgentKind::Compliance),
            "governance" => Ok(AgentKind::Governance),
            "deliverable" | "generator" => Ok(AgentKind::Deliverable),
            _ => Err(format!("Unknown agent: {}", s)),
        }
    }
}

/// Regulatory framework a compliance review is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceFramework {
    /// EU AI Act.
    EuAiAct,
    /// GDPR.
    Gdpr,
    /// NIST AI Risk Management Framework.
    NistAiRmf,
    /// ISO/IEC 42001.
    Iso42001,
    /// No specific framework.
    #[default]
    General,
}

impl ComplianceFramework {
    /// Get the framework identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceFramework::EuAiAct => "eu_ai_act",
            ComplianceFramework::Gdpr => "gdpr",
            ComplianceFramework::NistAiRmf => "nist_ai_rmf",
            ComplianceFramework::Iso42001 => "iso_42001",
            ComplianceFramework::General => "general",
        }
    }

    /// Name used in prompts and provenance lines.
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceFramework::EuAiAct => "EU AI Act",
            ComplianceFramework::Gdpr => "GDPR",
            ComplianceFramework::NistAiRmf => "NIST AI RMF",
            ComplianceFramework::Iso42001 => "ISO 42001",
            ComplianceFramework::General => "Général",
        }
    }
}

impl std::fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ComplianceFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "euaiact" | "aiact" => Ok(ComplianceFramework::EuAiAct),
            "gdpr" | "rgpd" => Ok(ComplianceFramework::Gdpr),
            "nistairmf" | "nist" => Ok(ComplianceFramework::NistAiRmf),
            "iso42001" => Ok(ComplianceFramework::Iso42001),
            "general" | "général" => Ok(ComplianceFramework::General),
            _ => Err(format!("Unknown compliance framework: {}", s)),
        }
    }
}

/// How severe the client wants risk findings to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    /// Agile, light controls.
    Low,
    /// Standard controls.
    #[default]
    Medium,
    /// Critical systems.
    High,
}

impl RiskTolerance {
    /// Get the level name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
        }
    }

    /// Level with its qualifier, as shown to the model.
    pub fn label(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "Low (Agile)",
            RiskTolerance::Medium => "Medium (Standard)",
            RiskTolerance::High => "High (Critical)",
        }
    }
}

impl std::fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskTolerance::Low),
            "medium" => Ok(RiskTolerance::Medium),
            "high" => Ok(RiskTolerance::High),
            _ => Err(format!("Unknown risk tolerance: {}", s)),
        }
    }
}

/// Input of one agent run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentParams {
    /// The user message.
    pub question: String,
    /// Used by the compliance agent; defaults to [`ComplianceFramework::General`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_framework: Option<ComplianceFramework>,
    /// Used by the compliance and governance agents; defaults to [`RiskTolerance::Medium`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
}

impl AgentParams {
    /// Parameters for `question` with default framework and risk.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Set the compliance framework.
    pub fn with_framework(mut self, framework: ComplianceFramework) -> Self {
        self.compliance_framework = Some(framework);
        self
    }

    /// Set the risk tolerance.
    pub fn with_risk(mut self, risk: RiskTolerance) -> Self {
        self.risk_tolerance = Some(risk);
        self
    }
}

/// Output of one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent that answered.
    pub agent: AgentKind,
    /// Display label of that agent.
    pub agent_label: String,
    /// The answer, trimmed.
    pub answer_text: String,
    /// Fragments the answer was grounded on, best first.
    pub raw_fragments: Vec<Fragment>,
    /// Provenance line and source listing; empty when nothing was retrieved.
    pub sources_summary: String,
}

impl AgentResult {
    pub(crate) fn new(
        agent: AgentKind,
        answer_text: String,
        raw_fragments: Vec<Fragment>,
        sources_summary: String,
    ) -> Self {
        Self {
            agent,
            agent_label: agent.label().to_string(),
            answer_text,
            raw_fragments,
            sources_summary,
        }
    }
}

/// One instance of every agent.
pub struct AgentSet {
    knowledge: KnowledgeAgent,
    summary: SummaryAgent,
    compliance: ComplianceAgent,
    governance: GovernanceAgent,
    deliverable: DeliverableAgent,
}

impl AgentSet {
    /// Build every agent over a shared core.
    pub fn new(core: AgentCore) -> Self {
        Self {
            knowledge: KnowledgeAgent::new(core.clone()),
            summary: SummaryAgent::new(core.clone()),
            compliance: ComplianceAgent::new(core.clone()),
            governance: GovernanceAgent::new(core.clone()),
            deliverable: DeliverableAgent::new(core),
        }
    }

    /// Run the agent of `kind`.
    pub async fn run(
        &self,
        kind: AgentKind,
        params: &AgentParams,
        cancel: &CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        let question = params.question.as_str();
        let framework = params.compliance_framework.unwrap_or_default();
        let risk = params.risk_tolerance.unwrap_or_default();

        match kind {
            AgentKind::Knowledge => self.knowledge.run(question, cancel).await,
            AgentKind::Summary => self.summary.run(question, cancel).await,
            AgentKind::Compliance => {
                self.compliance
                    .run(question, framework, risk, cancel)
                    .await
            }
            AgentKind::Governance => self.governance.run(question, risk, cancel).await,
            AgentKind::Deliverable => self.deliverable.run(question, cancel).await,
        }
    }
}

/// Fragment texts separated by blank lines.
pub(crate) fn join_context(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Provenance line followed by the source listing.
pub(crate) fn provenance(line: &str, fragments: &[Fragment]) -> String {
    format!("{}\n{}", line, format_sources(fragments))
}
