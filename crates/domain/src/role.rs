use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent role
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The closed set of roles an agent can play inside a workflow.
///
/// A role is the only input to the tool policy table, so an agent's
/// capabilities are fully determined once its role is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Analysis,
    Coding,
    Verification,
    Testing,
    Pr,
    Scanning,
    Compound,
}

impl AgentRole {
    pub const ALL: [AgentRole; 7] = [
        AgentRole::Analysis,
        AgentRole::Coding,
        AgentRole::Verification,
        AgentRole::Testing,
        AgentRole::Pr,
        AgentRole::Scanning,
        AgentRole::Compound,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Coding => "coding",
            Self::Verification => "verification",
            Self::Testing => "testing",
            Self::Pr => "pr",
            Self::Scanning => "scanning",
            Self::Compound => "compound",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown agent role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for AgentRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Role inference
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ANALYSIS_MARKERS: &[&str] = &[
    "planner",
    "prioritizer",
    "reviewer",
    "investigator",
    "triager",
];

/// Classify a free-form agent identifier into a role.
///
/// Used at install time when a workflow definition does not declare a role
/// explicitly. Matching is case-insensitive and substring based; anything
/// unrecognized (developer, fixer, setup, ...) falls back to `Coding`.
pub fn infer_role(agent_id: &str) -> AgentRole {
    let id = agent_id.to_ascii_lowercase();

    if ANALYSIS_MARKERS.iter().any(|m| id.contains(m)) {
        return AgentRole::Analysis;
    }
    if id.contains("verifier") {
        return AgentRole::Verification;
    }
    if id.contains("tester") {
        return AgentRole::Testing;
    }
    if id.contains("scanner") {
        return AgentRole::Scanning;
    }
    if id == "pr" || id.contains("/pr") {
        return AgentRole::Pr;
    }
    if id.contains("compound") {
        return AgentRole::Compound;
    }
    AgentRole::Coding
}
