//! Role-derived tool policies.
//!
//! The policy for an agent is a pure function of its [`AgentRole`]. The
//! table below is the whole policy language: a tool profile, an optional
//! list of extra tools, and a deny list that always starts with
//! [`BASELINE_DENY`].

use serde::{Deserialize, Serialize};

use crate::role::AgentRole;

/// Tools no workflow agent may ever use.
pub const BASELINE_DENY: &[&str] = &[
    "gateway",
    "cron",
    "message",
    "nodes",
    "canvas",
    "sessions_spawn",
    "sessions_send",
];

pub const CODING_PROFILE: &str = "coding";

/// Tools that modify files in the agent workspace.
pub const WRITE_TOOLS: &[&str] = &["write", "edit", "apply_patch"];
const MEDIA_TOOLS: &[&str] = &["image", "tts"];
const UI_TOOLS: &[&str] = &["group:ui"];
const RESEARCH_TOOLS: &[&str] = &["web_search", "web_fetch"];
const BROWSER_TOOLS: &[&str] = &["browser", "web_search", "web_fetch"];

/// One row of the static role table.
struct RolePolicy {
    profile: Option<&'static str>,
    also_allow: &'static [&'static str],
    deny: &'static [&'static [&'static str]],
}

fn role_policy(role: AgentRole) -> RolePolicy {
    match role {
        AgentRole::Analysis | AgentRole::Verification | AgentRole::Pr => RolePolicy {
            profile: Some(CODING_PROFILE),
            also_allow: &[],
            deny: &[WRITE_TOOLS, MEDIA_TOOLS, UI_TOOLS],
        },
        AgentRole::Coding | AgentRole::Compound => RolePolicy {
            profile: Some(CODING_PROFILE),
            also_allow: &[],
            deny: &[MEDIA_TOOLS, UI_TOOLS],
        },
        AgentRole::Testing => RolePolicy {
            profile: Some(CODING_PROFILE),
            also_allow: BROWSER_TOOLS,
            deny: &[WRITE_TOOLS, MEDIA_TOOLS],
        },
        AgentRole::Scanning => RolePolicy {
            profile: Some(CODING_PROFILE),
            also_allow: RESEARCH_TOOLS,
            deny: &[WRITE_TOOLS, MEDIA_TOOLS, UI_TOOLS],
        },
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tool access policy as written into a registered agent's `tools` block.
///
/// `profile` is omitted when unset and `alsoAllow` when empty; `deny` is
/// always present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl ToolPolicy {
    pub fn denies(&self, tool: &str) -> bool {
        self.deny.iter().any(|d| d == tool)
    }
}

/// Look up the tool policy for a role. Total and side-effect free.
pub fn derive_tool_policy(role: AgentRole) -> ToolPolicy {
    let row = role_policy(role);
    let deny = BASELINE_DENY
        .iter()
        .chain(row.deny.iter().flat_map(|group| group.iter()))
        .map(|t| (*t).to_owned())
        .collect();

    ToolPolicy {
        profile: row.profile.map(str::to_owned),
        also_allow: row.also_allow.iter().map(|t| (*t).to_owned()).collect(),
        deny,
    }
}

/// The externally visible `tools` object for a role.
pub fn build_tools_config(role: AgentRole) -> serde_json::Value {
    // ToolPolicy only holds strings, serialization cannot fail.
    serde_json::to_value(derive_tool_policy(role)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_denies_the_baseline() {
        for role in AgentRole::ALL {
            let policy = derive_tool_policy(role);
            for tool in BASELINE_DENY {
                assert!(policy.denies(tool), "{role} must deny {tool}");
            }
        }
    }

    #[test]
    fn only_coding_and_compound_may_write() {
        for role in AgentRole::ALL {
            let policy = derive_tool_policy(role);
            let may_write = matches!(role, AgentRole::Coding | AgentRole::Compound);
            for tool in WRITE_TOOLS {
                assert_eq!(!policy.denies(tool), may_write, "{role} / {tool}");
            }
        }
    }

    #[test]
    fn testing_is_the_only_role_with_ui() {
        for role in AgentRole::ALL {
            let policy = derive_tool_policy(role);
            assert_eq!(policy.denies("group:ui"), role != AgentRole::Testing);
            assert!(policy.denies("image"));
            assert!(policy.denies("tts"));
        }
    }

    #[test]
    fn research_roles_get_extra_tools() {
        let testing = derive_tool_policy(AgentRole::Testing);
        assert_eq!(testing.also_allow, vec!["browser", "web_search", "web_fetch"]);

        let scanning = derive_tool_policy(AgentRole::Scanning);
        assert_eq!(scanning.also_allow, vec!["web_search", "web_fetch"]);

        assert!(derive_tool_policy(AgentRole::Coding).also_allow.is_empty());
    }

    #[test]
    fn deny_list_has_no_duplicates() {
        for role in AgentRole::ALL {
            let policy = derive_tool_policy(role);
            let mut sorted = policy.deny.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), policy.deny.len(), "{role}");
        }
    }

    #[test]
    fn tools_config_omits_empty_also_allow() {
        let coding = build_tools_config(AgentRole::Coding);
        assert_eq!(coding["profile"], "coding");
        assert!(coding.get("alsoAllow").is_none());
        assert!(coding["deny"].as_array().unwrap().len() >= BASELINE_DENY.len());

        let testing = build_tools_config(AgentRole::Testing);
        assert_eq!(testing["alsoAllow"][0], "browser");
    }
}
