use std::str::FromStr;

use af_domain::policy::WRITE_TOOLS;
use af_domain::{build_tools_config, derive_tool_policy, infer_role, AgentRole};

/// Resolve a role name, falling back to inference from an agent id.
pub fn resolve_role(input: &str) -> AgentRole {
    AgentRole::from_str(input).unwrap_or_else(|_| infer_role(input))
}

/// One-line summary of what the role may change.
pub fn write_access(role: AgentRole) -> &'static str {
    let policy = derive_tool_policy(role);
    if WRITE_TOOLS.iter().any(|t| policy.denies(t)) {
        "read-only"
    } else {
        "may write"
    }
}

pub fn show(input: &str) -> anyhow::Result<()> {
    let role = resolve_role(input);
    let tools = build_tools_config(role);
    println!("# role: {role} ({})", write_access(role));
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}
