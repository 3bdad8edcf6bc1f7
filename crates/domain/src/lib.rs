//! Shared types for the Antfarm workflow agent lifecycle.
//!
//! Everything here is pure data: roles, structured agent identifiers, the
//! role-to-tool-policy table, configuration, errors, and trace events.

pub mod agent_id;
pub mod config;
pub mod error;
pub mod policy;
pub mod role;
pub mod trace;

pub use agent_id::AgentId;
pub use error::{Error, Result};
pub use policy::{build_tools_config, derive_tool_policy, ToolPolicy, BASELINE_DENY};
pub use role::{infer_role, AgentRole};
