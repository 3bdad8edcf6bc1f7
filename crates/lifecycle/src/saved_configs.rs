//! Per-workflow agent list persisted at install time.
//!
//! `agent-configs.json` is written once when a workflow is installed and is
//! only ever read afterwards. Workflows installed before lazy registration
//! existed have no such file; their agents are permanently registered and
//! the lifecycle hooks leave them alone.

use std::path::{Path, PathBuf};

use af_domain::agent_id::AgentId;
use af_domain::error::Result;
use af_domain::AgentRole;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::shared_config::write_atomic;

pub const AGENT_CONFIGS_FILE: &str = "agent-configs.json";

/// One agent as provisioned by the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAgentConfig {
    /// Workflow-qualified id, `workflow/local`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub workspace_dir: PathBuf,
    pub agent_dir: PathBuf,
    pub role: AgentRole,
}

impl SavedAgentConfig {
    pub fn agent_id(&self) -> Option<AgentId> {
        AgentId::parse(&self.id)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

pub fn agent_configs_path(workflow_dir: &Path) -> PathBuf {
    workflow_dir.join(AGENT_CONFIGS_FILE)
}

/// Read the saved agent list for a workflow.
///
/// `None` means a legacy workflow: the file is missing or does not parse.
/// Callers treat that as "nothing to do", never as an error.
pub async fn load_agent_configs(workflow_dir: &Path) -> Option<Vec<SavedAgentConfig>> {
    let path = agent_configs_path(workflow_dir);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no saved agent configs");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(configs) => Some(configs),
        Err(e) => {
            warn!("failed to parse {}: {e}", path.display());
            None
        }
    }
}

/// Persist the agent list for a freshly installed workflow.
pub async fn save_agent_configs(workflow_dir: &Path, configs: &[SavedAgentConfig]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(configs)?;
    json.push('\n');
    write_atomic(&agent_configs_path(workflow_dir), json.as_bytes(), None).await
}
