use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Paths
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The platform-wide agent configuration document (`openclaw.json`).
    #[serde(default = "d_shared_config")]
    pub shared_config: PathBuf,
    /// Antfarm state directory. Run records live under `runs/`.
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
    /// Installed workflows, one sub-directory per workflow id.
    #[serde(default = "d_workflows_dir")]
    pub workflows_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            shared_config: d_shared_config(),
            state_path: d_state_path(),
            workflows_dir: d_workflows_dir(),
        }
    }
}

impl PathsConfig {
    pub fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        workflow_dir(&self.workflows_dir, workflow_id)
    }
}

/// Install directory of one workflow: `<workflows_dir>/<workflow_id>`.
pub fn workflow_dir(workflows_dir: &Path, workflow_id: &str) -> PathBuf {
    workflows_dir.join(workflow_id)
}

// ── serde default helpers ───────────────────────────────────────────

fn d_shared_config() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openclaw")
        .join("openclaw.json")
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data")
}
fn d_workflows_dir() -> PathBuf {
    PathBuf::from("./workflows")
}
