//! Typed view over the shared `openclaw.json` document.
//!
//! Only the parts the lifecycle touches are typed: `agents.list` and the
//! sub-agent allowlist under `agents.defaults.subagents.allowAgents`. Every
//! other key, at any level, is carried through a flattened map so a
//! rewrite never drops settings owned by someone else.

use std::path::{Path, PathBuf};

use af_domain::error::{Error, Result};
use af_domain::{derive_tool_policy, ToolPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

use crate::saved_configs::SavedAgentConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub agents: AgentsSection,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentsSection {
    #[serde(default)]
    pub list: Vec<AgentListEntry>,
    #[serde(default, skip_serializing_if = "AgentDefaults::is_empty")]
    pub defaults: AgentDefaults,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default, skip_serializing_if = "SubagentPolicy::is_empty")]
    pub subagents: SubagentPolicy,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl AgentDefaults {
    pub fn is_empty(&self) -> bool {
        self.subagents.is_empty() && self.other.is_empty()
    }
}

/// Which agents an actor may address as sub-agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubagentPolicy {
    #[serde(default, rename = "allowAgents")]
    pub allow_agents: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl SubagentPolicy {
    pub fn is_empty(&self) -> bool {
        self.allow_agents.is_empty() && self.other.is_empty()
    }
}

/// One element of `agents.list`, kept as raw JSON.
///
/// Entries are written by several tools and survive a rewrite untouched,
/// including ones with a missing or non-string `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentListEntry {
    value: Value,
}

impl AgentListEntry {
    /// The entry's id, or `""` when it has no string id.
    pub fn id(&self) -> &str {
        self.value.get("id").and_then(Value::as_str).unwrap_or("")
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

/// A workflow agent as registered by the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAgentEntry {
    pub id: String,
    pub name: String,
    pub workspace: PathBuf,
    pub agent_dir: PathBuf,
    pub tools: ToolPolicy,
    #[serde(default)]
    pub subagents: SubagentPolicy,
}

impl GlobalAgentEntry {
    /// Build the registered entry for a saved agent. Its own allowlist
    /// starts empty.
    pub fn from_saved(agent: &SavedAgentConfig) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.display_name().to_owned(),
            workspace: agent.workspace_dir.clone(),
            agent_dir: agent.agent_dir.clone(),
            tools: derive_tool_policy(agent.role),
            subagents: SubagentPolicy::default(),
        }
    }

    pub fn to_list_entry(&self) -> Result<AgentListEntry> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }

    pub fn from_list_entry(entry: &AgentListEntry) -> Result<Self> {
        Ok(serde_json::from_value(entry.value.clone())?)
    }
}

impl SharedConfig {
    pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
        self.agents.list.iter().map(AgentListEntry::id)
    }

    pub fn find_agent(&self, id: &str) -> Option<&AgentListEntry> {
        self.agents.list.iter().find(|e| e.id() == id)
    }

    pub fn allowlist(&self) -> &[String] {
        &self.agents.defaults.subagents.allow_agents
    }

    /// Load the document, treating a missing or blank file as empty.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Serialize and atomically replace the document on disk.
    pub async fn save(&self, path: &Path, file_mode: Option<u32>) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        write_atomic(path, json.as_bytes(), file_mode).await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Atomic writes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Write `bytes` to a sibling temp file, fsync it, then rename over `path`.
///
/// Readers observe either the old or the new content, never a prefix. The
/// temp name carries the PID so writers in different processes cannot
/// clobber each other's temp file.
pub async fn write_atomic(path: &Path, bytes: &[u8], file_mode: Option<u32>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Other(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = write_and_rename(&tmp_path, path, bytes, file_mode).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}

async fn write_and_rename(
    tmp_path: &Path,
    path: &Path,
    bytes: &[u8],
    file_mode: Option<u32>,
) -> Result<()> {
    let mut file = tokio::fs::File::create(tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    #[cfg(unix)]
    if let Some(mode) = file_mode {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(tmp_path, std::fs::Permissions::from_mode(mode)).await?;
    }
    #[cfg(not(unix))]
    let _ = file_mode;

    tokio::fs::rename(tmp_path, path).await?;
    Ok(())
}
