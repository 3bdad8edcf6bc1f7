//! Serialized read-modify-write access to the shared config document.
//!
//! Every mutation runs inside a critical section made of an in-process
//! async mutex and, when enabled, an exclusive `fs2` lock on a sidecar
//! `<document>.lock` file. Two registrations can therefore never both act
//! on the same stale snapshot, and an idle check cannot interleave with a
//! registration for the same document.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use af_domain::agent_id::is_owned_by;
use af_domain::config::{Config, RegistrarConfig};
use af_domain::error::{Error, Result};
use af_domain::trace::TraceEvent;
use fs2::FileExt;
use tokio::sync::{Mutex, MutexGuard};

use crate::allowlist::{add_subagent_allowlist, remove_subagent_allowlist};
use crate::runs::ActiveRunTracker;
use crate::saved_configs::SavedAgentConfig;
use crate::shared_config::{GlobalAgentEntry, SharedConfig};

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// No saved agent list: installed before lazy registration.
    Legacy,
    /// Every agent was already present; nothing was written.
    AlreadyRegistered,
    Registered { added: Vec<String> },
}

/// Result of an idle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnregisterOutcome {
    /// The run tracker could not answer; agents stay registered.
    StatusUnavailable,
    StillActive { running: usize },
    /// Nothing of this workflow was registered.
    NotRegistered,
    Unregistered { removed: Vec<String> },
}

/// Holds the critical section for one read-modify-write cycle.
struct WriteGuard<'a> {
    _local: MutexGuard<'a, ()>,
    // Dropping the file releases the advisory lock.
    _file_lock: Option<File>,
}

pub struct GlobalConfigRegistrar {
    path: PathBuf,
    settings: RegistrarConfig,
    write_lock: Mutex<()>,
}

impl GlobalConfigRegistrar {
    pub fn new(path: impl Into<PathBuf>, settings: RegistrarConfig) -> Self {
        Self {
            path: path.into(),
            settings,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.paths.shared_config.clone(), config.registrar.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Unsynchronized snapshot of the document.
    pub async fn read(&self) -> Result<SharedConfig> {
        SharedConfig::load(&self.path).await
    }

    async fn lock(&self) -> Result<WriteGuard<'_>> {
        let local = self.write_lock.lock().await;
        let file_lock = if self.settings.advisory_lock {
            Some(acquire_file_lock(self.lock_path()).await?)
        } else {
            None
        };
        Ok(WriteGuard {
            _local: local,
            _file_lock: file_lock,
        })
    }

    async fn write(&self, doc: &SharedConfig) -> Result<()> {
        doc.save(&self.path, Some(self.settings.file_mode)).await
    }

    /// Ensure every agent of `workflow_id` is present in `agents.list`.
    ///
    /// Agents already present are left untouched. When at least one agent
    /// is added, the whole workflow's id set is (re)written to the
    /// allowlist so a partially applied earlier attempt is healed.
    pub async fn register_agents(
        &self,
        workflow_id: &str,
        configs: &[SavedAgentConfig],
    ) -> Result<RegisterOutcome> {
        let owned: Vec<&SavedAgentConfig> = configs
            .iter()
            .filter(|agent| {
                let ok = agent.agent_id().is_some_and(|id| id.belongs_to(workflow_id));
                if !ok {
                    tracing::warn!(
                        workflow_id,
                        agent_id = %agent.id,
                        "skipping saved agent not qualified with its workflow id"
                    );
                }
                ok
            })
            .collect();

        let _guard = self.lock().await?;
        let mut doc = SharedConfig::load(&self.path).await?;

        let mut present: HashSet<String> = doc.agent_ids().map(str::to_owned).collect();
        let mut added = Vec::new();
        for agent in &owned {
            if !present.insert(agent.id.clone()) {
                continue;
            }
            let entry = GlobalAgentEntry::from_saved(agent).to_list_entry()?;
            doc.agents.list.push(entry);
            added.push(agent.id.clone());
        }

        if added.is_empty() {
            tracing::debug!(workflow_id, "workflow agents already registered");
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let all_ids: Vec<String> = owned.iter().map(|a| a.id.clone()).collect();
        let allowlisted = add_subagent_allowlist(&mut doc, &all_ids);

        self.write(&doc).await?;

        tracing::info!(
            workflow_id,
            added = added.len(),
            allowlisted,
            path = %self.path.display(),
            "registered workflow agents"
        );
        TraceEvent::AgentsRegistered {
            workflow_id: workflow_id.to_owned(),
            added: added.clone(),
            allowlisted,
        }
        .emit();

        Ok(RegisterOutcome::Registered { added })
    }

    /// Remove every agent of `workflow_id` if the tracker reports no
    /// running run.
    ///
    /// The tracker is consulted inside the critical section: a
    /// registration for a run that started after the query waits for this
    /// removal and then re-adds its agents.
    pub async fn unregister_if_idle(
        &self,
        workflow_id: &str,
        tracker: &dyn ActiveRunTracker,
    ) -> Result<UnregisterOutcome> {
        let _guard = self.lock().await?;

        match tracker.running_count(workflow_id).await {
            Err(e) => {
                tracing::warn!(workflow_id, error = %e, "run status unavailable, keeping agents");
                TraceEvent::UnregisterSkipped {
                    workflow_id: workflow_id.to_owned(),
                    reason: format!("run status unavailable: {e}"),
                }
                .emit();
                return Ok(UnregisterOutcome::StatusUnavailable);
            }
            Ok(running) if running > 0 => {
                tracing::debug!(workflow_id, running, "workflow still active");
                return Ok(UnregisterOutcome::StillActive { running });
            }
            Ok(_) => {}
        }

        let mut doc = SharedConfig::load(&self.path).await?;
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut doc.agents.list)
            .into_iter()
            .partition(|entry| is_owned_by(entry.id(), workflow_id));

        if removed.is_empty() {
            return Ok(UnregisterOutcome::NotRegistered);
        }

        doc.agents.list = kept;
        let removed: Vec<String> = removed.iter().map(|e| e.id().to_owned()).collect();
        remove_subagent_allowlist(&mut doc, &removed);

        self.write(&doc).await?;

        tracing::info!(
            workflow_id,
            removed = removed.len(),
            path = %self.path.display(),
            "unregistered idle workflow agents"
        );
        TraceEvent::AgentsUnregistered {
            workflow_id: workflow_id.to_owned(),
            removed: removed.clone(),
        }
        .emit();

        Ok(UnregisterOutcome::Unregistered { removed })
    }
}

/// Open the sidecar lock file and block (on a worker thread) until the
/// exclusive lock is ours.
async fn acquire_file_lock(lock_path: PathBuf) -> Result<File> {
    tokio::task::spawn_blocking(move || -> Result<File> {
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::Lock(format!("opening {}: {e}", lock_path.display())))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| Error::Lock(format!("locking {}: {e}", lock_path.display())))?;
        Ok(file)
    })
    .await
    .map_err(|e| Error::Lock(format!("lock task failed: {e}")))?
}
