//! Workflow run records, the source of truth for "is this workflow active".
//!
//! Every state change of a run is appended to `runs/runs.jsonl` under the
//! state path; on load the latest line per `run_id` wins. The in-memory map
//! is a cache: [`ActiveRunTracker::running_count`] re-reads the log so that
//! runs started by other processes are seen. Every access to the log holds
//! an `fs2` lock on the `runs.jsonl.lock` sidecar, so compaction in one
//! process never drops a record appended by another.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use af_domain::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow_id: workflow_id.into(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Active run tracker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Answers "how many runs of this workflow are currently running".
///
/// An `Err` means the answer is unknown; the lifecycle then keeps the
/// workflow's agents registered.
#[async_trait]
pub trait ActiveRunTracker: Send + Sync {
    async fn running_count(&self, workflow_id: &str) -> Result<usize>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct WorkflowRunStore {
    runs: RwLock<HashMap<Uuid, WorkflowRun>>,
    /// JSONL persistence path.
    log_path: PathBuf,
    /// Sidecar guarding every read and write of the log across processes.
    lock_path: PathBuf,
}

/// Held `fs2` lock on the log's sidecar. Dropping the file releases it.
struct LogLock {
    _file: File,
}

impl WorkflowRunStore {
    /// Open (or create) the store at `state_path/runs/runs.jsonl`.
    pub fn open(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("runs");
        std::fs::create_dir_all(&dir)?;

        let log_path = dir.join("runs.jsonl");
        let lock_path = dir.join("runs.jsonl.lock");

        let runs = {
            let _lock = lock_log(&lock_path, true)?;
            let (runs, lines) = Self::load(&log_path)?;

            // Compact when the log holds superseded lines.
            if lines > runs.len() {
                tracing::info!(
                    kept = runs.len(),
                    superseded = lines - runs.len(),
                    "compacting runs JSONL on disk"
                );
                Self::rewrite_jsonl(&log_path, &runs)?;
            }
            runs
        };

        Ok(Self {
            runs: RwLock::new(runs),
            log_path,
            lock_path,
        })
    }

    /// Replay the log. Returns the latest record per run and the line count.
    fn load(path: &Path) -> Result<(HashMap<Uuid, WorkflowRun>, usize)> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((HashMap::new(), 0));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut runs = HashMap::new();
        let mut total = 0;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            total += 1;
            match serde_json::from_str::<WorkflowRun>(line) {
                Ok(run) => {
                    runs.insert(run.run_id, run);
                }
                Err(e) => tracing::warn!(error = %e, "skipping malformed run record"),
            }
        }
        Ok((runs, total))
    }

    /// Rewrite the JSONL file with one line per run. Caller holds the
    /// exclusive log lock.
    fn rewrite_jsonl(path: &Path, runs: &HashMap<Uuid, WorkflowRun>) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "runs.jsonl".into());
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
        let mut ordered: Vec<&WorkflowRun> = runs.values().collect();
        ordered.sort_by_key(|r| r.started_at);

        let write = || -> Result<()> {
            let mut f = std::io::BufWriter::new(File::create(&tmp)?);
            for run in ordered {
                writeln!(f, "{}", serde_json::to_string(run)?)?;
            }
            f.flush()?;
            f.get_ref().sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Append one record. Caller holds the exclusive log lock.
    fn persist(&self, run: &WorkflowRun) -> Result<()> {
        let mut line = serde_json::to_string(run)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Record a new running run for `workflow_id`.
    pub fn start(&self, workflow_id: &str) -> Result<WorkflowRun> {
        let run = WorkflowRun::new(workflow_id);
        let _lock = lock_log(&self.lock_path, true)?;
        self.persist(&run)?;
        self.runs.write().insert(run.run_id, run.clone());
        Ok(run)
    }

    /// Move a run to a terminal status. Returns the updated record, or
    /// `None` for an unknown run id.
    pub fn finish(&self, run_id: &Uuid, status: RunStatus) -> Result<Option<WorkflowRun>> {
        if !status.is_terminal() {
            return Err(Error::RunStore(format!(
                "cannot finish run {run_id} with non-terminal status {}",
                status.as_str()
            )));
        }
        let _lock = lock_log(&self.lock_path, true)?;
        let (mut runs, _) = Self::load(&self.log_path)?;
        let updated = match runs.get_mut(run_id) {
            Some(run) => {
                run.finish(status);
                run.clone()
            }
            None => {
                *self.runs.write() = runs;
                return Ok(None);
            }
        };
        self.persist(&updated)?;
        *self.runs.write() = runs;
        Ok(Some(updated))
    }

    /// Reload state from the log, picking up changes by other processes.
    pub fn refresh(&self) -> Result<()> {
        let _lock = lock_log(&self.lock_path, false)?;
        let (runs, _) = Self::load(&self.log_path)?;
        *self.runs.write() = runs;
        Ok(())
    }

    pub fn get(&self, run_id: &Uuid) -> Option<WorkflowRun> {
        self.runs.read().get(run_id).cloned()
    }

    /// Runs newest first, optionally restricted to one workflow.
    pub fn list(&self, workflow_id: Option<&str>) -> Vec<WorkflowRun> {
        let mut runs: Vec<WorkflowRun> = self
            .runs
            .read()
            .values()
            .filter(|r| workflow_id.map_or(true, |w| r.workflow_id == w))
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }

    fn count_running(&self, workflow_id: &str) -> usize {
        self.runs
            .read()
            .values()
            .filter(|r| r.workflow_id == workflow_id && r.status == RunStatus::Running)
            .count()
    }
}

#[async_trait]
impl ActiveRunTracker for WorkflowRunStore {
    async fn running_count(&self, workflow_id: &str) -> Result<usize> {
        self.refresh()?;
        Ok(self.count_running(workflow_id))
    }
}

/// Block until the sidecar lock is held: exclusive for writers, shared
/// for readers.
fn lock_log(lock_path: &Path, exclusive: bool) -> Result<LogLock> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(|e| Error::Lock(format!("opening {}: {e}", lock_path.display())))?;
    let locked = if exclusive {
        FileExt::lock_exclusive(&file)
    } else {
        FileExt::lock_shared(&file)
    };
    locked.map_err(|e| Error::Lock(format!("locking {}: {e}", lock_path.display())))?;
    Ok(LogLock { _file: file })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_and_finish_update_running_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowRunStore::open(dir.path()).unwrap();

        let a = store.start("bugfix").unwrap();
        let _b = store.start("bugfix").unwrap();
        store.start("feature").unwrap();
        assert_eq!(store.running_count("bugfix").await.unwrap(), 2);

        let finished = store.finish(&a.run_id, RunStatus::Completed).unwrap().unwrap();
        assert_eq!(finished.status, RunStatus::Completed);
        assert!(finished.ended_at.is_some());
        assert_eq!(store.running_count("bugfix").await.unwrap(), 1);
        assert_eq!(store.running_count("feature").await.unwrap(), 1);
        assert_eq!(store.running_count("unknown").await.unwrap(), 0);
    }

    #[test]
    fn finish_unknown_run_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowRunStore::open(dir.path()).unwrap();
        assert!(store.finish(&Uuid::new_v4(), RunStatus::Failed).unwrap().is_none());
    }

    #[test]
    fn finish_rejects_running_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowRunStore::open(dir.path()).unwrap();
        let run = store.start("bugfix").unwrap();
        assert!(store.finish(&run.run_id, RunStatus::Running).is_err());
    }

    #[test]
    fn reopen_replays_latest_state_and_compacts() {
        let dir = tempfile::tempdir().unwrap();
        let run_id = {
            let store = WorkflowRunStore::open(dir.path()).unwrap();
            let run = store.start("bugfix").unwrap();
            store.finish(&run.run_id, RunStatus::Failed).unwrap();
            run.run_id
        };

        let log = dir.path().join("runs").join("runs.jsonl");
        assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 2);

        let store = WorkflowRunStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&run_id).unwrap().status, RunStatus::Failed);
        assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn sees_runs_started_by_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let first = WorkflowRunStore::open(dir.path()).unwrap();
        let second = WorkflowRunStore::open(dir.path()).unwrap();

        second.start("bugfix").unwrap();
        assert_eq!(first.running_count("bugfix").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn compaction_by_other_handles_keeps_concurrent_starts() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().to_path_buf();
        let writer = WorkflowRunStore::open(&state).unwrap();

        let churn_state = state.clone();
        let churn = std::thread::spawn(move || {
            for _ in 0..50 {
                // Each open compacts the superseded line left by the
                // previous finish.
                let store = WorkflowRunStore::open(&churn_state).unwrap();
                let run = store.start("other").unwrap();
                store.finish(&run.run_id, RunStatus::Completed).unwrap();
            }
        });
        for _ in 0..200 {
            writer.start("bugfix").unwrap();
        }
        churn.join().unwrap();

        let fresh = WorkflowRunStore::open(&state).unwrap();
        assert_eq!(fresh.running_count("bugfix").await.unwrap(), 200);
        assert_eq!(fresh.running_count("other").await.unwrap(), 0);
        assert_eq!(fresh.list(Some("other")).len(), 50);
    }

    #[test]
    fn compaction_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = WorkflowRunStore::open(dir.path()).unwrap();
            let run = store.start("bugfix").unwrap();
            store.finish(&run.run_id, RunStatus::Completed).unwrap();
        }
        WorkflowRunStore::open(dir.path()).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("runs"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["runs.jsonl", "runs.jsonl.lock"]);
    }

    #[test]
    fn list_filters_by_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowRunStore::open(dir.path()).unwrap();
        store.start("bugfix").unwrap();
        store.start("feature").unwrap();
        assert_eq!(store.list(None).len(), 2);
        assert_eq!(store.list(Some("feature")).len(), 1);
    }
}
