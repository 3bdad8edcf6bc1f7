//! Run start / run end hooks.
//!
//! A run is recorded as running before its agents are registered, and
//! marked terminal before the idle check. With the idle check performed
//! under the registrar's lock this ordering is what keeps a workflow with
//! an active run from losing its agents.

use std::path::PathBuf;
use std::sync::Arc;

use af_domain::config::workflow_dir;
use af_domain::error::{Error, Result};
use af_domain::trace::TraceEvent;
use uuid::Uuid;

use crate::orchestrator::LifecycleOrchestrator;
use crate::registrar::{RegisterOutcome, UnregisterOutcome};
use crate::runs::{RunStatus, WorkflowRun, WorkflowRunStore};

pub struct RunHooks {
    runs: Arc<WorkflowRunStore>,
    orchestrator: LifecycleOrchestrator,
    workflows_dir: PathBuf,
}

impl RunHooks {
    pub fn new(
        runs: Arc<WorkflowRunStore>,
        orchestrator: LifecycleOrchestrator,
        workflows_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runs,
            orchestrator,
            workflows_dir: workflows_dir.into(),
        }
    }

    pub fn runs(&self) -> &WorkflowRunStore {
        &self.runs
    }

    pub fn orchestrator(&self) -> &LifecycleOrchestrator {
        &self.orchestrator
    }

    pub fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        workflow_dir(&self.workflows_dir, workflow_id)
    }

    /// Record a new run and register its workflow's agents.
    ///
    /// If registration fails the run is marked failed so it does not keep
    /// the workflow looking active.
    pub async fn start_run(&self, workflow_id: &str) -> Result<(WorkflowRun, RegisterOutcome)> {
        let run = self.runs.start(workflow_id)?;
        TraceEvent::RunStarted {
            workflow_id: workflow_id.to_owned(),
            run_id: run.run_id.to_string(),
        }
        .emit();

        let workflow_dir = self.workflow_dir(workflow_id);
        match self
            .orchestrator
            .register_workflow_agents(workflow_id, &workflow_dir)
            .await
        {
            Ok(outcome) => Ok((run, outcome)),
            Err(e) => {
                tracing::error!(workflow_id, run_id = %run.run_id, error = %e, "agent registration failed");
                if let Err(mark) = self.runs.finish(&run.run_id, RunStatus::Failed) {
                    tracing::warn!(run_id = %run.run_id, error = %mark, "could not mark run failed");
                }
                Err(e)
            }
        }
    }

    /// Mark a run terminal, then unregister its workflow if now idle.
    pub async fn finish_run(
        &self,
        run_id: &Uuid,
        status: RunStatus,
    ) -> Result<(WorkflowRun, UnregisterOutcome)> {
        let run = self
            .runs
            .finish(run_id, status)?
            .ok_or_else(|| Error::RunStore(format!("unknown run: {run_id}")))?;
        TraceEvent::RunFinished {
            workflow_id: run.workflow_id.clone(),
            run_id: run.run_id.to_string(),
            status: status.as_str().to_owned(),
        }
        .emit();

        let outcome = self
            .orchestrator
            .unregister_workflow_agents_if_idle(&run.workflow_id)
            .await?;
        Ok((run, outcome))
    }
}
