//! The two lifecycle entry points called by the run engine.

use std::path::Path;
use std::sync::Arc;

use af_domain::error::Result;
use af_domain::trace::TraceEvent;

use crate::registrar::{GlobalConfigRegistrar, RegisterOutcome, UnregisterOutcome};
use crate::runs::ActiveRunTracker;
use crate::saved_configs::load_agent_configs;

#[derive(Clone)]
pub struct LifecycleOrchestrator {
    registrar: Arc<GlobalConfigRegistrar>,
    tracker: Arc<dyn ActiveRunTracker>,
}

impl LifecycleOrchestrator {
    pub fn new(registrar: Arc<GlobalConfigRegistrar>, tracker: Arc<dyn ActiveRunTracker>) -> Self {
        Self { registrar, tracker }
    }

    pub fn registrar(&self) -> &GlobalConfigRegistrar {
        &self.registrar
    }

    /// Called when a run starts: make the workflow's agents visible.
    ///
    /// A workflow without a saved agent list predates lazy registration and
    /// is left alone.
    pub async fn register_workflow_agents(
        &self,
        workflow_id: &str,
        workflow_dir: &Path,
    ) -> Result<RegisterOutcome> {
        let Some(configs) = load_agent_configs(workflow_dir).await else {
            tracing::debug!(workflow_id, dir = %workflow_dir.display(), "legacy workflow, skipping registration");
            TraceEvent::LegacyWorkflow {
                workflow_id: workflow_id.to_owned(),
                workflow_dir: workflow_dir.display().to_string(),
            }
            .emit();
            return Ok(RegisterOutcome::Legacy);
        };

        self.registrar.register_agents(workflow_id, &configs).await
    }

    /// Called when a run ends: drop the workflow's agents once no run of
    /// it is left running.
    pub async fn unregister_workflow_agents_if_idle(
        &self,
        workflow_id: &str,
    ) -> Result<UnregisterOutcome> {
        self.registrar
            .unregister_if_idle(workflow_id, self.tracker.as_ref())
            .await
    }
}
