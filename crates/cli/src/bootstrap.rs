//! Wire the lifecycle components from configuration.

use std::sync::Arc;

use af_domain::config::Config;
use af_lifecycle::{GlobalConfigRegistrar, LifecycleOrchestrator, RunHooks, WorkflowRunStore};

/// Open the run store and build the hooks around the shared registrar.
///
/// The run store doubles as the active-run tracker for idle checks.
pub fn build_hooks(config: &Config) -> anyhow::Result<RunHooks> {
    let runs = Arc::new(
        WorkflowRunStore::open(&config.paths.state_path)
            .map_err(|e| anyhow::anyhow!("opening run store under {}: {e}", config.paths.state_path.display()))?,
    );
    let registrar = Arc::new(GlobalConfigRegistrar::from_config(config));
    tracing::debug!(
        shared_config = %registrar.path().display(),
        advisory_lock = config.registrar.advisory_lock,
        "lifecycle wired"
    );
    let orchestrator = LifecycleOrchestrator::new(registrar, runs.clone());
    Ok(RunHooks::new(runs, orchestrator, config.paths.workflows_dir.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_run_log_under_state_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.state_path = dir.path().join("state");
        config.paths.shared_config = dir.path().join("openclaw.json");

        let hooks = build_hooks(&config).unwrap();
        assert!(dir.path().join("state").join("runs").is_dir());
        assert!(hooks.runs().list(None).is_empty());
        assert_eq!(
            hooks.orchestrator().registrar().path(),
            dir.path().join("openclaw.json")
        );
        assert_eq!(
            hooks.workflow_dir("bugfix"),
            config.paths.workflow_dir("bugfix")
        );
    }
}
