//! `antfarm agents`: direct registration control.

use std::path::PathBuf;

use af_domain::agent_id::is_owned_by;
use af_lifecycle::{RegisterOutcome, RunHooks, UnregisterOutcome};

pub async fn register(
    hooks: &RunHooks,
    workflow_id: &str,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| hooks.workflow_dir(workflow_id));
    let outcome = hooks
        .orchestrator()
        .register_workflow_agents(workflow_id, &dir)
        .await?;
    println!("{}", describe_register(workflow_id, &outcome));
    Ok(())
}

pub async fn unregister(hooks: &RunHooks, workflow_id: &str) -> anyhow::Result<()> {
    let outcome = hooks
        .orchestrator()
        .unregister_workflow_agents_if_idle(workflow_id)
        .await?;
    println!("{}", describe_unregister(workflow_id, &outcome));
    Ok(())
}

pub async fn list(hooks: &RunHooks, workflow: Option<&str>) -> anyhow::Result<()> {
    let doc = hooks.orchestrator().registrar().read().await?;
    for id in doc
        .agent_ids()
        .filter(|id| workflow.map_or(true, |w| is_owned_by(id, w)))
    {
        println!("{id}");
    }
    Ok(())
}

pub fn describe_register(workflow_id: &str, outcome: &RegisterOutcome) -> String {
    match outcome {
        RegisterOutcome::Legacy => {
            format!("{workflow_id}: no saved agent configs, nothing to register")
        }
        RegisterOutcome::AlreadyRegistered => format!("{workflow_id}: already registered"),
        RegisterOutcome::Registered { added } => {
            format!("{workflow_id}: registered {}", added.join(", "))
        }
    }
}

pub fn describe_unregister(workflow_id: &str, outcome: &UnregisterOutcome) -> String {
    match outcome {
        UnregisterOutcome::StatusUnavailable => {
            format!("{workflow_id}: run status unavailable, agents kept")
        }
        UnregisterOutcome::StillActive { running } => {
            format!("{workflow_id}: {running} run(s) still active, agents kept")
        }
        UnregisterOutcome::NotRegistered => format!("{workflow_id}: nothing registered"),
        UnregisterOutcome::Unregistered { removed } => {
            format!("{workflow_id}: unregistered {}", removed.join(", "))
        }
    }
}
