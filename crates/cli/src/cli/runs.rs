//! `antfarm run` and `antfarm runs`.

use af_lifecycle::{RunHooks, RunStatus};

use super::agents::{describe_register, describe_unregister};

pub async fn start(hooks: &RunHooks, workflow_id: &str) -> anyhow::Result<()> {
    let (run, outcome) = hooks.start_run(workflow_id).await?;
    println!("{}", run.run_id);
    eprintln!("{}", describe_register(workflow_id, &outcome));
    Ok(())
}

pub async fn finish(hooks: &RunHooks, run_id: &uuid::Uuid, status: RunStatus) -> anyhow::Result<()> {
    let (run, outcome) = hooks.finish_run(run_id, status).await?;
    println!("{} {}", run.run_id, run.status.as_str());
    eprintln!("{}", describe_unregister(&run.workflow_id, &outcome));
    Ok(())
}

pub fn list(hooks: &RunHooks, workflow: Option<&str>) -> anyhow::Result<()> {
    hooks.runs().refresh()?;
    let runs = hooks.runs().list(workflow);
    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }
    println!("{:<36}  {:<20}  {:<9}  STARTED", "RUN", "WORKFLOW", "STATUS");
    for run in runs {
        println!(
            "{:<36}  {:<20}  {:<9}  {}",
            run.run_id,
            run.workflow_id,
            run.status.as_str(),
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}
