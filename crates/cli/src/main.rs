use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use af_cli::bootstrap::build_hooks;
use af_cli::cli::{self, AgentsCommand, Cli, Command, ConfigCommand, RunCommand, RunsCommand};
use af_domain::config::{LogFormat, ObservabilityConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = cli::load_config()?;

    match cli.command {
        Command::Config(ConfigCommand::Validate) => {
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(&config),
        Command::Policy { role } => cli::policy::show(&role),
        Command::Learnings { repo, task, tags } => {
            init_tracing(&config.observability);
            cli::learnings::show(&repo, &task, &tags)
        }
        Command::Agents(cmd) => {
            init_tracing(&config.observability);
            let hooks = build_hooks(&config)?;
            match cmd {
                AgentsCommand::Register { workflow_id, dir } => {
                    cli::agents::register(&hooks, &workflow_id, dir)
                        .await
                        .with_context(|| format!("registering agents of {workflow_id}"))
                }
                AgentsCommand::Unregister { workflow_id } => {
                    cli::agents::unregister(&hooks, &workflow_id)
                        .await
                        .with_context(|| format!("unregistering agents of {workflow_id}"))
                }
                AgentsCommand::List { workflow } => {
                    cli::agents::list(&hooks, workflow.as_deref()).await
                }
            }
        }
        Command::Run(cmd) => {
            init_tracing(&config.observability);
            let hooks = build_hooks(&config)?;
            match cmd {
                RunCommand::Start { workflow_id } => cli::runs::start(&hooks, &workflow_id)
                    .await
                    .with_context(|| format!("starting a run of {workflow_id}")),
                RunCommand::Finish { run_id, status } => {
                    cli::runs::finish(&hooks, &run_id, status.into())
                        .await
                        .with_context(|| format!("finishing run {run_id}"))
                }
            }
        }
        Command::Runs(RunsCommand::List { workflow }) => {
            init_tracing(&config.observability);
            let hooks = build_hooks(&config)?;
            cli::runs::list(&hooks, workflow.as_deref())
        }
    }
}

/// Initialize tracing on stderr so command output on stdout stays clean.
///
/// `RUST_LOG` overrides the configured default filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.default_filter));

    match obs.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
