pub mod agents;
pub mod config;
pub mod learnings;
pub mod policy;
pub mod runs;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Antfarm: lazy registration of workflow agents with the platform.
#[derive(Debug, Parser)]
#[command(name = "antfarm", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register or unregister a workflow's agents directly.
    #[command(subcommand)]
    Agents(AgentsCommand),
    /// Run lifecycle hooks (record the run and update registration).
    #[command(subcommand)]
    Run(RunCommand),
    /// Inspect recorded runs.
    #[command(subcommand)]
    Runs(RunsCommand),
    /// Print the tool policy for a role, or for the role inferred from an agent id.
    Policy {
        /// Role name (e.g. "verification") or agent id (e.g. "bugfix/verifier").
        role: String,
    },
    /// Print relevant learnings from a repository for a task.
    Learnings {
        /// Repository root containing `docs/learnings/`.
        #[arg(long)]
        repo: PathBuf,
        /// Task description to match against.
        #[arg(long)]
        task: String,
        /// Tags to boost (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum AgentsCommand {
    /// Add the workflow's saved agents to the shared config.
    Register {
        workflow_id: String,
        /// Workflow directory (defaults to `<workflows_dir>/<workflow_id>`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Remove the workflow's agents if no run of it is active.
    Unregister { workflow_id: String },
    /// List agent ids currently in the shared config.
    List {
        /// Only agents owned by this workflow.
        #[arg(long)]
        workflow: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RunCommand {
    /// Record a new run and register its workflow's agents.
    Start { workflow_id: String },
    /// Mark a run terminal and unregister its workflow if idle.
    Finish {
        run_id: uuid::Uuid,
        #[arg(long, value_enum, default_value_t = FinishStatus::Completed)]
        status: FinishStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FinishStatus {
    Completed,
    Failed,
}

impl From<FinishStatus> for af_lifecycle::RunStatus {
    fn from(s: FinishStatus) -> Self {
        match s {
            FinishStatus::Completed => Self::Completed,
            FinishStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum RunsCommand {
    /// List runs, newest first.
    List {
        #[arg(long)]
        workflow: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `AF_CONFIG` (or
/// `antfarm.toml` by default). A missing file yields the defaults.
pub fn load_config() -> anyhow::Result<(af_domain::config::Config, String)> {
    let config_path = std::env::var("AF_CONFIG").unwrap_or_else(|_| "antfarm.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<af_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(af_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_finish_with_status() {
        let id = uuid::Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["antfarm", "run", "finish", &id, "--status", "failed"]).unwrap();
        match cli.command {
            Command::Run(RunCommand::Finish { status, .. }) => {
                assert_eq!(status, FinishStatus::Failed)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn finish_rejects_bad_run_id() {
        assert!(Cli::try_parse_from(["antfarm", "run", "finish", "not-a-uuid"]).is_err());
    }

    #[test]
    fn learnings_collects_repeated_tags() {
        let cli = Cli::try_parse_from([
            "antfarm", "learnings", "--repo", ".", "--task", "fix auth", "--tag", "auth", "--tag", "api",
        ])
        .unwrap();
        match cli.command {
            Command::Learnings { tags, .. } => assert_eq!(tags, vec!["auth", "api"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert!(config.registrar.advisory_lock);
    }

    #[test]
    fn bad_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("antfarm.toml");
        std::fs::write(&path, "[registrar]\nfile_mode = \"rw\"\n").unwrap();
        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }
}
