//! Lazy registration of workflow agents in the shared OpenClaw config.
//!
//! A workflow's agents are written into `openclaw.json` only while at least
//! one run of that workflow is active, and removed again once the workflow
//! goes idle. Install time persists the agent list next to the workflow
//! (`agent-configs.json`); the two lifecycle hooks read it back.
//!
//! All writes to the shared document go through [`GlobalConfigRegistrar`],
//! which serializes every read-modify-write cycle.

pub mod allowlist;
pub mod hooks;
pub mod orchestrator;
pub mod registrar;
pub mod runs;
pub mod saved_configs;
pub mod shared_config;

pub use hooks::RunHooks;
pub use orchestrator::LifecycleOrchestrator;
pub use registrar::{GlobalConfigRegistrar, RegisterOutcome, UnregisterOutcome};
pub use runs::{ActiveRunTracker, RunStatus, WorkflowRun, WorkflowRunStore};
pub use saved_configs::{load_agent_configs, save_agent_configs, SavedAgentConfig};
pub use shared_config::{AgentListEntry, GlobalAgentEntry, SharedConfig};
