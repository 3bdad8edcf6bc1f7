use serde::Serialize;

/// Structured trace events emitted across all Antfarm crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    AgentsRegistered {
        workflow_id: String,
        added: Vec<String>,
        allowlisted: usize,
    },
    AgentsUnregistered {
        workflow_id: String,
        removed: Vec<String>,
    },
    UnregisterSkipped {
        workflow_id: String,
        reason: String,
    },
    LegacyWorkflow {
        workflow_id: String,
        workflow_dir: String,
    },
    RunStarted {
        workflow_id: String,
        run_id: String,
    },
    RunFinished {
        workflow_id: String,
        run_id: String,
        status: String,
    },
    LearningsLoaded {
        repo: String,
        matched: usize,
        selected: Vec<String>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "af_event");
    }
}
