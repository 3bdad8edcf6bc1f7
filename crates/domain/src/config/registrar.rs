use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registrar
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the shared configuration document is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Hold an exclusive `fs2` lock on `<shared_config>.lock` for every
    /// read-modify-write cycle, serializing separate antfarm processes.
    #[serde(default = "d_true")]
    pub advisory_lock: bool,
    /// Unix permission bits applied to the rewritten document.
    #[serde(default = "d_file_mode")]
    pub file_mode: u32,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            advisory_lock: true,
            file_mode: d_file_mode(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_file_mode() -> u32 {
    0o600
}
