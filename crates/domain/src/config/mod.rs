mod observability;
mod paths;
mod registrar;

pub use observability::*;
pub use paths::*;
pub use registrar::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let required = [
            ("paths.shared_config", &self.paths.shared_config),
            ("paths.state_path", &self.paths.state_path),
            ("paths.workflows_dir", &self.paths.workflows_dir),
        ];
        for (field, path) in required {
            if path.as_os_str().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "path must not be empty".into(),
                });
            }
        }

        // A relative shared config resolves against whatever directory the
        // run engine happens to start in.
        if !self.paths.shared_config.as_os_str().is_empty()
            && self.paths.shared_config.is_relative()
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "paths.shared_config".into(),
                message: "relative path depends on the working directory".into(),
            });
        }

        if self.registrar.file_mode & 0o077 != 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "registrar.file_mode".into(),
                message: format!(
                    "mode {:o} makes the shared config readable by other users",
                    self.registrar.file_mode
                ),
            });
        }

        if !self.registrar.advisory_lock {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "registrar.advisory_lock".into(),
                message: "disabled: concurrent antfarm processes may lose updates".into(),
            });
        }

        errors
    }
}
