use af_domain::config::{Config, LogFormat};
use std::path::PathBuf;

#[test]
fn default_shared_config_lives_under_openclaw_dir() {
    let config = Config::default();
    assert!(config.paths.shared_config.ends_with(".openclaw/openclaw.json"));
}

#[test]
fn default_state_and_workflow_dirs() {
    let config = Config::default();
    assert_eq!(config.paths.state_path, PathBuf::from("./data"));
    assert_eq!(
        config.paths.workflow_dir("bugfix"),
        PathBuf::from("./workflows/bugfix")
    );
}

#[test]
fn explicit_paths_parse() {
    let toml_str = r#"
[paths]
shared_config = "/srv/openclaw/openclaw.json"
workflows_dir = "/srv/antfarm/workflows"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(
        config.paths.shared_config,
        PathBuf::from("/srv/openclaw/openclaw.json")
    );
    assert_eq!(config.paths.state_path, PathBuf::from("./data"));
}

#[test]
fn registrar_defaults_lock_and_restrict_mode() {
    let config = Config::default();
    assert!(config.registrar.advisory_lock);
    assert_eq!(config.registrar.file_mode, 0o600);
}

#[test]
fn registrar_overrides_parse() {
    let toml_str = r#"
[registrar]
advisory_lock = false
file_mode = 0o640
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(!config.registrar.advisory_lock);
    assert_eq!(config.registrar.file_mode, 0o640);
}

#[test]
fn observability_section_parses() {
    let toml_str = r#"
[observability]
log_format = "json"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.observability.log_format, LogFormat::Json);
}
