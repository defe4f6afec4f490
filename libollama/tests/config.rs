// libollama/tests/config.rs
//
// Integration tests for OllamaConfig persistence and its use by the
// engine and supervisor constructors.

use libollama::{CorrectionEngine, IdentityCorrector, OllamaConfig, ServiceState, Supervisor};
use tempfile::tempdir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("libollama.toml");

    let mut config = OllamaConfig {
        model: "mistral".into(),
        temperature: Some(0.1),
        max_poll_attempts: 3,
        ..OllamaConfig::default()
    };
    config.base_mut().trailing_space = true;
    config.save_toml(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("trailing_space = true"));
    assert!(written.contains("model = \"mistral\""));

    let loaded = OllamaConfig::load_toml(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_base_config_drives_engine() {
    let mut config = OllamaConfig::default();
    config.base_mut().auto_trigger = false;

    let engine = CorrectionEngine::new(Box::new(IdentityCorrector), config.clone().into_base()).unwrap();
    assert!(!engine.config().auto_trigger);
    assert_eq!(engine.config(), config.base());
}

#[test]
fn test_supervisor_from_config_starts_unknown() {
    let supervisor = Supervisor::from_config(&OllamaConfig::default()).unwrap();
    assert_eq!(supervisor.state(), ServiceState::Unknown);
    assert!(!supervisor.owns_process());
}
