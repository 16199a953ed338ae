//! Configuration loading tests: typed keys, defaults and validation

use qtrial::{Error, MonitorConfig, SamplingConfig, TrialSelection};

fn write_config(json: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitor.json");
    std::fs::write(&path, json).unwrap();
    (dir, path)
}

#[test]
fn test_monitor_config_file_with_unknown_key_is_rejected() {
    let (_dir, path) = write_config(r#"{"qubits": 2, "max_time": 60.0}"#);
    let err = MonitorConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    assert!(err.to_string().contains("max_time"));
}

#[test]
fn test_monitor_config_file_with_unknown_sampling_key_is_rejected() {
    let (_dir, path) = write_config(
        r#"{"qubits": 2, "sampling": {"num_samples": 100, "burn_in": 10, "steps": 10, "temperature": 1.0}}"#,
    );
    let err = MonitorConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    assert!(err.to_string().contains("temperature"));
}

#[test]
fn test_monitor_config_file_is_validated() {
    let (_dir, path) = write_config(r#"{"qubits": 2, "period": 0}"#);
    let err = MonitorConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_monitor_config_file_full() {
    let (_dir, path) = write_config(
        r#"{
            "qubits": 4,
            "sampling": {"num_samples": 5000, "burn_in": 500, "steps": 50},
            "period": 2,
            "max_time_secs": 120.5,
            "trial": "next",
            "verbose": true,
            "max_enumerable_states": 4096
        }"#,
    );
    let config = MonitorConfig::from_json_file(&path).unwrap();
    assert_eq!(config.qubits, 4);
    assert_eq!(config.sampling, SamplingConfig::new(5000, 500, 50));
    assert_eq!(config.period, 2);
    assert_eq!(config.trial, TrialSelection::Next);
    assert!(config.verbose);
    assert_eq!(config.max_enumerable_states, 4096);
}
