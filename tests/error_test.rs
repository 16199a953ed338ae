//! Tests for error types

use std::path::PathBuf;

use qtrial::Error;

#[test]
fn test_invalid_config_error() {
    let error = Error::InvalidConfig("period must be at least 1".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("period must be at least 1"));
}

#[test]
fn test_zero_reference_error() {
    let error_str = format!("{}", Error::ZeroReference);
    assert!(error_str.contains("Reference value is exactly zero"));
    assert!(error_str.contains("non-zero reference"));
}

#[test]
fn test_intractable_state_space_error() {
    let error = Error::IntractableStateSpace {
        states: 1 << 24,
        limit: 1 << 20,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("16777216"));
    assert!(error_str.contains("1048576"));
    assert!(error_str.contains("max_enumerable_states"));
}

#[test]
fn test_history_errors() {
    assert_eq!(format!("{}", Error::NoHistory), "No history recorded yet");
    let error = Error::IndexOutOfRange { index: -4, len: 3 };
    assert_eq!(
        format!("{error}"),
        "History index -4 out of range for 3 recorded entries"
    );
}

#[test]
fn test_no_prior_trial_error() {
    let error = Error::NoPriorTrial {
        dir: PathBuf::from("Data/Energy/Q2"),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Data/Energy/Q2"));
    assert!(error_str.contains("explicit trial number"));
}

#[test]
fn test_truncated_trial_error() {
    let error = Error::TruncatedTrial {
        trial: 7,
        rows: 9,
        required: 11,
    };
    assert_eq!(
        format!("{error}"),
        "Trial 7 has 9 rows, analysis needs at least 11"
    );
}

#[test]
fn test_malformed_record_error() {
    let error = Error::MalformedRecord {
        line: 6,
        reason: "expected 6 fields, found 5".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("line 6"));
    assert!(error_str.contains("found 5"));
}

#[test]
fn test_misaligned_histories_error() {
    let error = Error::MisalignedHistories {
        observable: 5,
        metric: 4,
        runtime: 5,
    };
    assert!(format!("{error}").contains("4 metric rows"));
}

#[test]
fn test_non_finite_value_error() {
    let error = Error::NonFiniteValue {
        what: "energy mean at iteration 3".to_string(),
        value: f64::NAN,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Non-finite energy mean at iteration 3: NaN"));
    assert!(error_str.contains("nothing was recorded"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_error_debug() {
    let debug_str = format!("{:?}", Error::NoHistory);
    assert!(debug_str.contains("NoHistory"));
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> qtrial::Result<i32> {
        Err(Error::Sampling("chain diverged".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
