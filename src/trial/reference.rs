//! Exact reference value from an observables file

use std::path::Path;

use super::round_to;
use crate::{Error, Result};

/// Decimal places the reference value is rounded to
pub const REFERENCE_PRECISION: i32 = 2;

/// Read the reference value from an observables file.
///
/// The value is the second whitespace-delimited token of the second line,
/// rounded to two decimal places.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read and
/// `Error::MalformedRecord` if line two has no numeric second token.
pub fn load_reference_value<P: AsRef<Path>>(path: P) -> Result<f64> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_reference_value(&text)
}

/// Parse the reference value out of observables file contents.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` if line two has no numeric second token.
pub fn parse_reference_value(text: &str) -> Result<f64> {
    let line = text
        .lines()
        .nth(1)
        .ok_or_else(|| Error::malformed(2, "observables file has no second line"))?;
    let token = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::malformed(2, format!("no second token in {line:?}")))?;
    let value: f64 = token
        .parse()
        .map_err(|e| Error::malformed(2, format!("reference {token:?} is not a number: {e}")))?;
    Ok(round_to(value, REFERENCE_PRECISION))
}
