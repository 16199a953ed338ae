//! Text codec for trial records
//!
//! ```text
//! samples: <int>
//! burn_in: <int>
//! steps: <int>
//! Fidelities & ROE & RT & Mean & Variance & STD Error
//! <fidelity>  <relative_error>  <runtime>  <mean>  <variance>  <std_error>
//! ```
//!
//! Values are rounded to the column precisions on write and printed in
//! shortest round-trip form with a decimal point (`1.0`, `0.125`); values
//! below `1e-4` use exponent notation (`5e-6`). Parsing is schema-checked:
//! header labels must match, and every data row must hold exactly six
//! finite floats. Nothing is skipped silently.

use std::fmt::Write as _;

use super::{TrialRecord, TrialRow};
use crate::config::SamplingConfig;
use crate::{Error, Result};

/// Column header row
pub const COLUMN_HEADER: &str = "Fidelities & ROE & RT & Mean & Variance & STD Error";
/// Label of the sample-count header line
pub const SAMPLES_LABEL: &str = "samples:";
/// Label of the burn-in header line
pub const BURN_IN_LABEL: &str = "burn_in:";
/// Label of the steps header line
pub const STEPS_LABEL: &str = "steps:";
/// Number of columns per data row
pub const COLUMNS: usize = 6;

const SEPARATOR: &str = "  ";

/// Serialize a record to its text form.
#[must_use]
pub fn write_record(record: &TrialRecord) -> String {
    let sampling = record.sampling();
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{SAMPLES_LABEL} {}", sampling.num_samples);
    let _ = writeln!(out, "{BURN_IN_LABEL} {}", sampling.burn_in);
    let _ = writeln!(out, "{STEPS_LABEL} {}", sampling.steps);
    out.push_str(COLUMN_HEADER);
    out.push('\n');

    for row in record.rows() {
        let r = row.rounded();
        for value in [
            r.fidelity,
            r.relative_error,
            r.runtime,
            r.mean,
            r.variance,
            r.std_error,
        ] {
            let _ = write!(out, "{value:?}{SEPARATOR}");
        }
        out.push('\n');
    }
    out
}

/// Parse the text form of trial `trial_id`.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` naming the first line that does not
/// match the schema.
pub fn parse_record(trial_id: u32, text: &str) -> Result<TrialRecord> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));

    let num_samples = parse_labeled(lines.next(), 1, SAMPLES_LABEL)?;
    let burn_in = parse_labeled(lines.next(), 2, BURN_IN_LABEL)?;
    let steps = parse_labeled(lines.next(), 3, STEPS_LABEL)?;

    match lines.next() {
        Some((_, line)) if line.trim_end() == COLUMN_HEADER => {}
        Some((n, line)) => {
            return Err(Error::malformed(
                n,
                format!("expected column header {COLUMN_HEADER:?}, found {line:?}"),
            ))
        }
        None => return Err(Error::malformed(4, "missing column header")),
    }

    let rows = lines
        .map(|(n, line)| parse_row(n, line))
        .collect::<Result<Vec<_>>>()?;

    Ok(TrialRecord::new(
        trial_id,
        SamplingConfig::new(num_samples, burn_in, steps),
        rows,
    ))
}

fn parse_labeled(line: Option<(usize, &str)>, expected_line: usize, label: &str) -> Result<usize> {
    let (n, line) = line.ok_or_else(|| Error::malformed(expected_line, format!("missing {label} line")))?;
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(label) {
        return Err(Error::malformed(n, format!("expected {label:?} label, found {line:?}")));
    }
    let value = tokens
        .next()
        .ok_or_else(|| Error::malformed(n, format!("{label} has no value")))?;
    if tokens.next().is_some() {
        return Err(Error::malformed(n, format!("trailing tokens after {label} value")));
    }
    value
        .parse()
        .map_err(|e| Error::malformed(n, format!("{label} value {value:?} is not an integer: {e}")))
}

fn parse_row(n: usize, line: &str) -> Result<TrialRow> {
    let fields = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| Error::malformed(n, format!("field {token:?} is not a number: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    match fields[..] {
        [fidelity, relative_error, runtime, mean, variance, std_error] => {
            let row = TrialRow {
                fidelity,
                relative_error,
                runtime,
                mean,
                variance,
                std_error,
            };
            match row.non_finite() {
                Some((column, value)) => Err(Error::malformed(
                    n,
                    format!("{column} is not finite: {value}"),
                )),
                None => Ok(row),
            }
        }
        _ => Err(Error::malformed(
            n,
            format!("expected {COLUMNS} fields, found {}", fields.len()),
        )),
    }
}
