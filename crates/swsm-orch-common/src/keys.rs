//! Composite binding-key parsing.
//!
//! Binding updates identify a set of target objects with a composite key of
//! the form `alias1,alias2:low-high` or `alias1,alias2:index` (a single
//! index means `low == high`). The alias list is comma-joined port names;
//! the range is inclusive on both ends with `low < high`.

use std::ops::RangeInclusive;
use thiserror::Error;

/// Error type for composite-key parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("malformed binding key: {0}")]
    MalformedKey(String),
    #[error("malformed index range: {0}")]
    MalformedIndexRange(String),
}

/// Splits a comma-joined alias list. Empty aliases are rejected.
pub fn parse_name_array(value: &str) -> Result<Vec<String>, KeyParseError> {
    if value.is_empty() {
        return Err(KeyParseError::MalformedKey(value.to_string()));
    }
    let names: Vec<String> = value.split(',').map(str::to_string).collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(KeyParseError::MalformedKey(value.to_string()));
    }
    Ok(names)
}

/// Parses `low-high` (inclusive, `low < high`) or a single index
/// (`low == high`).
pub fn parse_index_range(value: &str) -> Result<RangeInclusive<u32>, KeyParseError> {
    let malformed = || KeyParseError::MalformedIndexRange(value.to_string());

    match value.split_once('-') {
        Some((low, high)) => {
            let low: u32 = low.parse().map_err(|_| malformed())?;
            let high: u32 = high.parse().map_err(|_| malformed())?;
            if low >= high {
                return Err(malformed());
            }
            Ok(low..=high)
        }
        None => {
            let index: u32 = value.parse().map_err(|_| malformed())?;
            Ok(index..=index)
        }
    }
}

/// Parses a full composite binding key into its alias list and index range.
pub fn parse_bind_key(key: &str) -> Result<(Vec<String>, RangeInclusive<u32>), KeyParseError> {
    let (aliases, range) = key
        .split_once(':')
        .ok_or_else(|| KeyParseError::MalformedKey(key.to_string()))?;
    Ok((parse_name_array(aliases)?, parse_index_range(range)?))
}
