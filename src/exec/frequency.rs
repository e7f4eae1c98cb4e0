//! Compact duration strings for monitor frequencies.
//!
//! Grammar: one or more digits followed by exactly one unit character from
//! `{s, m, h, d}`. Nothing else is accepted; a malformed frequency indicates
//! a bad definition document and is fatal at load time.

use std::time::Duration;

use crate::error::FrequencyError;

/// Parses a frequency string such as `"30s"`, `"5m"`, `"2h"`, or `"1d"`.
pub fn parse_frequency(text: &str) -> Result<Duration, FrequencyError> {
    let err = || FrequencyError {
        value: text.to_owned(),
    };

    if text.len() < 2 || !text.is_ascii() {
        return Err(err());
    }
    let (digits, unit) = text.split_at(text.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let count: u64 = digits.parse().map_err(|_| err())?;
    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => return Err(err()),
    };
    count
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(err)
}
