use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    Empty,
    InvalidNumber(String),
    InvalidSuffix(char),
    Overflow(String),
}

impl fmt::Display for DurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty duration"),
            Self::InvalidNumber(raw) => write!(f, "invalid duration '{raw}'"),
            Self::InvalidSuffix(c) => {
                write!(f, "invalid duration unit '{c}' (expected s, m or h)")
            }
            Self::Overflow(raw) => write!(f, "duration '{raw}' is out of range"),
        }
    }
}

impl Error for DurationError {}

/// Parses `"300"`, `"5m"`, `"1.5h"` or a time-control base like `"300+2"` into
/// seconds. Anything after the leading number and optional unit is ignored, so
/// the increment of a `base+increment` string never contributes.
pub fn parse_duration(raw: &str) -> Result<f64, DurationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DurationError::Empty);
    }

    let numeric_len = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (numeric, rest) = value.split_at(numeric_len);
    if numeric.is_empty() {
        return Err(DurationError::InvalidNumber(value.to_string()));
    }

    let multiplier = match rest.chars().next() {
        Some(c) if c.is_alphabetic() => match c.to_ascii_lowercase() {
            's' => 1.0,
            'm' => 60.0,
            'h' => 3600.0,
            _ => return Err(DurationError::InvalidSuffix(c)),
        },
        _ => 1.0,
    };

    let number: f64 = numeric
        .parse()
        .map_err(|_| DurationError::InvalidNumber(value.to_string()))?;
    let seconds = number * multiplier;
    if !seconds.is_finite() {
        return Err(DurationError::Overflow(value.to_string()));
    }
    Ok(seconds)
}

/// Best-effort duration of a game from its `TimeControl` tag.
pub fn estimate_from_time_control(time_control: &str) -> Option<f64> {
    parse_duration(time_control).ok()
}
