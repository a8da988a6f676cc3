use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::types::{Outcome, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFilterError(String);

impl fmt::Display for ResultFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid result filter '{}' (expected 1-0, 0-1, 1/2-1/2 or draw)",
            self.0
        )
    }
}

impl Error for ResultFilterError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFilter {
    WhiteWin,
    BlackWin,
    Draw,
}

impl ResultFilter {
    fn outcome(self) -> Outcome {
        match self {
            Self::WhiteWin => Outcome::WhiteWin,
            Self::BlackWin => Outcome::BlackWin,
            Self::Draw => Outcome::Draw,
        }
    }
}

impl FromStr for ResultFilter {
    type Err = ResultFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1-0" => Ok(Self::WhiteWin),
            "0-1" => Ok(Self::BlackWin),
            "1/2-1/2" => Ok(Self::Draw),
            other if other.eq_ignore_ascii_case("draw") => Ok(Self::Draw),
            other => Err(ResultFilterError(other.to_string())),
        }
    }
}

/// Record inclusion criteria. Every `None` bound is inactive; name and
/// termination filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub min_plies: Option<u32>,
    pub max_plies: Option<u32>,
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,
    pub white_name: Option<String>,
    pub black_name: Option<String>,
    pub either_name: Option<String>,
    pub exclude_name: Option<String>,
    pub result: Option<ResultFilter>,
    pub termination: Option<String>,
    /// Both names present and a decisive or drawn result.
    pub require_complete: bool,
    /// Reject records whose result is unknown.
    pub skip_empty: bool,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FilterConfig {
    pub fn is_active(&self) -> bool {
        self.min_plies.is_some()
            || self.max_plies.is_some()
            || self.min_duration.is_some()
            || self.max_duration.is_some()
            || self.white_name.is_some()
            || self.black_name.is_some()
            || self.either_name.is_some()
            || self.exclude_name.is_some()
            || self.result.is_some()
            || self.termination.is_some()
            || self.require_complete
            || self.skip_empty
    }

    pub fn accepts(&self, record: &Record) -> bool {
        let unknown = record.outcome == Outcome::Unknown;
        if self.require_complete && (record.white.is_empty() || record.black.is_empty() || unknown)
        {
            return false;
        }
        if self.skip_empty && unknown {
            return false;
        }

        if self.min_plies.is_some_and(|min| record.ply_count < min)
            || self.max_plies.is_some_and(|max| record.ply_count > max)
        {
            return false;
        }

        if self.min_duration.is_some() || self.max_duration.is_some() {
            let Some(duration) = record.duration_seconds else {
                return false;
            };
            if self.min_duration.is_some_and(|min| duration < min)
                || self.max_duration.is_some_and(|max| duration > max)
            {
                return false;
            }
        }

        if let Some(name) = &self.white_name
            && !contains_ci(&record.white, name)
        {
            return false;
        }
        if let Some(name) = &self.black_name
            && !contains_ci(&record.black, name)
        {
            return false;
        }
        if let Some(name) = &self.either_name
            && !(contains_ci(&record.white, name) || contains_ci(&record.black, name))
        {
            return false;
        }
        if let Some(name) = &self.exclude_name
            && (contains_ci(&record.white, name) || contains_ci(&record.black, name))
        {
            return false;
        }

        if let Some(result) = self.result
            && record.outcome != result.outcome()
        {
            return false;
        }

        if let Some(termination) = &self.termination {
            match record.termination.as_deref() {
                Some(value) if contains_ci(value, termination) => {}
                _ => return false,
            }
        }

        true
    }
}
