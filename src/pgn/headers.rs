use std::borrow::Cow;
use std::mem;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;

use super::moves::MovetextScanner;
use crate::error::ErrorAccumulator;
use crate::types::{Outcome, Record};
use crate::util::estimate_from_time_control;

static TAG_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*([A-Za-z0-9_]+)\s*(.*?)\s*\]$").expect("valid tag line regex")
});

/// Splits a `[Key "Value"]` (or `[Key Value]`) line into key and unescaped value.
/// Returns `None` for anything that is not a well-formed tag line.
pub fn parse_tag_line(line: &str) -> Option<(&str, Cow<'_, str>)> {
    let caps = TAG_LINE_RE.captures(line.trim())?;
    let key = caps.get(1)?.as_str();
    let raw = caps.get(2).map_or("", |m| m.as_str());

    let value = match raw
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) if inner.contains('\\') => Cow::Owned(unescape_tag_value(inner)),
        Some(inner) => Cow::Borrowed(inner),
        None => Cow::Borrowed(raw),
    };

    Some((key, value))
}

fn unescape_tag_value(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Default)]
struct HeaderFields {
    white: String,
    black: String,
    result: String,
    termination: String,
    utc_date: String,
    date: String,
    utc_time: String,
    time: String,
    time_control: String,
}

impl HeaderFields {
    fn opt_take(field: &mut String) -> Option<String> {
        if field.is_empty() {
            None
        } else {
            Some(mem::take(field))
        }
    }

    /// Recognized keys fill their slot once; duplicates and unknown keys are ignored.
    fn set_known_tag(&mut self, key: &str, value: &str) {
        let slot: &mut String = match key {
            "White" => &mut self.white,
            "Black" => &mut self.black,
            "Result" => &mut self.result,
            "Termination" => &mut self.termination,
            "UTCDate" => &mut self.utc_date,
            "Date" => &mut self.date,
            "UTCTime" => &mut self.utc_time,
            "Time" => &mut self.time,
            "TimeControl" => &mut self.time_control,
            _ => return,
        };

        if !slot.is_empty() || value.is_empty() {
            return;
        }

        *slot = value.to_string();
    }
}

/// Accumulates one record's tags and movetext while its lines are scanned.
pub struct RecordBuilder {
    headers: HeaderFields,
    scanner: MovetextScanner,
    has_tags: bool,
    has_body: bool,
    parse_error: ErrorAccumulator,
}

impl RecordBuilder {
    pub fn new(keep_moves: bool) -> Self {
        Self {
            headers: HeaderFields::default(),
            scanner: MovetextScanner::new(keep_moves),
            has_tags: false,
            has_body: false,
            parse_error: ErrorAccumulator::default(),
        }
    }

    pub fn tag(&mut self, key: &str, value: &str) {
        self.has_tags = true;
        self.headers.set_known_tag(key, value);
    }

    pub fn body_line(&mut self, line: &str) {
        self.has_body = true;
        self.scanner.feed_line(line);
    }

    pub fn has_body(&self) -> bool {
        self.has_body
    }

    /// Movetext is inside an unterminated `{` comment.
    pub fn in_comment(&self) -> bool {
        self.scanner.in_comment()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_tags && !self.has_body
    }

    /// Builds the record and resets the builder for the next one.
    pub fn finish(&mut self) -> Record {
        let (ply_count, moves) = self.scanner.finish();

        let date = parse_best_date(
            &self.headers.utc_date,
            &self.headers.date,
            &mut self.parse_error,
        );
        let time = parse_best_time(
            &self.headers.utc_time,
            &self.headers.time,
            &mut self.parse_error,
        );
        let (utc_date, utc_time) = to_utc(date, time);

        let time_control = HeaderFields::opt_take(&mut self.headers.time_control);
        let duration_seconds = time_control
            .as_deref()
            .and_then(estimate_from_time_control);

        let record = Record {
            white: mem::take(&mut self.headers.white),
            black: mem::take(&mut self.headers.black),
            outcome: Outcome::from_tag(&self.headers.result),
            termination: HeaderFields::opt_take(&mut self.headers.termination),
            utc_date,
            utc_time,
            time_control,
            ply_count,
            duration_seconds,
            moves,
            parse_error: self.parse_error.take(),
        };

        self.headers = HeaderFields::default();
        self.has_tags = false;
        self.has_body = false;
        record
    }
}

fn parse_best_date(
    utc_date: &str,
    date: &str,
    parse_error: &mut ErrorAccumulator,
) -> Option<NaiveDate> {
    [(utc_date, "UTCDate"), (date, "UTCDate (from Date)")]
        .into_iter()
        .filter(|(raw, _)| !raw.trim().is_empty())
        .find_map(|(raw, label)| parse_date_field(raw, label, parse_error))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_day_next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };
    first_day_next_month.pred_opt().map(|d| d.day())
}

/// `YYYY.MM.DD` (or `-` separated). Unknown month/day (`??`) default to 1, an
/// unknown year means no date, and a day past the month end is clamped.
fn parse_date_field(raw: &str, label: &str, parse_error: &mut ErrorAccumulator) -> Option<NaiveDate> {
    let s = raw.trim();
    let norm = s.replace('.', "-");
    let parts: Vec<&str> = norm.split('-').collect();
    if parts.len() != 3 {
        parse_error.push(&format!("Conversion error: {label}='{s}'"));
        return None;
    }

    if parts[0].contains('?') {
        return None;
    }

    let field = |part: &str| -> Result<u32, std::num::ParseIntError> {
        if part.contains('?') { Ok(1) } else { part.parse() }
    };

    let parsed = (|| -> Result<(i32, u32, u32), std::num::ParseIntError> {
        Ok((parts[0].parse()?, field(parts[1])?, field(parts[2])?))
    })();
    let (year, month, day) = match parsed {
        Ok(v) => v,
        Err(e) => {
            parse_error.push(&format!("Conversion error: {label}='{s}' ({e})"));
            return None;
        }
    };

    let Some(last_day) = last_day_of_month(year, month) else {
        parse_error.push(&format!(
            "Conversion error: {label}='{s}' (input is out of range)"
        ));
        return None;
    };

    match NaiveDate::from_ymd_opt(year, month, day.clamp(1, last_day)) {
        Some(date) if date.year() > 0 => Some(date),
        _ => {
            parse_error.push(&format!(
                "Conversion error: {label}='{s}' (input is out of range)"
            ));
            None
        }
    }
}

/// Time of day plus its UTC offset in seconds.
type ZonedTime = (NaiveTime, i32);

fn parse_best_time(
    utc_time: &str,
    time: &str,
    parse_error: &mut ErrorAccumulator,
) -> Option<ZonedTime> {
    [(utc_time, "UTCTime"), (time, "UTCTime (from Time)")]
        .into_iter()
        .filter(|(raw, _)| !raw.trim().is_empty())
        .find_map(|(raw, label)| parse_time_field(raw, label, parse_error))
}

/// Accepts `HH:MM:SS`, `HH:MM:SSZ`, `HH:MM:SS+HH:MM` and `HH:MM:SS-HH:MM`.
fn parse_time_field(raw: &str, label: &str, parse_error: &mut ErrorAccumulator) -> Option<ZonedTime> {
    let s = raw.trim();

    let (time_part, offset_seconds) = if let Some(stripped) = s.strip_suffix('Z') {
        (stripped, Some(0))
    } else if let Some((t, off)) = s.split_once('+') {
        (t, parse_tz_offset_seconds(off))
    } else if let Some((t, off)) = s.split_once('-') {
        (t, parse_tz_offset_seconds(off).map(|v| -v))
    } else {
        (s, Some(0))
    };

    let Some(offset_seconds) = offset_seconds else {
        parse_error.push(&format!("Conversion error: {label}='{s}'"));
        return None;
    };

    match NaiveTime::parse_from_str(time_part, "%H:%M:%S") {
        Ok(time) => Some((time, offset_seconds)),
        Err(e) => {
            parse_error.push(&format!("Conversion error: {label}='{s}' ({e})"));
            None
        }
    }
}

fn parse_tz_offset_seconds(s: &str) -> Option<i32> {
    let (hh, mm) = s.trim().split_once(':')?;
    let hh: i32 = hh.parse().ok()?;
    let mm: i32 = mm.parse().ok()?;
    if !(0..=23).contains(&hh) || !(0..=59).contains(&mm) {
        return None;
    }
    Some(hh * 3600 + mm * 60)
}

/// Shifts a zoned time to UTC, carrying a day change into the date when known.
fn to_utc(
    date: Option<NaiveDate>,
    time: Option<ZonedTime>,
) -> (Option<NaiveDate>, Option<NaiveTime>) {
    let Some((time, offset_seconds)) = time else {
        return (date, None);
    };
    let shift = TimeDelta::seconds(i64::from(offset_seconds));

    match date {
        Some(date) => match NaiveDateTime::new(date, time).checked_sub_signed(shift) {
            Some(utc) => (Some(utc.date()), Some(utc.time())),
            None => (Some(date), Some(time.overflowing_sub_signed(shift).0)),
        },
        None => (None, Some(time.overflowing_sub_signed(shift).0)),
    }
}
