use std::error::Error;
use std::fmt;
use std::num::IntErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    Empty,
    Negative(String),
    InvalidNumber(String),
    InvalidSuffix(char),
    Overflow(String),
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty size"),
            Self::Negative(raw) => write!(f, "size '{raw}' must not be negative"),
            Self::InvalidNumber(raw) => write!(f, "invalid size '{raw}'"),
            Self::InvalidSuffix(c) => {
                write!(f, "invalid size suffix '{c}' (expected k, m or g)")
            }
            Self::Overflow(raw) => write!(f, "size '{raw}' is too large"),
        }
    }
}

impl Error for SizeError {}

/// Parses a byte count with an optional binary suffix: `k` (KiB), `m` (MiB), `g` (GiB).
pub fn parse_size(raw: &str) -> Result<usize, SizeError> {
    let text = raw.trim();
    let Some(last) = text.chars().last() else {
        return Err(SizeError::Empty);
    };

    let (number_part, multiplier) = match last.to_ascii_lowercase() {
        'k' => (&text[..text.len() - 1], 1usize << 10),
        'm' => (&text[..text.len() - 1], 1usize << 20),
        'g' => (&text[..text.len() - 1], 1usize << 30),
        c if c.is_alphabetic() => return Err(SizeError::InvalidSuffix(last)),
        _ => (text, 1usize),
    };

    if number_part.starts_with('-') {
        return Err(SizeError::Negative(text.to_string()));
    }
    if number_part.is_empty() || !number_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeError::InvalidNumber(text.to_string()));
    }

    let number: usize = number_part.parse().map_err(|e: std::num::ParseIntError| {
        match e.kind() {
            IntErrorKind::PosOverflow => SizeError::Overflow(text.to_string()),
            _ => SizeError::InvalidNumber(text.to_string()),
        }
    })?;

    number
        .checked_mul(multiplier)
        .ok_or_else(|| SizeError::Overflow(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_bytes() {
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("4096"), Ok(4096));
    }

    #[test]
    fn test_binary_suffixes() {
        assert_eq!(parse_size("1k"), Ok(1024));
        assert_eq!(parse_size("1K"), Ok(1024));
        assert_eq!(parse_size("2M"), Ok(2_097_152));
        assert_eq!(parse_size("3g"), Ok(3 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_rejects_negative_values() {
        assert!(matches!(parse_size("-1"), Err(SizeError::Negative(_))));
        assert!(matches!(parse_size("-5g"), Err(SizeError::Negative(_))));
    }

    #[test]
    fn test_rejects_unknown_suffix_and_garbage() {
        assert_eq!(parse_size("10t"), Err(SizeError::InvalidSuffix('t')));
        assert!(parse_size("foo").is_err());
        assert!(matches!(parse_size("k"), Err(SizeError::InvalidNumber(_))));
        assert!(matches!(parse_size("1.5m"), Err(SizeError::InvalidNumber(_))));
        assert_eq!(parse_size(""), Err(SizeError::Empty));
    }

    #[test]
    fn test_rejects_overflow_under_multiplier() {
        let text = format!("{}k", usize::MAX);
        assert!(matches!(parse_size(&text), Err(SizeError::Overflow(_))));
    }

    #[test]
    fn test_rejects_overflow_of_number_itself() {
        let text = format!("{}0", usize::MAX);
        assert!(matches!(parse_size(&text), Err(SizeError::Overflow(_))));
    }
}
