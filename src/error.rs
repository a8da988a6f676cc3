use std::fmt;
use std::io;
use std::path::PathBuf;

/// Collects per-record conversion notes without aborting the record.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// A byte range that could not be read at all.
#[derive(Debug)]
pub struct ChunkError {
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
    pub source: io::Error,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to read '{}' (offsets {}-{}): {}",
            self.path.display(),
            self.start,
            self.end,
            self.source
        )
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("Conversion error: UTCDate='2024.13.01'");

        assert_eq!(
            accumulator.take().as_deref(),
            Some("Conversion error: UTCDate='2024.13.01'")
        );
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("date");
        accumulator.push("time");

        assert_eq!(accumulator.take().as_deref(), Some("date; time"));
        assert!(accumulator.is_empty());
    }

    #[test]
    fn test_chunk_error_display_names_file_and_range() {
        let err = ChunkError {
            path: PathBuf::from("games.pgn"),
            start: 10,
            end: 20,
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let text = err.to_string();
        assert!(text.contains("games.pgn"));
        assert!(text.contains("10-20"));
        assert!(text.contains("gone"));
    }
}
