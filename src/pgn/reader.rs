use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use zstd::stream::read::Decoder as ZstdDecoder;

use super::headers::{RecordBuilder, parse_tag_line};
use crate::error::ChunkError;
use crate::log;
use crate::types::{ChunkRange, Record};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err("Invalid compression value ''. Supported values: 'zstd' or 'none'.".into());
        }

        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else if normalized.eq_ignore_ascii_case("none") || normalized.eq_ignore_ascii_case("plain")
        {
            Ok(Self::Plain)
        } else {
            Err(format!(
                "Invalid compression value '{normalized}'. Supported values: 'zstd' or 'none'."
            )
            .into())
        }
    }

    /// Compression implied by the file name alone (`.zst` means zstd).
    pub fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }

    /// An explicit run-wide zstd setting wins over the extension.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Zstd => Self::Zstd,
            Self::Plain => Self::for_path(path),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    pub keep_moves: bool,
    pub compression: CompressionMode,
}

/// Parses every record in `chunk`. Only a failure to open, seek or read the
/// byte range is an error; malformed content inside it is absorbed.
pub fn parse_chunk(chunk: &ChunkRange, options: &ParseOptions) -> Result<Vec<Record>, ChunkError> {
    let chunk_error = |source: io::Error| ChunkError {
        path: chunk.path.clone(),
        start: chunk.start,
        end: chunk.end,
        source,
    };

    let mut file = File::open(&chunk.path).map_err(chunk_error)?;
    let records = match options.compression.resolve(&chunk.path) {
        CompressionMode::Plain => {
            file.seek(SeekFrom::Start(chunk.start))
                .map_err(chunk_error)?;
            let input = BufReader::new(file.take(chunk.len()));
            parse_lines(input, options.keep_moves)
        }
        CompressionMode::Zstd => {
            let decoder = ZstdDecoder::new(file).map_err(chunk_error)?;
            parse_lines(BufReader::new(decoder), options.keep_moves)
        }
    }
    .map_err(chunk_error)?;

    log::debug(format!(
        "parsed {} records from '{}' [{}, {})",
        records.len(),
        chunk.path.display(),
        chunk.start,
        chunk.end
    ));
    Ok(records)
}

/// Line scanner shared by file chunks and in-memory input.
pub fn parse_lines<R: BufRead>(mut input: R, keep_moves: bool) -> io::Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut builder = RecordBuilder::new(keep_moves);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim_start();

        if trimmed.is_empty() {
            if builder.has_body() {
                records.push(builder.finish());
            }
            continue;
        }

        if line.starts_with('%') {
            continue;
        }

        if trimmed.starts_with('[') && !builder.in_comment() {
            if let Some((key, value)) = parse_tag_line(trimmed) {
                if builder.has_body() {
                    records.push(builder.finish());
                }
                builder.tag(key, &value);
            }
            continue;
        }

        builder.body_line(line);
    }

    if !builder.is_empty() {
        records.push(builder.finish());
    }
    Ok(records)
}

/// Parses a complete PGN text held in memory.
pub fn parse_str(text: &str, keep_moves: bool) -> Vec<Record> {
    parse_lines(text.as_bytes(), keep_moves).unwrap_or_default()
}
