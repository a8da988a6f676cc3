use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::Regex;

use super::reader::CompressionMode;
use crate::log;
use crate::types::ChunkRange;

pub const DEFAULT_CHUNK_BYTES: u64 = 1 << 20;

static RECORD_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[Event[\s"]"#).expect("valid record start regex"));

/// True for a line opening a new record: `[Event` followed by whitespace or a quote.
/// `[EventDate ...]` and the like do not qualify.
pub fn is_record_start(line: &[u8]) -> bool {
    RECORD_START_RE.is_match(line)
}

/// Splits `path` into ranges of roughly `target_bytes`, each ending at a
/// record-start line or at end of file. An unreadable file yields no ranges.
pub fn split_file(path: &Path, target_bytes: u64, compression: CompressionMode) -> Vec<ChunkRange> {
    match try_split_file(path, target_bytes, compression) {
        Ok(chunks) => chunks,
        Err(e) => {
            log::warn(format!("cannot split '{}': {e}", path.display()));
            Vec::new()
        }
    }
}

fn try_split_file(
    path: &Path,
    target_bytes: u64,
    compression: CompressionMode,
) -> io::Result<Vec<ChunkRange>> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let range = |start, end| ChunkRange {
        path: path.to_path_buf(),
        start,
        end,
    };

    if compression.resolve(path) == CompressionMode::Zstd {
        return Ok(vec![range(0, file_size)]);
    }

    let target = target_bytes.max(1);
    let mut reader = BufReader::new(file);
    let mut chunks = Vec::new();
    let mut start = 0u64;

    while start < file_size {
        let probe = start.saturating_add(target);
        let end = if probe >= file_size {
            file_size
        } else {
            next_boundary(&mut reader, probe, file_size)?
        };

        // Never emit an empty range; a boundary at or before `start` means the
        // scan could not advance, so the rest of the file becomes one chunk.
        let end = if end <= start { file_size } else { end };
        chunks.push(range(start, end));
        start = end;
    }

    log::debug(format!(
        "split '{}' ({file_size} bytes) into {} chunks",
        path.display(),
        chunks.len()
    ));
    Ok(chunks)
}

/// Offset of the first record-start line beginning strictly after the line
/// containing byte `probe - 1`, or `file_size` when there is none.
fn next_boundary<R: BufRead + Seek>(reader: &mut R, probe: u64, file_size: u64) -> io::Result<u64> {
    // Starting one byte early makes a marker that begins exactly at `probe`
    // visible: the partial line consumed first is then just its newline.
    let mut pos = probe - 1;
    reader.seek(SeekFrom::Start(pos))?;

    let mut line = Vec::with_capacity(128);
    let read = reader.read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(file_size);
    }
    pos += read as u64;

    loop {
        if pos >= file_size {
            return Ok(file_size);
        }

        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(file_size);
        }
        // Comment state is unknown mid-file, so an `[Event ` line wrapped inside
        // a `{ }` comment would still be taken as a boundary.
        if is_record_start(&line) {
            return Ok(pos);
        }
        pos += read as u64;
    }
}
