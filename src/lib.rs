pub mod error;
pub mod export;
pub mod ingest;
pub mod log;
pub mod pgn;
pub mod rating;
pub mod report;
pub mod types;
pub mod util;

pub use error::{ChunkError, ErrorAccumulator};
pub use ingest::{IngestConfig, IngestData, IngestOutcome, ingest_files};
pub use rating::{Anchor, RatingSolver};
pub use types::{ChunkRange, Outcome, Pairing, PlayerStats, RatingResult, Record};
