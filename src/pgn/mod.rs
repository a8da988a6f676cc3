pub mod filter;
pub mod headers;
pub mod moves;
pub mod reader;
pub mod splitter;

pub use filter::{FilterConfig, ResultFilter, ResultFilterError};
pub use reader::{CompressionMode, ParseOptions, parse_chunk, parse_str};
pub use splitter::{DEFAULT_CHUNK_BYTES, is_record_start, split_file};
