pub mod duration;
pub mod size;

pub use duration::{DurationError, estimate_from_time_control, parse_duration};
pub use size::{SizeError, parse_size};
