pub mod head_to_head;
pub mod solver;

pub use head_to_head::{HeadToHeadError, HeadToHeadStats};
pub use solver::{Anchor, RatingSolver, build_pairings};
