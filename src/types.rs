use chrono::{NaiveDate, NaiveTime};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    WhiteWin,
    BlackWin,
    Draw,
    #[default]
    Unknown,
}

impl Outcome {
    /// Maps a `Result` tag value. Only the three literal encodings are decisive.
    pub fn from_tag(value: &str) -> Self {
        match value {
            "1-0" => Self::WhiteWin,
            "0-1" => Self::BlackWin,
            "1/2-1/2" => Self::Draw,
            _ => Self::Unknown,
        }
    }

    /// Score from White's point of view, `None` for unknown results.
    pub fn white_score(self) -> Option<f64> {
        match self {
            Self::WhiteWin => Some(1.0),
            Self::BlackWin => Some(0.0),
            Self::Draw => Some(0.5),
            Self::Unknown => None,
        }
    }
}

/// One parsed game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub white: String,
    pub black: String,
    pub outcome: Outcome,
    pub termination: Option<String>,

    pub utc_date: Option<NaiveDate>,
    pub utc_time: Option<NaiveTime>,

    pub time_control: Option<String>,
    pub ply_count: u32,
    pub duration_seconds: Option<f64>,

    /// Present only when the run keeps move text.
    pub moves: Option<Vec<String>>,

    /// NULL-equivalent for clean records, otherwise "; "-joined conversion notes.
    pub parse_error: Option<String>,
}

/// Compact game result: indices into the shared name table plus White's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pairing {
    pub white: usize,
    pub black: usize,
    pub score: f64,
}

impl Pairing {
    pub fn new(white: usize, black: usize, score: f64) -> Self {
        Self {
            white,
            black,
            score,
        }
    }
}

/// Byte range `[start, end)` of one input file, aligned to record starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRange {
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub name: String,
    pub rating: f64,
    pub error: f64,
    pub games: u32,
    pub score_sum: f64,
    pub opponent_rating_sum: f64,
    pub draws: u32,
}

impl PlayerStats {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn score_pct(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.score_sum / self.games as f64 * 100.0
        }
    }

    pub fn draw_pct(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.draws as f64 / self.games as f64 * 100.0
        }
    }

    pub fn average_opponent(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.opponent_rating_sum / self.games as f64
        }
    }
}

/// Players sorted by rating (descending) and the LOS matrix in the same order.
/// `los[i][j]` is the probability that row `i` is stronger than column `j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingResult {
    pub players: Vec<PlayerStats>,
    pub los: Vec<Vec<f64>>,
}

impl RatingResult {
    pub fn player(&self, name: &str) -> Option<&PlayerStats> {
        self.players.iter().find(|p| p.name == name)
    }
}
