use std::fmt::Write;

use crate::rating::HeadToHeadStats;
use crate::types::RatingResult;

const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

fn row_color(rating: f64, rank: usize) -> &'static str {
    if rank == 0 {
        GREEN
    } else if rating < 0.0 {
        YELLOW
    } else {
        RESET
    }
}

/// Rating table in rank order. Colouring highlights the leader and negative ratings.
pub fn render_ratings(result: &RatingResult, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rank | Player               |     Elo |  Error | Games | Score% |  Draw%");
    let _ = writeln!(out, "{}", "-".repeat(76));

    for (rank, p) in result.players.iter().enumerate() {
        let (start, end) = if color {
            (row_color(p.rating, rank), RESET)
        } else {
            ("", "")
        };
        let _ = writeln!(
            out,
            "{start}{:>4} | {:<20} | {:7.2} | {:6.2} | {:5} | {:6.2}% | {:6.2}%{end}",
            rank + 1,
            p.name,
            p.rating,
            p.error,
            p.games,
            p.score_pct(),
            p.draw_pct()
        );
    }
    out
}

pub fn render_head_to_head(stats: &HeadToHeadStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Head-to-head: {} vs {}", stats.player_a, stats.player_b);
    let _ = writeln!(
        out,
        "Games: {} (W {} / D {} / L {})",
        stats.games, stats.wins, stats.draws, stats.losses
    );
    let _ = writeln!(
        out,
        "Score: {:.2}%  Draws: {:.2}%",
        stats.score_pct, stats.draw_pct
    );
    let _ = writeln!(
        out,
        "Elo: {:.2} +/- {:.2}  nElo: {:.2} +/- {:.2}",
        stats.elo, stats.elo_error_95, stats.nelo, stats.nelo_error_95
    );
    let _ = writeln!(out, "LOS: {:.2}%", stats.los * 100.0);
    out
}
