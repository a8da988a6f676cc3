use std::error::Error;
use std::f64::consts::LN_10;
use std::fmt;

use crate::types::Pairing;

/// Two-sided 95% normal quantile.
const Z95: f64 = 1.959963984540054;
const SCORE_EPS: f64 = 1e-12;
const MIN_VARIANCE: f64 = 1e-30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadToHeadError {
    /// The requested indices are equal or outside the name table.
    InvalidSelection { a: usize, b: usize, players: usize },
    /// A pairing involves someone other than the two selected players.
    ForeignPairing { white: usize, black: usize },
}

impl fmt::Display for HeadToHeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelection { a, b, players } => write!(
                f,
                "head-to-head needs two distinct players below {players}, got {a} and {b}"
            ),
            Self::ForeignPairing { white, black } => write!(
                f,
                "head-to-head not applicable: dataset contains pairing {white} vs {black} outside the selected pair"
            ),
        }
    }
}

impl Error for HeadToHeadError {}

/// Score, Elo and normalized Elo of player A against player B, with 95% error bars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadToHeadStats {
    pub player_a: String,
    pub player_b: String,
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub score: f64,
    pub score_pct: f64,
    pub draw_pct: f64,
    pub elo: f64,
    pub elo_error_95: f64,
    pub nelo: f64,
    pub nelo_error_95: f64,
    /// Probability in `[0, 1]` that A is the stronger player.
    pub los: f64,
}

fn score_to_elo(score: f64) -> f64 {
    let p = score.clamp(SCORE_EPS, 1.0 - SCORE_EPS);
    -400.0 * (1.0 / p - 1.0).log10()
}

fn score_to_nelo(score: f64, variance: f64) -> f64 {
    (score - 0.5) / variance.max(MIN_VARIANCE).sqrt() * (800.0 / LN_10)
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

pub fn compute(
    pairings: &[Pairing],
    names: &[String],
    a: usize,
    b: usize,
) -> Result<HeadToHeadStats, HeadToHeadError> {
    if a == b || a >= names.len() || b >= names.len() {
        return Err(HeadToHeadError::InvalidSelection {
            a,
            b,
            players: names.len(),
        });
    }

    let mut out = HeadToHeadStats {
        player_a: names[a].clone(),
        player_b: names[b].clone(),
        ..HeadToHeadStats::default()
    };

    for p in pairings {
        let a_score = if p.white == a && p.black == b {
            p.score
        } else if p.white == b && p.black == a {
            1.0 - p.score
        } else {
            return Err(HeadToHeadError::ForeignPairing {
                white: p.white,
                black: p.black,
            });
        };

        out.games += 1;
        if a_score == 1.0 {
            out.wins += 1;
        } else if a_score == 0.0 {
            out.losses += 1;
        } else {
            out.draws += 1;
        }
    }

    if out.games == 0 {
        return Ok(out);
    }

    let games = f64::from(out.games);
    let score = (f64::from(out.wins) + 0.5 * f64::from(out.draws)) / games;
    out.score = score;
    out.score_pct = score * 100.0;
    out.draw_pct = f64::from(out.draws) / games * 100.0;

    let w = f64::from(out.wins) / games;
    let d = f64::from(out.draws) / games;
    let l = f64::from(out.losses) / games;
    let variance = w * (1.0 - score).powi(2) + d * (0.5 - score).powi(2) + l * score.powi(2);
    let variance_per_game = variance / games;

    let half_width = Z95 * variance_per_game.sqrt();
    let upper = score + half_width;
    let lower = score - half_width;

    out.elo = score_to_elo(score);
    out.elo_error_95 = (score_to_elo(upper) - score_to_elo(lower)) / 2.0;
    out.nelo = score_to_nelo(score, variance);
    out.nelo_error_95 = (score_to_nelo(upper, variance) - score_to_nelo(lower, variance)) / 2.0;

    out.los = if variance_per_game <= 0.0 {
        if score > 0.5 {
            1.0
        } else if score < 0.5 {
            0.0
        } else {
            0.5
        }
    } else {
        (1.0 - erf(-(score - 0.5) / (2.0 * variance_per_game).sqrt())) / 2.0
    };

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    fn games(wins: usize, draws: usize, losses: usize) -> Vec<Pairing> {
        let mut pairings = Vec::new();
        for i in 0..wins {
            // Alternate colours; A is index 0.
            pairings.push(if i % 2 == 0 {
                Pairing::new(0, 1, 1.0)
            } else {
                Pairing::new(1, 0, 0.0)
            });
        }
        pairings.extend((0..draws).map(|_| Pairing::new(0, 1, 0.5)));
        pairings.extend((0..losses).map(|_| Pairing::new(1, 0, 1.0)));
        pairings
    }

    #[test]
    fn test_wdl_counts_from_a_perspective() {
        let stats = compute(&games(5, 3, 2), &names(), 0, 1).unwrap();
        assert_eq!((stats.wins, stats.draws, stats.losses), (5, 3, 2));
        assert_eq!(stats.games, 10);
        assert!((stats.score - 0.65).abs() < 1e-12);
        assert!((stats.score_pct - 65.0).abs() < 1e-9);
        assert!((stats.draw_pct - 30.0).abs() < 1e-9);
        assert_eq!(stats.player_a, "A");
        assert_eq!(stats.player_b, "B");
    }

    #[test]
    fn test_swapped_selection_mirrors_result() {
        let ab = compute(&games(5, 3, 2), &names(), 0, 1).unwrap();
        let ba = compute(&games(5, 3, 2), &names(), 1, 0).unwrap();
        assert_eq!((ba.wins, ba.losses), (2, 5));
        assert!((ab.elo + ba.elo).abs() < 1e-9);
        assert!((ab.los + ba.los - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_elo_and_variance_figures() {
        let stats = compute(&games(5, 3, 2), &names(), 0, 1).unwrap();
        let expected_elo = -400.0 * (1.0f64 / 0.65 - 1.0).log10();
        assert!((stats.elo - expected_elo).abs() < 1e-9);

        let variance: f64 = 0.5 * 0.35f64.powi(2) + 0.3 * 0.15f64.powi(2) + 0.2 * 0.65f64.powi(2);
        let expected_nelo = 0.15 / variance.sqrt() * 800.0 / LN_10;
        assert!((stats.nelo - expected_nelo).abs() < 1e-9);
        assert!(stats.elo_error_95 > 0.0);
        assert!(stats.nelo_error_95 > 0.0);
        assert!(stats.los > 0.5 && stats.los < 1.0);
    }

    #[test]
    fn test_even_match_has_half_los() {
        let stats = compute(&games(3, 4, 3), &names(), 0, 1).unwrap();
        assert!(stats.elo.abs() < 1e-9);
        assert!((stats.los - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_zero_variance_los_branches() {
        assert_eq!(compute(&games(4, 0, 0), &names(), 0, 1).unwrap().los, 1.0);
        assert_eq!(compute(&games(0, 0, 4), &names(), 0, 1).unwrap().los, 0.0);
        assert_eq!(compute(&games(0, 4, 0), &names(), 0, 1).unwrap().los, 0.5);
    }

    #[test]
    fn test_perfect_score_elo_is_finite() {
        let stats = compute(&games(6, 0, 0), &names(), 0, 1).unwrap();
        assert!(stats.elo.is_finite());
        assert!(stats.elo > 0.0);
    }

    #[test]
    fn test_third_player_is_rejected() {
        let mut pairings = games(2, 1, 1);
        pairings.push(Pairing::new(0, 2, 1.0));
        assert_eq!(
            compute(&pairings, &names(), 0, 1),
            Err(HeadToHeadError::ForeignPairing { white: 0, black: 2 })
        );
    }

    #[test]
    fn test_invalid_selection() {
        assert!(matches!(
            compute(&[], &names(), 1, 1),
            Err(HeadToHeadError::InvalidSelection { .. })
        ));
        assert!(matches!(
            compute(&[], &names(), 0, 3),
            Err(HeadToHeadError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_no_games_gives_default_figures() {
        let stats = compute(&[], &names(), 0, 1).unwrap();
        assert_eq!(stats.games, 0);
        assert_eq!(stats.los, 0.0);
        assert_eq!(stats.player_a, "A");
    }

    #[test]
    fn test_erf_reference_values() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_792_9).abs() < 2e-7);
        assert!((erf(-1.0) + 0.842_700_792_9).abs() < 2e-7);
        assert!((erf(3.0) - 0.999_977_909_5).abs() < 2e-7);
    }
}
