use std::f64::consts::LN_10;

use crate::ingest::NameTable;
use crate::log;
use crate::types::{Pairing, PlayerStats, RatingResult, Record};

pub const DEFAULT_ITERATIONS: usize = 50;

/// 400 points per decade of odds.
const K_SCALE: f64 = 400.0;
const LOS_SCALE: f64 = K_SCALE / 2.0;
const HESSIAN_REG: f64 = 1e-6;
const DENOM_REG: f64 = 1e-9;
const ERROR_SCALE: f64 = 40.0;
const MIN_VARIANCE: f64 = 1e-6;

/// Entity whose rating is held fixed during the solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub rating: f64,
}

impl Anchor {
    pub fn new(name: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            rating,
        }
    }
}

/// Expected score of the side rated `diff` points above its opponent.
pub fn expected_score(diff: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-diff / K_SCALE))
}

/// Likelihood of superiority for a rating gap of `diff`.
pub fn likelihood_of_superiority(diff: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-diff / LOS_SCALE))
}

/// Builds the pairing graph and first-seen name table from records.
/// Records with an unknown outcome contribute neither a pairing nor names.
pub fn build_pairings(records: &[Record]) -> (Vec<Pairing>, Vec<String>) {
    let mut names = NameTable::default();
    let pairings = records
        .iter()
        .filter_map(|record| {
            let score = record.outcome.white_score()?;
            let white = names.intern(&record.white);
            let black = names.intern(&record.black);
            Some(Pairing::new(white, black, score))
        })
        .collect();
    (pairings, names.into_names())
}

/// Fixed-iteration diagonal Newton solver for the logistic pairwise model.
#[derive(Debug, Clone, Copy)]
pub struct RatingSolver {
    iterations: usize,
}

impl Default for RatingSolver {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl RatingSolver {
    pub fn with_iterations(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Records with an unknown outcome are skipped, not scored as draws; a
    /// player seen only in such records gets no rating.
    pub fn solve_records(&self, records: &[Record], anchor: Option<&Anchor>) -> RatingResult {
        let (pairings, names) = build_pairings(records);
        self.solve(&pairings, &names, anchor)
    }

    /// Rates every name in `names`. Pairings referencing an index outside the
    /// table are ignored. An anchor whose name is absent has no effect.
    pub fn solve(
        &self,
        pairings: &[Pairing],
        names: &[String],
        anchor: Option<&Anchor>,
    ) -> RatingResult {
        let n = names.len();
        let valid: Vec<Pairing> = pairings
            .iter()
            .filter(|p| p.white < n && p.black < n)
            .copied()
            .collect();
        if valid.len() != pairings.len() {
            log::warn(format!(
                "ignoring {} pairings with out-of-range player indices",
                pairings.len() - valid.len()
            ));
        }

        let mut players: Vec<PlayerStats> = names.iter().map(PlayerStats::new).collect();
        accumulate_game_stats(&valid, &mut players);

        if n <= 1 {
            return RatingResult {
                players,
                los: vec![vec![1.0; n]; n],
            };
        }

        let anchor = anchor.and_then(|a| {
            let idx = names.iter().position(|name| *name == a.name)?;
            Some((idx, a.rating))
        });

        let ratings = self.fit(&valid, n, anchor);
        let variance = information(&valid, &ratings);

        let mut opponent_rating_sum = vec![0.0; n];
        for p in &valid {
            opponent_rating_sum[p.white] += ratings[p.black];
            opponent_rating_sum[p.black] += ratings[p.white];
        }

        for (i, player) in players.iter_mut().enumerate() {
            player.rating = ratings[i];
            player.error = (1.0 / variance[i].max(MIN_VARIANCE)).sqrt() * ERROR_SCALE;
            player.opponent_rating_sum = opponent_rating_sum[i];
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| ratings[b].total_cmp(&ratings[a]));

        let los = order
            .iter()
            .map(|&i| {
                order
                    .iter()
                    .map(|&j| likelihood_of_superiority(ratings[i] - ratings[j]))
                    .collect()
            })
            .collect();

        let mut slots: Vec<Option<PlayerStats>> = players.into_iter().map(Some).collect();
        let players = order.iter().filter_map(|&i| slots[i].take()).collect();

        RatingResult { players, los }
    }

    fn fit(&self, pairings: &[Pairing], n: usize, anchor: Option<(usize, f64)>) -> Vec<f64> {
        let mut ratings = vec![0.0; n];
        if let Some((idx, rating)) = anchor {
            ratings[idx] = rating;
        }

        let mut gradient = vec![0.0; n];
        let mut hessian = vec![0.0; n];
        for _ in 0..self.iterations {
            gradient.fill(0.0);
            hessian.fill(HESSIAN_REG);

            for p in pairings {
                let expected = expected_score(ratings[p.white] - ratings[p.black]);
                let residual = p.score - expected;
                let curvature = expected * (1.0 - expected);
                gradient[p.white] += residual;
                gradient[p.black] -= residual;
                hessian[p.white] += curvature;
                hessian[p.black] += curvature;
            }

            for i in 0..n {
                if anchor.is_some_and(|(idx, _)| idx == i) {
                    continue;
                }
                ratings[i] += gradient[i] / (hessian[i] + DENOM_REG) * K_SCALE * (LN_10 / K_SCALE);
            }
        }
        ratings
    }
}

fn accumulate_game_stats(pairings: &[Pairing], players: &mut [PlayerStats]) {
    for p in pairings {
        players[p.white].games += 1;
        players[p.black].games += 1;
        players[p.white].score_sum += p.score;
        players[p.black].score_sum += 1.0 - p.score;
        if p.score == 0.5 {
            players[p.white].draws += 1;
            players[p.black].draws += 1;
        }
    }
}

/// Per-entity Fisher information at the given ratings.
fn information(pairings: &[Pairing], ratings: &[f64]) -> Vec<f64> {
    let mut variance = vec![0.0; ratings.len()];
    for p in pairings {
        let expected = expected_score(ratings[p.white] - ratings[p.black]);
        let curvature = expected * (1.0 - expected);
        variance[p.white] += curvature;
        variance[p.black] += curvature;
    }
    variance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn rating_of(result: &RatingResult, name: &str) -> f64 {
        result.player(name).unwrap().rating
    }

    fn record(white: &str, black: &str, outcome: Outcome) -> Record {
        Record {
            white: white.to_string(),
            black: black.to_string(),
            outcome,
            ..Record::default()
        }
    }

    /// A beats B and C, B beats C, with a sprinkling of draws.
    fn chain() -> Vec<Pairing> {
        let mut pairings = Vec::new();
        for _ in 0..6 {
            pairings.push(Pairing::new(0, 1, 1.0));
            pairings.push(Pairing::new(1, 2, 1.0));
            pairings.push(Pairing::new(2, 0, 0.0));
        }
        pairings.push(Pairing::new(0, 1, 0.5));
        pairings.push(Pairing::new(2, 1, 0.5));
        pairings
    }

    #[test]
    fn test_two_players_dominance() {
        let pairings: Vec<Pairing> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Pairing::new(0, 1, 1.0)
                } else {
                    Pairing::new(1, 0, 0.0)
                }
            })
            .collect();
        let result = RatingSolver::default().solve(&pairings, &names(&["A", "B"]), None);

        assert_eq!(result.players[0].name, "A");
        assert_eq!(result.players[1].name, "B");
        assert!(rating_of(&result, "A") > rating_of(&result, "B"));
        assert!(result.los[0][1] > 0.5);
        assert!(result.los[1][0] < 0.5);
        assert_eq!(result.players[0].games, 10);
        assert_eq!(result.players[0].score_pct(), 100.0);
    }

    #[test]
    fn test_transitive_chain_orders_players() {
        let result = RatingSolver::default().solve(&chain(), &names(&["A", "B", "C"]), None);
        let order: Vec<&str> = result.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, ["A", "B", "C"]);
        assert!(result.players[0].rating > result.players[1].rating);
        assert!(result.players[1].rating > result.players[2].rating);
        for i in 0..3 {
            for j in (i + 1)..3 {
                assert!(result.los[i][j] > 0.5);
                assert!(result.los[j][i] < 0.5);
            }
        }
    }

    #[test]
    fn test_los_matrix_follows_sorted_order() {
        // Names listed weakest first so the output must be permuted.
        let pairings: Vec<Pairing> = chain()
            .into_iter()
            .map(|p| Pairing::new(2 - p.white, 2 - p.black, p.score))
            .collect();
        let result = RatingSolver::default().solve(&pairings, &names(&["C", "B", "A"]), None);
        assert_eq!(result.players[0].name, "A");
        assert_eq!(result.players[2].name, "C");
        let expected = likelihood_of_superiority(result.players[0].rating - result.players[2].rating);
        assert!((result.los[0][2] - expected).abs() < 1e-12);
        assert!((result.los[0][2] + result.los[2][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairing_order_invariance() {
        let forward = chain();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut interleaved: Vec<Pairing> = forward.iter().step_by(2).copied().collect();
        interleaved.extend(forward.iter().skip(1).step_by(2).copied());

        let players = names(&["A", "B", "C"]);
        let solver = RatingSolver::default();
        let base = solver.solve(&forward, &players, None);
        for permuted in [reversed, interleaved] {
            let other = solver.solve(&permuted, &players, None);
            for name in ["A", "B", "C"] {
                assert!((rating_of(&base, name) - rating_of(&other, name)).abs() < 1e-9);
                let (a, b) = (base.player(name).unwrap(), other.player(name).unwrap());
                assert!((a.error - b.error).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_anchor_is_exact_and_keeps_ranking() {
        let players = names(&["A", "B", "C"]);
        let solver = RatingSolver::default();
        let free = solver.solve(&chain(), &players, None);
        let anchored = solver.solve(&chain(), &players, Some(&Anchor::new("B", 1500.0)));

        assert_eq!(rating_of(&anchored, "B"), 1500.0);
        assert!(rating_of(&anchored, "A") > rating_of(&anchored, "C"));
        assert!(rating_of(&free, "A") > rating_of(&free, "C"));
    }

    #[test]
    fn test_anchor_at_zero_preserves_full_order() {
        let players = names(&["A", "B", "C"]);
        let solver = RatingSolver::default();
        let free = solver.solve(&chain(), &players, None);
        let anchored = solver.solve(&chain(), &players, Some(&Anchor::new("C", 0.0)));

        assert_eq!(rating_of(&anchored, "C"), 0.0);
        let order = |r: &RatingResult| r.players.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(order(&free), order(&anchored));
    }

    #[test]
    fn test_missing_anchor_is_ignored() {
        let players = names(&["A", "B", "C"]);
        let solver = RatingSolver::default();
        let free = solver.solve(&chain(), &players, None);
        let ghost = solver.solve(&chain(), &players, Some(&Anchor::new("Nobody", 2000.0)));
        assert_eq!(free, ghost);
    }

    #[test]
    fn test_single_player_gets_default_rating_and_unit_los() {
        let result = RatingSolver::default().solve(&[], &names(&["Solo"]), None);
        assert_eq!(result.players.len(), 1);
        assert_eq!(result.players[0].rating, 0.0);
        assert_eq!(result.los, vec![vec![1.0]]);

        let empty = RatingSolver::default().solve(&[], &[], None);
        assert!(empty.players.is_empty());
        assert!(empty.los.is_empty());
    }

    #[test]
    fn test_isolated_player_error_uses_floor() {
        let pairings = vec![Pairing::new(0, 1, 1.0)];
        let result = RatingSolver::default().solve(&pairings, &names(&["A", "B", "Idle"]), None);
        let idle = result.player("Idle").unwrap();
        assert_eq!(idle.games, 0);
        assert_eq!(idle.rating, 0.0);
        let floor_error = (1.0 / MIN_VARIANCE).sqrt() * ERROR_SCALE;
        assert!((idle.error - floor_error).abs() < 1e-6);
        assert!(result.player("A").unwrap().error < floor_error);
    }

    #[test]
    fn test_out_of_range_pairings_are_ignored() {
        let pairings = vec![Pairing::new(0, 1, 1.0), Pairing::new(0, 7, 1.0)];
        let result = RatingSolver::default().solve(&pairings, &names(&["A", "B"]), None);
        assert_eq!(result.player("A").unwrap().games, 1);
    }

    #[test]
    fn test_opponent_rating_sum_and_draws() {
        let pairings = vec![
            Pairing::new(0, 1, 1.0),
            Pairing::new(1, 0, 0.5),
            Pairing::new(0, 1, 1.0),
        ];
        let result = RatingSolver::default().solve(&pairings, &names(&["A", "B"]), None);
        let a = result.player("A").unwrap();
        let b = result.player("B").unwrap();
        assert_eq!(a.draws, 1);
        assert_eq!(b.draws, 1);
        assert!((a.score_sum - 2.5).abs() < 1e-12);
        assert!((a.opponent_rating_sum - 3.0 * b.rating).abs() < 1e-9);
        assert!((a.average_opponent() - b.rating).abs() < 1e-9);
    }

    #[test]
    fn test_solve_records_matches_pairing_solve() {
        let records = vec![
            record("A", "B", Outcome::WhiteWin),
            record("B", "C", Outcome::Draw),
            record("X", "Y", Outcome::Unknown),
            record("C", "A", Outcome::BlackWin),
        ];
        let (pairings, table) = build_pairings(&records);
        assert_eq!(table, ["A", "B", "C"]);
        assert_eq!(pairings.len(), 3);

        let solver = RatingSolver::default();
        assert_eq!(
            solver.solve_records(&records, None),
            solver.solve(&pairings, &table, None)
        );
    }

    #[test]
    fn test_solve_records_skips_unknown_outcomes() {
        let records = vec![
            record("A", "B", Outcome::WhiteWin),
            record("A", "Z", Outcome::Unknown),
        ];
        let result = RatingSolver::default().solve_records(&records, None);
        assert_eq!(result.players.len(), 2);
        assert!(result.player("Z").is_none());
        assert_eq!(result.player("A").unwrap().games, 1);
    }

    #[test]
    fn test_solve_records_single_entity() {
        let records = vec![record("A", "A", Outcome::Draw)];
        let result = RatingSolver::default().solve_records(&records, None);
        assert_eq!(result.players.len(), 1);
        assert_eq!(result.los, vec![vec![1.0]]);
    }

    #[test]
    fn test_expected_score_and_los_scales() {
        assert!((expected_score(0.0) - 0.5).abs() < 1e-12);
        assert!((expected_score(400.0) - 10.0 / 11.0).abs() < 1e-12);
        assert!((likelihood_of_superiority(200.0) - 10.0 / 11.0).abs() < 1e-12);
    }
}
