use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::types::{PlayerStats, RatingResult};

pub const CSV_HEADER: &str = "Player,Elo,Error,Games,ScorePct,DrawPct";

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Serialize)]
struct PlayerRow<'a> {
    name: &'a str,
    elo: f64,
    error: f64,
    games: u32,
    score_pct: f64,
    draw_pct: f64,
    avg_opponent: f64,
}

impl<'a> From<&'a PlayerStats> for PlayerRow<'a> {
    fn from(p: &'a PlayerStats) -> Self {
        Self {
            name: &p.name,
            elo: round_to(p.rating, 2),
            error: round_to(p.error, 2),
            games: p.games,
            score_pct: round_to(p.score_pct(), 2),
            draw_pct: round_to(p.draw_pct(), 2),
            avg_opponent: round_to(p.average_opponent(), 2),
        }
    }
}

#[derive(Serialize)]
struct RatingDocument<'a> {
    players: Vec<PlayerRow<'a>>,
    los: Vec<Vec<f64>>,
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn write_csv<W: Write>(result: &RatingResult, mut out: W) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for p in &result.players {
        writeln!(
            out,
            "{},{:.2},{:.2},{},{:.2},{:.2}",
            csv_field(&p.name),
            p.rating,
            p.error,
            p.games,
            p.score_pct(),
            p.draw_pct()
        )?;
    }
    out.flush()
}

pub fn write_json<W: Write>(result: &RatingResult, mut out: W) -> io::Result<()> {
    let document = RatingDocument {
        players: result.players.iter().map(PlayerRow::from).collect(),
        los: result
            .los
            .iter()
            .map(|row| row.iter().map(|&v| round_to(v, 4)).collect())
            .collect(),
    };
    serde_json::to_writer_pretty(&mut out, &document)?;
    writeln!(out)?;
    out.flush()
}

pub fn export_csv(result: &RatingResult, path: &Path) -> io::Result<()> {
    write_csv(result, BufWriter::new(File::create(path)?))
}

pub fn export_json(result: &RatingResult, path: &Path) -> io::Result<()> {
    write_json(result, BufWriter::new(File::create(path)?))
}
