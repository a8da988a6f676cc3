use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bayeselo::export::{export_csv, export_json};
use bayeselo::ingest::{IngestConfig, IngestData, LIMIT_ADVISORY, ingest_files};
use bayeselo::log;
use bayeselo::pgn::{CompressionMode, DEFAULT_CHUNK_BYTES, FilterConfig, ResultFilter};
use bayeselo::rating::{Anchor, RatingSolver, build_pairings, head_to_head};
use bayeselo::report::{render_head_to_head, render_ratings};
use bayeselo::types::{Pairing, RatingResult};
use bayeselo::util::{parse_duration, parse_size};
use clap::Parser;

fn parse_threads(raw: &str) -> Result<usize, String> {
    let threads: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("expected integer in [1,1024], got '{raw}'"))?;
    if (1..=1024).contains(&threads) {
        Ok(threads)
    } else {
        Err(format!("--threads must be in [1,1024], got {threads}"))
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get().min(1024))
}

#[derive(Parser)]
#[command(
    name = "elo_rating",
    version,
    about = "Bayesian Elo ratings from PGN game collections",
    after_help = "Size suffixes: k=KiB, m=MiB, g=GiB. Duration suffixes: s, m, h.\n\
                  Without --keep-moves, moves are dropped after ply counting and only compact pairings are kept."
)]
struct Cli {
    /// PGN files or glob patterns
    #[arg(required = true)]
    files: Vec<String>,

    /// Number of worker threads
    #[arg(long, default_value_t = default_threads(), value_parser = parse_threads)]
    threads: usize,

    /// Write ratings table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write ratings table and LOS matrix as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Stop after N accepted games
    #[arg(long)]
    max_games: Option<usize>,

    /// Cap approximate memory for names, pairings and records
    #[arg(long, value_name = "BYTES|k|m|g", value_parser = parse_size)]
    max_size: Option<usize>,

    /// Target chunk size for parallel parsing
    #[arg(long, value_name = "BYTES|k|m|g", value_parser = parse_size)]
    chunk_size: Option<usize>,

    /// Retain SAN move text (otherwise dropped after ply counting)
    #[arg(long)]
    keep_moves: bool,

    /// Input compression for every file; `.zst` files are detected regardless
    #[arg(long, value_parser = CompressionMode::parse)]
    compression: Option<CompressionMode>,

    /// Hold this player's rating fixed
    #[arg(long)]
    anchor: Option<String>,

    /// Rating assigned to the anchor player
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    anchor_rating: f64,

    /// Print classical head-to-head figures for the two top-rated players
    #[arg(long)]
    head_to_head: bool,

    /// Disable ANSI colours in the rating table
    #[arg(long)]
    no_color: bool,

    /// Minimum plies (half-moves)
    #[arg(long, help_heading = "Filters")]
    min_plies: Option<u32>,

    /// Maximum plies (half-moves)
    #[arg(long, help_heading = "Filters")]
    max_plies: Option<u32>,

    /// Minimum moves (converted to plies)
    #[arg(long, help_heading = "Filters")]
    min_moves: Option<u32>,

    /// Maximum moves (converted to plies)
    #[arg(long, help_heading = "Filters")]
    max_moves: Option<u32>,

    /// Minimum duration, e.g. 300, 5m, 1h
    #[arg(long, value_parser = parse_duration, help_heading = "Filters")]
    min_time: Option<f64>,

    /// Maximum duration; "300+2" uses only the base time
    #[arg(long, value_parser = parse_duration, help_heading = "Filters")]
    max_time: Option<f64>,

    /// Require White name to contain substring
    #[arg(long, help_heading = "Filters")]
    white_name: Option<String>,

    /// Require Black name to contain substring
    #[arg(long, help_heading = "Filters")]
    black_name: Option<String>,

    /// Require either name to contain substring
    #[arg(long, help_heading = "Filters")]
    either_name: Option<String>,

    /// Exclude games where either name contains substring
    #[arg(long, help_heading = "Filters")]
    exclude_name: Option<String>,

    /// Filter by result: 1-0, 0-1, 1/2-1/2 or draw
    #[arg(long, help_heading = "Filters")]
    result: Option<ResultFilter>,

    /// Filter by Termination tag substring
    #[arg(long, help_heading = "Filters")]
    termination: Option<String>,

    /// Skip games missing names or result
    #[arg(long, help_heading = "Filters")]
    require_complete: bool,

    /// Skip games with an unknown result
    #[arg(long, help_heading = "Filters")]
    skip_empty: bool,
}

impl Cli {
    fn filters(&self) -> FilterConfig {
        let moves_to_plies = |moves: Option<u32>| moves.map(|m| m.saturating_mul(2));
        FilterConfig {
            min_plies: moves_to_plies(self.min_moves).or(self.min_plies),
            max_plies: moves_to_plies(self.max_moves).or(self.max_plies),
            min_duration: self.min_time,
            max_duration: self.max_time,
            white_name: self.white_name.clone(),
            black_name: self.black_name.clone(),
            either_name: self.either_name.clone(),
            exclude_name: self.exclude_name.clone(),
            result: self.result,
            termination: self.termination.clone(),
            require_complete: self.require_complete,
            skip_empty: self.skip_empty,
        }
    }

    fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            threads: self.threads,
            chunk_bytes: self
                .chunk_size
                .map_or(DEFAULT_CHUNK_BYTES, |size| size.max(1) as u64),
            keep_moves: self.keep_moves,
            max_records: self.max_games,
            max_bytes: self.max_size,
            compression: self.compression.unwrap_or_default(),
            filters: self.filters(),
        }
    }
}

/// Expands glob patterns; plain paths are passed through untouched.
fn expand_inputs(inputs: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }
        match glob::glob(input) {
            Ok(entries) => {
                let before = paths.len();
                paths.extend(entries.filter_map(Result::ok).filter(|p| p.is_file()));
                if paths.len() == before {
                    log::warn(format!("pattern '{input}' matched no files"));
                }
            }
            Err(e) => log::warn(format!("invalid pattern '{input}': {e}")),
        }
    }
    paths
}

fn print_head_to_head(result: &RatingResult, pairings: &[Pairing], names: &[String]) {
    let [first, second, ..] = result.players.as_slice() else {
        eprintln!("Head-to-head not applicable: fewer than two players.");
        return;
    };
    let index_of = |name: &str| names.iter().position(|n| n == name);
    let (Some(a), Some(b)) = (index_of(&first.name), index_of(&second.name)) else {
        return;
    };

    match head_to_head::compute(pairings, names, a, b) {
        Ok(stats) => print!("\n{}", render_head_to_head(&stats)),
        Err(e) => eprintln!("{e}"),
    }
}

fn write_export(
    kind: &str,
    path: &Path,
    result: &RatingResult,
    write: fn(&RatingResult, &Path) -> io::Result<()>,
) -> bool {
    match write(result, path) {
        Ok(()) => {
            log::info(format!("wrote {kind} to '{}'", path.display()));
            true
        }
        Err(e) => {
            log::error(format!("Failed to write {kind} output '{}': {e}", path.display()));
            false
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = expand_inputs(&cli.files);
    if paths.is_empty() {
        log::error("no input files to process");
        return ExitCode::FAILURE;
    }

    let config = cli.ingest_config();
    let outcome = ingest_files(&paths, &config);
    if outcome.data.is_empty() {
        log::warn("no games accepted; the rating table will be empty");
    }

    let anchor = cli
        .anchor
        .as_ref()
        .map(|name| Anchor::new(name.clone(), cli.anchor_rating));
    let solver = RatingSolver::default();
    let (result, pairings, names) = match outcome.data {
        IngestData::Pairings { pairings, names } => {
            let result = solver.solve(&pairings, &names, anchor.as_ref());
            (result, pairings, names)
        }
        IngestData::Records(records) => {
            let result = solver.solve_records(&records, anchor.as_ref());
            let (pairings, names) = build_pairings(&records);
            (result, pairings, names)
        }
    };

    if let Some(anchor) = &anchor
        && result.player(&anchor.name).is_none()
    {
        log::warn(format!("anchor player '{}' not found; ratings are unanchored", anchor.name));
    }

    let color = !cli.no_color && io::stdout().is_terminal();
    print!("{}", render_ratings(&result, color));

    if outcome.limit_reached {
        eprintln!("{LIMIT_ADVISORY}");
    }
    if !outcome.failures.is_empty() {
        let stats = &outcome.stats;
        eprintln!(
            "{} of {} chunks could not be read; results exclude them.",
            stats.chunks_failed,
            stats.chunks_failed + stats.chunks_processed + stats.chunks_skipped
        );
    }

    if cli.head_to_head {
        print_head_to_head(&result, &pairings, &names);
    }

    let mut ok = true;
    if let Some(path) = &cli.csv {
        ok &= write_export("CSV", path, &result, export_csv);
    }
    if let Some(path) = &cli.json {
        ok &= write_export("JSON", path, &result, export_json);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
