use std::io::Write;

use bayeselo::pgn::{CompressionMode, ParseOptions, parse_chunk, parse_str, split_file};
use bayeselo::rating::{RatingSolver, build_pairings};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tempfile::NamedTempFile;

const PLAYERS: [&str; 8] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
];

fn synthetic_pgn(games: usize) -> String {
    let mut out = String::new();
    for i in 0..games {
        let white = PLAYERS[i % PLAYERS.len()];
        let black = PLAYERS[(i * 3 + 1) % PLAYERS.len()];
        let result = ["1-0", "0-1", "1/2-1/2"][i % 3];
        out.push_str(&format!(
            "[Event \"Bench {i}\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{result}\"]\n[TimeControl \"180+2\"]\n\n\
             1. e4 {{ [%clk 0:03:00] }} e5 2. Nf3 Nc6 (2... d6 3. d4) 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 {result}\n\n"
        ));
    }
    out
}

fn bench_parse_str(c: &mut Criterion) {
    let text = synthetic_pgn(500);
    c.bench_function("parse_str_500_games", |b| {
        b.iter(|| parse_str(black_box(&text), false))
    });
}

fn bench_split_and_parse(c: &mut Criterion) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(synthetic_pgn(5_000).as_bytes()).unwrap();
    file.flush().unwrap();
    let options = ParseOptions::default();

    c.bench_function("split_file_64k", |b| {
        b.iter(|| split_file(black_box(file.path()), 64 * 1024, CompressionMode::Plain))
    });

    let chunks = split_file(file.path(), 64 * 1024, CompressionMode::Plain);
    c.bench_function("parse_chunks_5000_games", |b| {
        b.iter(|| {
            chunks
                .iter()
                .map(|chunk| parse_chunk(chunk, &options).map_or(0, |r| r.len()))
                .sum::<usize>()
        })
    });
}

fn bench_solver(c: &mut Criterion) {
    let records = parse_str(&synthetic_pgn(2_000), false);
    let (pairings, names) = build_pairings(&records);
    let solver = RatingSolver::default();
    c.bench_function("solve_2000_pairings", |b| {
        b.iter(|| solver.solve(black_box(&pairings), &names, None))
    });
}

criterion_group!(benches, bench_parse_str, bench_split_and_parse, bench_solver);
criterion_main!(benches);
