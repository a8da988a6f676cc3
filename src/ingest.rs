//! Parallel ingestion: chunks are parsed and filtered on worker threads, and
//! accepted records are merged into one shared collection under two soft caps.

use std::mem::{self, size_of};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::ChunkError;
use crate::log;
use crate::pgn::{
    CompressionMode, DEFAULT_CHUNK_BYTES, FilterConfig, ParseOptions, parse_chunk, split_file,
};
use crate::types::{ChunkRange, Pairing, Record};

pub const LIMIT_ADVISORY: &str =
    "Reached limit (--max-games or --max-size); remaining parsed games were discarded.";

/// Estimated cost of a pairing in the byte budget.
pub const PAIRING_COST: usize = size_of::<Pairing>();

/// Estimated cost of adding `name` to the name table.
pub fn name_cost(name: &str) -> usize {
    name.len() + size_of::<String>()
}

/// Estimated cost of retaining a full record.
pub fn record_cost(record: &Record) -> usize {
    let optional = |s: &Option<String>| s.as_ref().map_or(0, String::len);
    let moves = record
        .moves
        .as_ref()
        .map_or(0, |m| m.iter().map(|mv| name_cost(mv)).sum::<usize>());
    size_of::<Record>()
        + record.white.len()
        + record.black.len()
        + optional(&record.termination)
        + optional(&record.time_control)
        + optional(&record.parse_error)
        + moves
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub threads: usize,
    pub chunk_bytes: u64,
    /// Retain full records with move lists instead of compact pairings.
    pub keep_moves: bool,
    pub max_records: Option<usize>,
    pub max_bytes: Option<usize>,
    pub compression: CompressionMode,
    pub filters: FilterConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            keep_moves: false,
            max_records: None,
            max_bytes: None,
            compression: CompressionMode::Plain,
            filters: FilterConfig::default(),
        }
    }
}

/// Append-only name list with a reverse index; an index never changes once assigned.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl NameTable {
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Shared counter with an optional ceiling, advanced by compare-and-swap.
#[derive(Debug)]
pub struct SoftLimit {
    current: AtomicUsize,
    ceiling: Option<usize>,
}

impl SoftLimit {
    pub fn new(ceiling: Option<usize>) -> Self {
        Self {
            current: AtomicUsize::new(0),
            ceiling,
        }
    }

    /// Adds `amount` unless that would pass the ceiling.
    pub fn try_reserve(&self, amount: usize) -> bool {
        let Some(ceiling) = self.ceiling else {
            self.current.fetch_add(amount, Ordering::Relaxed);
            return true;
        };

        let mut attempts = 0u32;
        let mut current = self.current.load(Ordering::Acquire);
        loop {
            let Some(next) = current.checked_add(amount).filter(|&next| next <= ceiling) else {
                return false;
            };
            match self
                .current
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
            attempts += 1;
            if attempts % 8 == 0 {
                thread::yield_now();
            }
        }
    }

    pub fn used(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub enum IngestData {
    Pairings {
        pairings: Vec<Pairing>,
        names: Vec<String>,
    },
    Records(Vec<Record>),
}

impl IngestData {
    pub fn len(&self) -> usize {
        match self {
            Self::Pairings { pairings, .. } => pairings.len(),
            Self::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub chunks_processed: usize,
    pub chunks_failed: usize,
    /// Chunks never opened because a soft limit had already stopped the run.
    pub chunks_skipped: usize,
    pub records_parsed: usize,
    pub records_accepted: usize,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub data: IngestData,
    /// A soft cap stopped the run; `data` is partial.
    pub limit_reached: bool,
    pub failures: Vec<ChunkError>,
    pub stats: IngestStats,
}

#[derive(Default)]
struct Collected {
    names: NameTable,
    pairings: Vec<Pairing>,
    records: Vec<Record>,
    failures: Vec<ChunkError>,
}

#[derive(Default)]
struct Counters {
    chunks_processed: AtomicUsize,
    chunks_failed: AtomicUsize,
    chunks_skipped: AtomicUsize,
    records_parsed: AtomicUsize,
    records_accepted: AtomicUsize,
}

struct SharedState {
    filters: FilterConfig,
    options: ParseOptions,
    collected: Mutex<Collected>,
    accepted: SoftLimit,
    bytes: SoftLimit,
    limit_reached: AtomicBool,
    counters: Counters,
}

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        self.limit_reached.store(true, Ordering::Relaxed);
    }

    fn stopped(&self) -> bool {
        self.limit_reached.load(Ordering::Relaxed)
    }

    /// Reserves a record's byte cost, then its slot in the record count.
    fn admit(&self, cost: usize) -> bool {
        if !self.bytes.try_reserve(cost) || !self.accepted.try_reserve(1) {
            self.stop();
            return false;
        }
        true
    }
}

/// Splits every input file and ingests the resulting chunks.
pub fn ingest_files(paths: &[PathBuf], config: &IngestConfig) -> IngestOutcome {
    let chunks: Vec<ChunkRange> = paths
        .iter()
        .flat_map(|path| split_file(path, config.chunk_bytes, config.compression))
        .collect();
    log::info(format!(
        "{} input files split into {} chunks",
        paths.len(),
        chunks.len()
    ));
    ingest_chunks(chunks, config)
}

pub fn ingest_chunks(chunks: Vec<ChunkRange>, config: &IngestConfig) -> IngestOutcome {
    let shared = SharedState {
        filters: config.filters.clone(),
        options: ParseOptions {
            keep_moves: config.keep_moves,
            compression: config.compression,
        },
        collected: Mutex::new(Collected::default()),
        accepted: SoftLimit::new(config.max_records),
        bytes: SoftLimit::new(config.max_bytes),
        limit_reached: AtomicBool::new(false),
        counters: Counters::default(),
    };

    // Returns once every chunk has been processed.
    let threads = config.threads.clamp(1, chunks.len().max(1));
    let drain = || {
        chunks
            .par_iter()
            .for_each(|chunk| process_chunk(chunk, &shared))
    };
    match ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(drain),
        Err(e) => {
            log::warn(format!("cannot build a {threads}-thread pool, using the global one: {e}"));
            drain();
        }
    }

    let collected = mem::take(&mut *shared.lock());
    let counters = &shared.counters;
    let stats = IngestStats {
        chunks_processed: counters.chunks_processed.load(Ordering::Relaxed),
        chunks_failed: counters.chunks_failed.load(Ordering::Relaxed),
        chunks_skipped: counters.chunks_skipped.load(Ordering::Relaxed),
        records_parsed: counters.records_parsed.load(Ordering::Relaxed),
        records_accepted: counters.records_accepted.load(Ordering::Relaxed),
    };
    let limit_reached = shared.stopped();

    log::info(format!(
        "ingested {} of {} parsed records from {} chunks ({} failed, {} skipped, ~{} bytes retained)",
        stats.records_accepted,
        stats.records_parsed,
        stats.chunks_processed,
        stats.chunks_failed,
        stats.chunks_skipped,
        shared.bytes.used()
    ));
    if limit_reached {
        log::warn("soft limit reached, remaining records skipped");
    }

    let data = if config.keep_moves {
        IngestData::Records(collected.records)
    } else {
        IngestData::Pairings {
            pairings: collected.pairings,
            names: collected.names.into_names(),
        }
    };

    IngestOutcome {
        data,
        limit_reached,
        failures: collected.failures,
        stats,
    }
}

fn process_chunk(chunk: &ChunkRange, shared: &SharedState) {
    if shared.stopped() {
        shared.counters.chunks_skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let records = match parse_chunk(chunk, &shared.options) {
        Ok(records) => records,
        Err(e) => {
            log::warn(format!("Failed to parse chunk: {e}"));
            shared.counters.chunks_failed.fetch_add(1, Ordering::Relaxed);
            shared.lock().failures.push(e);
            return;
        }
    };
    shared
        .counters
        .chunks_processed
        .fetch_add(1, Ordering::Relaxed);

    let filtering = shared.filters.is_active();
    let mut parsed = 0usize;
    let mut local_pairings = Vec::new();
    let mut local_records = Vec::new();

    for record in records {
        if shared.stopped() {
            break;
        }
        parsed += 1;

        if filtering && !shared.filters.accepts(&record) {
            continue;
        }

        if shared.options.keep_moves {
            if !shared.admit(record_cost(&record)) {
                break;
            }
            local_records.push(record);
        } else {
            let Some(score) = record.outcome.white_score() else {
                continue;
            };
            match admit_pairing(shared, &record, score) {
                Some(pairing) => local_pairings.push(pairing),
                None => break,
            }
        }
    }

    let accepted = local_pairings.len() + local_records.len();
    shared
        .counters
        .records_parsed
        .fetch_add(parsed, Ordering::Relaxed);
    shared
        .counters
        .records_accepted
        .fetch_add(accepted, Ordering::Relaxed);

    if accepted > 0 {
        let mut collected = shared.lock();
        collected.pairings.append(&mut local_pairings);
        collected.records.append(&mut local_records);
    }
}

/// Interns both names and reserves the record's full cost in one critical
/// section, so a rejected record leaves no names behind.
fn admit_pairing(shared: &SharedState, record: &Record, score: f64) -> Option<Pairing> {
    let mut collected = shared.lock();
    let names = &mut collected.names;

    let new_white = names.get(&record.white).is_none();
    let new_black = record.black != record.white && names.get(&record.black).is_none();
    let cost = PAIRING_COST
        + if new_white { name_cost(&record.white) } else { 0 }
        + if new_black { name_cost(&record.black) } else { 0 };

    if !shared.admit(cost) {
        return None;
    }

    let white = names.intern(&record.white);
    let black = names.intern(&record.black);
    Some(Pairing::new(white, black, score))
}
