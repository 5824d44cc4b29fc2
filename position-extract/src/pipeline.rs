use std::fs;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::batch_writer::{BatchRecord, BatchSink, BatchWriter, NpyBatchStore};
use crate::config::ExtractConfig;
use crate::engine::RulesEngine;
use crate::error::ExtractError;
use crate::replay::validate_prefix;
use crate::sampler::{sample_positions, TrainingExample};
use crate::stats::{GameStatus, Statistics};
use crate::tokenizer::tokenize;

/// Files handed to the worker pool at once. Bounds how many files' worth
/// of examples are held before they reach the writer.
const FILES_PER_CHUNK: usize = 256;

pub const SUMMARY_FILENAME: &str = "summary.json";

#[derive(Debug)]
pub struct GameExtraction {
    pub status: GameStatus,
    pub examples: Vec<TrainingExample>,
    pub stats: Statistics,
}

impl GameExtraction {
    fn skipped(status: GameStatus) -> Self {
        let mut stats = Statistics::new();
        stats.record_status(status);
        Self {
            status,
            examples: Vec::new(),
            stats,
        }
    }
}

/// Runs one game's text through tokenizing, replay and sampling.
pub fn extract_game<E, R>(engine: &E, text: &str, rng: &mut R) -> GameExtraction
where
    E: RulesEngine,
    R: Rng + ?Sized,
{
    let Some(game) = tokenize(text) else {
        return GameExtraction::skipped(GameStatus::Malformed);
    };

    let validated = validate_prefix(engine, &game.moves);
    if validated.is_empty() {
        let mut extraction = GameExtraction::skipped(GameStatus::NoValidMoves);
        extraction.stats.moves_tokenized = game.moves.len() as u64;
        return extraction;
    }

    let sampled = sample_positions(engine, &validated, game.outcome, rng);

    let mut stats = Statistics::new();
    stats.record_status(GameStatus::Used);
    stats.moves_tokenized = game.moves.len() as u64;
    stats.moves_validated = validated.len() as u64;
    stats.samples_drawn = sampled.drawn as u64;
    stats.samples_near_capture = sampled.near_capture as u64;
    stats.examples_emitted = sampled.examples.len() as u64;

    GameExtraction {
        status: GameStatus::Used,
        examples: sampled.examples,
        stats,
    }
}

/// Reads and extracts one file. A read failure only affects this file.
pub fn process_file<E, R>(engine: &E, path: &Path, rng: &mut R) -> GameExtraction
where
    E: RulesEngine,
    R: Rng + ?Sized,
{
    let text = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("Skipping {}: {}", path.display(), ExtractError::io(path, e));
            return GameExtraction::skipped(GameStatus::Unreadable);
        }
    };

    let extraction = extract_game(engine, &text, rng);
    if extraction.status != GameStatus::Used {
        log::debug!("No examples from {} ({:?})", path.display(), extraction.status);
    }
    extraction
}

/// Every file under `root` with the given extension, sorted. A `root`
/// that is itself a file is returned as is.
pub fn collect_game_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, ExtractError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let root_str = root
        .to_str()
        .ok_or_else(|| ExtractError::Argument("Invalid path encoding".to_string()))?;
    let pattern = format!(
        "{}/**/*.{}",
        Pattern::escape(root_str.trim_end_matches('/')),
        Pattern::escape(extension)
    );

    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| ExtractError::Argument(format!("Invalid glob pattern: {e}")))?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    Ok(files)
}

pub fn file_seed(base_seed: u64, file_index: usize) -> u64 {
    base_seed.wrapping_add(file_index as u64)
}

/// Extracts every file and feeds the examples to `writer` in file order.
///
/// Files are processed in parallel, but only this thread touches the
/// writer. Each file samples with its own RNG derived from `base_seed`,
/// so output depends only on the seed and the file list.
pub fn run_corpus<E, S, F>(
    engine: &E,
    files: &[PathBuf],
    base_seed: u64,
    writer: &mut BatchWriter<S>,
    mut on_file: F,
) -> Result<Statistics, ExtractError>
where
    E: RulesEngine + Sync,
    S: BatchSink,
    F: FnMut(&Path, GameStatus),
{
    let mut stats = Statistics::new();

    for (chunk_index, chunk) in files.chunks(FILES_PER_CHUNK).enumerate() {
        let first = chunk_index * FILES_PER_CHUNK;
        let extractions: Vec<GameExtraction> = chunk
            .par_iter()
            .enumerate()
            .map(|(offset, path)| {
                let mut rng = ChaCha8Rng::seed_from_u64(file_seed(base_seed, first + offset));
                process_file(engine, path, &mut rng)
            })
            .collect();

        for (path, extraction) in chunk.iter().zip(extractions) {
            for example in &extraction.examples {
                writer.append(example)?;
            }
            stats.merge(&extraction.stats);
            on_file(path, extraction.status);
        }
    }

    Ok(stats)
}

pub struct RunReport {
    pub seed: u64,
    pub stats: Statistics,
    pub batches: Vec<BatchRecord>,
    pub summary_path: PathBuf,
}

/// Full run: extract `files` into NumPy batches under the configured
/// output directory and write the run summary next to them.
pub fn run<E, F>(
    engine: &E,
    config: &ExtractConfig,
    files: &[PathBuf],
    on_file: F,
) -> Result<RunReport, ExtractError>
where
    E: RulesEngine + Sync,
    F: FnMut(&Path, GameStatus) + Send,
{
    config.validate()?;

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("Sampling with base seed {seed}");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.unwrap_or(0))
        .build()
        .map_err(|e| ExtractError::Argument(format!("Failed to set thread count: {e}")))?;

    let store = NpyBatchStore::new(&config.output_dir)?;
    let mut writer = BatchWriter::new(store, config.batch_size)?;

    let stats = pool.install(|| run_corpus(engine, files, seed, &mut writer, on_file))?;
    let (_, batches) = writer.finish()?;

    let summary_path = config.output_dir.join(SUMMARY_FILENAME);
    write_summary(&summary_path, &stats, config, seed, &batches)?;

    Ok(RunReport {
        seed,
        stats,
        batches,
        summary_path,
    })
}

fn write_summary(
    path: &Path,
    stats: &Statistics,
    config: &ExtractConfig,
    seed: u64,
    batches: &[BatchRecord],
) -> Result<(), ExtractError> {
    let output = stats.to_output(config, seed, batches);
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ExtractError::Summary(format!("JSON serialization failed: {e}")))?;
    fs::write(path, json).map_err(|e| ExtractError::write(path, e))
}
