use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;

use position_extract::batch_writer::DEFAULT_BATCH_SIZE;
use position_extract::config::{ExtractConfig, DEFAULT_EXTENSION, DEFAULT_OUTPUT_DIR};
use position_extract::engine::ShakmatyEngine;
use position_extract::error::ExtractError;
use position_extract::pipeline::{collect_game_files, run};

#[derive(Parser)]
#[command(name = "position-extract")]
#[command(about = "Sample and encode positions from chess game files into NumPy training batches")]
struct Args {
    /// Directory searched recursively for game files, or a single game file
    root: PathBuf,

    /// Output directory for batch artifacts and the run summary
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Examples per batch; the last batch holds the remainder
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Base seed for position sampling (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Extension of game files to pick up
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Number of worker threads (defaults to CPU cores)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

impl Args {
    fn into_config(self) -> ExtractConfig {
        ExtractConfig {
            root: self.root,
            output_dir: self.output,
            batch_size: self.batch_size,
            seed: self.seed,
            extension: self.extension,
            jobs: self.jobs,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    match try_main(Args::parse().into_config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn try_main(config: ExtractConfig) -> Result<(), ExtractError> {
    config.validate()?;

    let files = collect_game_files(&config.root, config.normalized_extension())?;
    if files.is_empty() {
        return Err(ExtractError::NoInputFiles {
            root: config.root.clone(),
            extension: config.normalized_extension().to_string(),
        });
    }

    println!("Found {} game files", files.len());
    println!("Output directory: {}", config.output_dir.display());

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} files {pos}/{len} {elapsed_precise} {bar:40} {msg}")
            .map_err(|e| ExtractError::Argument(format!("Invalid progress template: {e}")))?,
    );

    let engine = ShakmatyEngine::new();
    let bar = progress.clone();
    let report = run(&engine, &config, &files, move |_, _| bar.inc(1))?;
    progress.finish_and_clear();

    let stats = &report.stats;
    println!("\n=== Summary ===");
    println!("Base seed:           {}", report.seed);
    println!("Files used:          {}", stats.files_used);
    println!("Files malformed:     {} (no moves or no result)", stats.files_malformed);
    println!("Files no legal move: {}", stats.files_no_valid_moves);
    println!("Files unreadable:    {}", stats.files_unreadable);
    println!(
        "Samples drawn:       {} ({} near a capture)",
        stats.samples_drawn, stats.samples_near_capture
    );
    println!("Examples written:    {}", stats.examples_emitted);
    println!("Batches written:     {}", report.batches.len());
    println!("Wrote summary to {}", report.summary_path.display());

    Ok(())
}
