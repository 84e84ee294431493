use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdf_squeeze::config::merged::{MergedConfig, Overrides};
use pdf_squeeze::config::profile::{ColorMode, QualityTier};
use pdf_squeeze::config;
use pdf_squeeze::notify::{format_bytes, summarize};
use pdf_squeeze::pipeline::cancel::CancellationToken;
use pdf_squeeze::pipeline::job::CompressionOutcome;
use pdf_squeeze::pipeline::job_runner::Compressor;
use pdf_squeeze::pipeline::orchestrator::run_all;
use pdf_squeeze::render::pdfium::PdfiumLoader;

/// Shrink PDF files in place. The original is moved to the trash and only
/// replaced when the recompressed file is strictly smaller.
#[derive(Debug, Parser)]
#[command(name = "pdf_squeeze", version, about)]
struct Cli {
    /// PDF files to compress.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Quality tier: lossless, minimal, light, medium or strong.
    #[arg(short, long)]
    quality: Option<QualityTier>,

    /// Color mode: full or gray.
    #[arg(short, long)]
    color: Option<ColorMode>,

    /// Settings file (YAML). Without it, settings.yaml beside each input or the
    /// user settings file is used; pdfium_lib_path is only read from this file
    /// or the user settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the lossless optimization stage.
    #[arg(long)]
    no_optimize: bool,

    /// Directory that receives replaced originals.
    #[arg(long)]
    trash_dir: Option<PathBuf>,

    /// Print each outcome as a JSON line on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        quality: cli.quality,
        color_mode: cli.color,
        optimize: cli.no_optimize.then_some(false),
        trash_dir: cli.trash_dir.clone(),
    };

    let pdfium_lib = match config::pdfium_lib_path(cli.config.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Settings are resolved per input, so a settings.yaml beside a document applies to it.
    let mut jobs: Vec<(PathBuf, MergedConfig)> = Vec::new();
    for input in &cli.inputs {
        let settings = match config::load_settings(cli.config.as_deref(), Some(input)) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {}: {e}", input.display());
                return ExitCode::FAILURE;
            }
        };
        jobs.push((input.clone(), MergedConfig::new(&settings, &overrides)));
    }

    let loader = match PdfiumLoader::new(pdfium_lib.as_deref()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };
    let compressor = Compressor::new(Box::new(loader));
    let outcomes = run_all(&compressor, &jobs, &CancellationToken::new());

    let mut has_error = false;
    for outcome in &outcomes {
        if cli.json {
            match serde_json::to_string(outcome) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("ERROR: Failed to serialize outcome: {e}"),
            }
        }

        match outcome {
            CompressionOutcome::Reduced {
                path,
                original_size,
                final_size,
                ..
            } => eprintln!(
                "OK: {} ({} -> {})",
                path.display(),
                format_bytes(*original_size),
                format_bytes(*final_size)
            ),
            CompressionOutcome::NoReduction { path, .. } => {
                eprintln!("SKIP: {}: {}", path.display(), summarize(outcome))
            }
            CompressionOutcome::Failed { path, .. } => {
                eprintln!("ERROR: {}: {}", path.display(), summarize(outcome));
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
