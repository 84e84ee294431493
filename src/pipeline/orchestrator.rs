// Phase 10: 全ジョブ実行（1件ずつ）

use std::path::PathBuf;

use crate::config::merged::MergedConfig;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::job::CompressionOutcome;
use crate::pipeline::job_runner::Compressor;

/// Runs every input through `compressor` in order. One failed job does NOT
/// prevent the others from running; a cancelled token stops the remaining
/// ones, which are reported as cancelled.
pub fn run_all(
    compressor: &Compressor,
    inputs: &[(PathBuf, MergedConfig)],
    cancel: &CancellationToken,
) -> Vec<CompressionOutcome> {
    inputs
        .iter()
        .map(|(path, config)| compressor.compress(path, config, cancel))
        .collect()
}
