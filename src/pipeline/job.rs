use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::merged::MergedConfig;
use crate::config::profile::{ColorMode, QualityTier};
use crate::error::{FailureKind, PdfSqueezeError};

/// The job being worked on. Its configuration is a snapshot taken when the
/// job was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionJob {
    pub source_path: PathBuf,
    /// Size of the source when the job was accepted. Never recomputed.
    pub original_size: u64,
    pub quality: QualityTier,
    pub color_mode: ColorMode,
    pub config: MergedConfig,
}

impl CompressionJob {
    pub fn new(source_path: impl Into<PathBuf>, original_size: u64, config: &MergedConfig) -> Self {
        Self {
            source_path: source_path.into(),
            original_size,
            quality: config.quality,
            color_mode: config.color_mode,
            config: config.clone(),
        }
    }

    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

/// Pipeline state of the job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Accepted,
    Optimizing,
    /// `done` pages of `total` have been processed.
    Rasterizing { done: u32, total: u32 },
    Comparing,
    Replaced,
    NoReduction,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Replaced | JobState::NoReduction | JobState::Failed)
    }
}

/// Result of one job, as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompressionOutcome {
    Reduced {
        path: PathBuf,
        original_size: u64,
        final_size: u64,
        /// Where the previous version can be recovered from.
        trashed: PathBuf,
    },
    NoReduction {
        path: PathBuf,
        original_size: u64,
        /// Size of the discarded candidate, if one was produced.
        candidate_size: Option<u64>,
    },
    Failed {
        path: PathBuf,
        kind: FailureKind,
        reason: String,
    },
}

impl CompressionOutcome {
    pub fn failed(path: &Path, err: &PdfSqueezeError) -> Self {
        CompressionOutcome::Failed {
            path: path.to_path_buf(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            CompressionOutcome::Reduced { path, .. }
            | CompressionOutcome::NoReduction { path, .. }
            | CompressionOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CompressionOutcome::Failed { .. })
    }

    /// Terminal slot state matching this outcome.
    pub fn terminal_state(&self) -> JobState {
        match self {
            CompressionOutcome::Reduced { .. } => JobState::Replaced,
            CompressionOutcome::NoReduction { .. } => JobState::NoReduction,
            CompressionOutcome::Failed { .. } => JobState::Failed,
        }
    }

    /// Saved fraction in percent, for reduced outcomes.
    pub fn savings_percent(&self) -> Option<f64> {
        match self {
            CompressionOutcome::Reduced {
                original_size,
                final_size,
                ..
            } if *original_size > 0 => {
                Some((*original_size - *final_size) as f64 / *original_size as f64 * 100.0)
            }
            _ => None,
        }
    }
}
