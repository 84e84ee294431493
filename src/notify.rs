// Outcome notifications

use tracing::{error, info, warn};

use crate::pipeline::job::{CompressionOutcome, JobState};

/// Receives pipeline events. Purely observational; nothing it does feeds
/// back into the job.
pub trait NotificationSink {
    /// Called once per job with its terminal outcome.
    fn notify(&self, outcome: &CompressionOutcome, summary: &str);

    /// Called on every state transition of the job slot.
    fn state_changed(&self, state: JobState) {
        let _ = state;
    }
}

/// Logs outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, outcome: &CompressionOutcome, summary: &str) {
        match outcome {
            CompressionOutcome::Reduced { path, .. } => info!(path = %path.display(), "{summary}"),
            CompressionOutcome::NoReduction { path, .. } => {
                info!(path = %path.display(), "{summary}")
            }
            CompressionOutcome::Failed { path, kind, .. } if kind.requires_manual_recovery() => {
                error!(path = %path.display(), "{summary}")
            }
            CompressionOutcome::Failed { path, .. } => warn!(path = %path.display(), "{summary}"),
        }
    }
}

/// One-line, human-readable description of an outcome.
pub fn summarize(outcome: &CompressionOutcome) -> String {
    match outcome {
        CompressionOutcome::Reduced {
            original_size,
            final_size,
            ..
        } => format!(
            "PDF compressed: {} -> {} (saved {:.1}%)",
            format_bytes(*original_size),
            format_bytes(*final_size),
            outcome.savings_percent().unwrap_or(0.0)
        ),
        CompressionOutcome::NoReduction { path, .. } => format!(
            "No size reduction possible for {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        ),
        CompressionOutcome::Failed { kind, reason, .. } if kind.requires_manual_recovery() => {
            format!("Compression failed, manual recovery required: {reason}")
        }
        CompressionOutcome::Failed { reason, .. } => format!("Compression failed: {reason}"),
    }
}

/// Decimal units, one fractional digit above bytes.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = u;
    }
    format!("{value:.1} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1_500), "1.5 KB");
        assert_eq!(format_bytes(10_000_000), "10.0 MB");
    }

    #[test]
    fn reduced_summary_has_savings() {
        let outcome = CompressionOutcome::Reduced {
            path: PathBuf::from("/tmp/a.pdf"),
            original_size: 10_000_000,
            final_size: 2_500_000,
            trashed: PathBuf::from("/trash/a.pdf"),
        };
        assert_eq!(
            summarize(&outcome),
            "PDF compressed: 10.0 MB -> 2.5 MB (saved 75.0%)"
        );
    }

    #[test]
    fn no_reduction_summary_names_the_file() {
        let outcome = CompressionOutcome::NoReduction {
            path: PathBuf::from("/tmp/a.pdf"),
            original_size: 10,
            candidate_size: Some(10),
        };
        assert_eq!(summarize(&outcome), "No size reduction possible for a.pdf");
    }
}
