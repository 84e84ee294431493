use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfSqueezeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("PDF load error: {0}")]
    LoadFailure(String),

    #[error("Optimization error: {0}")]
    OptimizeError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Page skipped: {0}")]
    RasterizationGap(String),

    #[error("Encoding error: {0}")]
    EncodingFailure(String),

    #[error(
        "Replace failed, original was moved to {}: {reason}",
        trashed.display()
    )]
    ReplaceFailure { trashed: PathBuf, reason: String },

    #[error("Trash error: {0}")]
    TrashError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("A compression job is already running for {}", .0.display())]
    JobActive(PathBuf),

    #[error("Job cancelled")]
    Cancelled,

    #[error("No page could be rendered")]
    EmptyOutput,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PdfSqueezeError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PdfSqueezeError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a load error.
    load => LoadFailure,
    /// Create an optimization error.
    optimize => OptimizeError,
    /// Create a render error.
    render => RenderError,
    /// Create a rasterization gap (non-fatal, the page is omitted).
    gap => RasterizationGap,
    /// Create an encoding error.
    encode => EncodingFailure,
    /// Create a trash error.
    trash => TrashError,
    /// Create a permission error.
    permission => PermissionDenied,
}

/// Tag attached to a failed [`crate::pipeline::job::CompressionOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    LoadFailure,
    EncodingFailure,
    ReplaceFailure,
    PermissionDenied,
    Cancelled,
    EmptyOutput,
    Busy,
    Io,
    Other,
}

impl FailureKind {
    /// True when the original document is no longer at its path and must be
    /// restored from the trash by hand.
    pub fn requires_manual_recovery(self) -> bool {
        matches!(self, FailureKind::ReplaceFailure)
    }
}

impl PdfSqueezeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) | Self::LoadFailure(_) => FailureKind::LoadFailure,
            Self::EncodingFailure(_) => FailureKind::EncodingFailure,
            Self::ReplaceFailure { .. } => FailureKind::ReplaceFailure,
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::Cancelled => FailureKind::Cancelled,
            Self::EmptyOutput => FailureKind::EmptyOutput,
            Self::JobActive(_) => FailureKind::Busy,
            Self::IoError(_) | Self::TrashError(_) => FailureKind::Io,
            Self::ConfigError(_)
            | Self::OptimizeError(_)
            | Self::RenderError(_)
            | Self::RasterizationGap(_) => FailureKind::Other,
        }
    }
}

impl From<lopdf::Error> for PdfSqueezeError {
    fn from(e: lopdf::Error) -> Self {
        Self::LoadFailure(e.to_string())
    }
}

impl From<serde_yml::Error> for PdfSqueezeError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for PdfSqueezeError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for PdfSqueezeError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodingFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfSqueezeError>;
