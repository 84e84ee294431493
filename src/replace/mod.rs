// Phase 11: ゴミ箱へ移動してから置換

pub mod access;
pub mod trash;

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::PdfSqueezeError;
use trash::{Trash, move_file};

/// Where the previous version of a replaced document went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub path: PathBuf,
    pub trashed: PathBuf,
}

/// Swaps `candidate` into `original`'s place.
///
/// 1. `original` is moved to `trash`. On failure nothing has changed.
/// 2. `candidate` is moved to `original`. On failure the original is only in
///    the trash, reported as [`PdfSqueezeError::ReplaceFailure`].
///
/// A candidate that was not consumed stays where it was; removing it is the
/// caller's job.
pub fn safe_replace(
    original: &Path,
    candidate: &Path,
    trash: &dyn Trash,
) -> crate::error::Result<Replaced> {
    if !candidate.is_file() {
        return Err(PdfSqueezeError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("candidate {} does not exist", candidate.display()),
        )));
    }

    let trashed = trash.trash(original)?;
    info!(original = %original.display(), trashed = %trashed.display(), "original moved to trash");

    if let Err(e) = move_file(candidate, original) {
        error!(
            original = %original.display(),
            trashed = %trashed.display(),
            "replacement failed after the original was trashed: {e}"
        );
        return Err(PdfSqueezeError::ReplaceFailure {
            trashed,
            reason: e.to_string(),
        });
    }

    Ok(Replaced {
        path: original.to_path_buf(),
        trashed,
    })
}
