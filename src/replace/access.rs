use std::path::Path;

use crate::error::PdfSqueezeError;

/// Grants (or refuses) write access to the directory holding a document.
pub trait WriteAccess {
    fn ensure_writable(&self, dir: &Path) -> crate::error::Result<()>;
}

/// Checks access by creating and dropping an anonymous file in the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriteAccess;

impl WriteAccess for FsWriteAccess {
    fn ensure_writable(&self, dir: &Path) -> crate::error::Result<()> {
        if !dir.is_dir() {
            return Err(PdfSqueezeError::permission(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        tempfile::tempfile_in(dir).map(drop).map_err(|e| {
            PdfSqueezeError::permission(format!("no write access to {}: {e}", dir.display()))
        })
    }
}
