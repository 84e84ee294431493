use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

const PREFIX: &str = ".pdf_squeeze-";

/// Scratch directory for one job's intermediate files, created next to the
/// source document so the final move stays on one filesystem. Everything in
/// it is deleted when the workspace is closed or dropped.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn beside(source: &Path) -> crate::error::Result<Self> {
        let parent = parent_dir(source);
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Deletes the workspace, logging instead of failing.
    pub fn close(self) {
        let root = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(dir = %root.display(), "failed to remove workspace: {e}");
        }
    }
}

/// Directory containing `path`; `.` for bare file names.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_removed_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.pdf");
        let ws = TempWorkspace::beside(&source).unwrap();
        let root = ws.root().to_path_buf();
        std::fs::write(ws.file("candidate.pdf"), b"data").unwrap();
        assert!(root.starts_with(dir.path()));
        ws.close();
        assert!(!root.exists());
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(parent_dir(Path::new("doc.pdf")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/a/doc.pdf")), Path::new("/a"));
    }
}
