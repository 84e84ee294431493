use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::PdfSqueezeError;

/// Moves files somewhere they can be recovered from.
pub trait Trash {
    /// Returns where `path` ended up.
    fn trash(&self, path: &Path) -> crate::error::Result<PathBuf>;
}

/// A directory used as a recycle bin, optionally with a freedesktop.org
/// `info/` directory recording where each file came from.
#[derive(Debug, Clone)]
pub struct DirectoryTrash {
    dir: PathBuf,
    info_dir: Option<PathBuf>,
}

impl DirectoryTrash {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            info_dir: None,
        }
    }

    /// Writes a `<name>.trashinfo` into `info_dir` for every trashed file, so
    /// desktop file managers can restore it.
    pub fn with_info_dir(mut self, info_dir: impl Into<PathBuf>) -> Self {
        self.info_dir = Some(info_dir.into());
        self
    }

    /// `$XDG_DATA_HOME/Trash/files`, or `~/.local/share/Trash/files`.
    pub fn user_trash() -> Option<Self> {
        let data_home = std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
        let trash = data_home.join("Trash");
        Some(Self::new(trash.join("files")).with_info_dir(trash.join("info")))
    }

    /// User trash when it can be located, otherwise `.trash` beside `near`.
    pub fn for_file(near: &Path) -> Self {
        Self::user_trash().unwrap_or_else(|| {
            let parent = near.parent().unwrap_or_else(|| Path::new("."));
            Self::new(parent.join(".trash"))
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn info_dir(&self) -> Option<&Path> {
        self.info_dir.as_deref()
    }

    /// First free name in the trash: `a.pdf`, `a 2.pdf`, `a 3.pdf`, ...
    /// A name is taken when either the file or its info entry exists.
    fn free_target(&self, file_name: &str) -> PathBuf {
        if self.is_free(file_name) {
            return self.dir.join(file_name);
        }
        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };
        (2u32..)
            .map(|n| match ext {
                Some(ext) => format!("{stem} {n}.{ext}"),
                None => format!("{stem} {n}"),
            })
            .find(|name| self.is_free(name))
            .map(|name| self.dir.join(name))
            .unwrap_or_else(|| self.dir.join(file_name))
    }

    fn is_free(&self, name: &str) -> bool {
        !self.dir.join(name).exists()
            && self
                .info_dir
                .as_ref()
                .is_none_or(|info| !info.join(info_file_name(name)).exists())
    }

    /// Creates the `.trashinfo` entry for `original` stored as `target`.
    fn write_info(&self, info_dir: &Path, original: &Path, target: &Path) -> crate::error::Result<PathBuf> {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PdfSqueezeError::trash(format!("{} has no file name", target.display())))?;
        let info_path = info_dir.join(info_file_name(name));
        let absolute = std::path::absolute(original)?;
        let body = format!(
            "[Trash Info]\nPath={}\nDeletionDate={}\n",
            encode_trash_path(&absolute),
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        );

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&info_path)
            .map_err(|e| {
                PdfSqueezeError::trash(format!("cannot create {}: {e}", info_path.display()))
            })?;
        if let Err(e) = file.write_all(body.as_bytes()) {
            let _ = std::fs::remove_file(&info_path);
            return Err(PdfSqueezeError::trash(format!(
                "cannot write {}: {e}",
                info_path.display()
            )));
        }
        Ok(info_path)
    }
}

fn info_file_name(name: &str) -> String {
    format!("{name}.trashinfo")
}

/// Percent-encodes an absolute path for the `Path=` key. Bytes outside the
/// unreserved set (and `/`) are escaped.
fn encode_trash_path(path: &Path) -> String {
    let mut out = String::new();
    for &b in path.as_os_str().as_encoded_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'/' | b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

impl Trash for DirectoryTrash {
    fn trash(&self, path: &Path) -> crate::error::Result<PathBuf> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PdfSqueezeError::trash(format!("{} has no file name", path.display())))?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PdfSqueezeError::trash(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let target = self.free_target(file_name);
        let info = match &self.info_dir {
            Some(info_dir) => {
                std::fs::create_dir_all(info_dir).map_err(|e| {
                    PdfSqueezeError::trash(format!("cannot create {}: {e}", info_dir.display()))
                })?;
                Some(self.write_info(info_dir, path, &target)?)
            }
            None => None,
        };

        if let Err(e) = move_file(path, &target) {
            if let Some(info) = info {
                let _ = std::fs::remove_file(info);
            }
            return Err(PdfSqueezeError::trash(format!(
                "cannot move {} to {}: {e}",
                path.display(),
                target.display()
            )));
        }

        debug!(from = %path.display(), to = %target.display(), "moved to trash");
        Ok(target)
    }
}

/// Renames `from` to `to`, falling back to copy-and-delete across devices.
pub(crate) fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if let Err(copy_err) = std::fs::copy(from, to) {
                let _ = std::fs::remove_file(to);
                return Err(if copy_err.kind() == std::io::ErrorKind::NotFound {
                    rename_err
                } else {
                    copy_err
                });
            }
            std::fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_target_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        let trash = DirectoryTrash::new(dir.path());
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("a 2.pdf"), b"x").unwrap();
        assert_eq!(trash.free_target("a.pdf"), dir.path().join("a 3.pdf"));
        assert_eq!(trash.free_target("b.pdf"), dir.path().join("b.pdf"));
    }

    #[test]
    fn free_target_skips_names_with_info_entries() {
        let files = tempfile::tempdir().unwrap();
        let info = tempfile::tempdir().unwrap();
        let trash = DirectoryTrash::new(files.path()).with_info_dir(info.path());
        std::fs::write(info.path().join("a.pdf.trashinfo"), b"x").unwrap();
        assert_eq!(trash.free_target("a.pdf"), files.path().join("a 2.pdf"));
    }

    #[test]
    fn trash_path_is_percent_encoded() {
        assert_eq!(
            encode_trash_path(Path::new("/home/u/My Docs/r%1.pdf")),
            "/home/u/My%20Docs/r%251.pdf"
        );
        assert_eq!(encode_trash_path(Path::new("/tmp/é.pdf")), "/tmp/%C3%A9.pdf");
    }
}
