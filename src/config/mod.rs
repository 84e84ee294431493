pub mod merged;
pub mod profile;
pub mod settings;

use settings::Settings;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.yaml";

/// Settings lookup order:
///
/// 1. `explicit` path (must exist)
/// 2. `settings.yaml` next to the input document
/// 3. `$XDG_CONFIG_HOME/pdf_squeeze/settings.yaml` (or `~/.config/...`)
/// 4. built-in defaults
pub fn load_settings(explicit: Option<&Path>, input: Option<&Path>) -> crate::error::Result<Settings> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(crate::error::PdfSqueezeError::config(format!(
                "settings file {} does not exist",
                path.display()
            )));
        }
        return Settings::from_file(path);
    }

    let beside_input = input
        .and_then(Path::parent)
        .map(|dir| dir.join(SETTINGS_FILE));

    for candidate in beside_input.into_iter().chain(user_settings_path()) {
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading settings");
            return Settings::from_file(&candidate);
        }
    }

    Ok(Settings::default())
}

/// pdfium library path for the whole run.
///
/// The library is bound once per process, so only process-wide settings
/// count: the `explicit` file, otherwise the user settings file. A
/// `settings.yaml` beside a document never selects the library.
pub fn pdfium_lib_path(explicit: Option<&Path>) -> crate::error::Result<Option<PathBuf>> {
    Ok(load_settings(explicit, None)?.pdfium_lib_path)
}

fn user_settings_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("pdf_squeeze").join(SETTINGS_FILE))
}
