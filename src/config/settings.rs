use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::config::profile::{ColorMode, QualityTier};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_quality")]
    pub quality: QualityTier,
    #[serde(deserialize_with = "lenient_color_mode")]
    pub color_mode: ColorMode,
    /// Run the lossless optimization stage before rasterizing.
    pub optimize: bool,
    /// Yield the thread after this many pages (0 disables yielding).
    pub yield_every: usize,
    /// White border added around each rendered page, in pixels.
    pub surface_padding: u32,
    /// Pages whose surface would exceed this many pixels are skipped.
    pub max_surface_pixels: u64,
    pub trash_dir: Option<PathBuf>,
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            quality: QualityTier::Medium,
            color_mode: ColorMode::FullColor,
            optimize: true,
            yield_every: 4,
            surface_padding: 2,
            max_surface_pixels: 100_000_000,
            trash_dir: None,
            pdfium_lib_path: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::PdfSqueezeError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Unknown persisted quality values fall back to the default tier.
fn lenient_quality<'de, D>(deserializer: D) -> Result<QualityTier, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.parse().unwrap_or_else(|e| {
        warn!("{e}; using '{}'", QualityTier::default());
        QualityTier::default()
    }))
}

fn lenient_color_mode<'de, D>(deserializer: D) -> Result<ColorMode, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.parse().unwrap_or_else(|e| {
        warn!("{e}; using '{}'", ColorMode::default());
        ColorMode::default()
    }))
}
