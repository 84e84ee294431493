use std::path::PathBuf;

use crate::config::profile::{ColorMode, QualityTier};
use crate::config::settings::Settings;

/// Per-invocation overrides, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub quality: Option<QualityTier>,
    pub color_mode: Option<ColorMode>,
    pub optimize: Option<bool>,
    pub trash_dir: Option<PathBuf>,
}

/// Effective configuration of one job. Captured when the job is accepted and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedConfig {
    pub quality: QualityTier,
    pub color_mode: ColorMode,
    pub optimize: bool,
    pub yield_every: usize,
    pub surface_padding: u32,
    pub max_surface_pixels: u64,
    pub trash_dir: Option<PathBuf>,
}

impl MergedConfig {
    /// Overrides that are `Some` win; everything else comes from `settings`.
    pub fn new(settings: &Settings, overrides: &Overrides) -> Self {
        MergedConfig {
            quality: overrides.quality.unwrap_or(settings.quality),
            color_mode: overrides.color_mode.unwrap_or(settings.color_mode),
            optimize: overrides.optimize.unwrap_or(settings.optimize),
            yield_every: settings.yield_every,
            surface_padding: settings.surface_padding,
            max_surface_pixels: settings.max_surface_pixels,
            trash_dir: overrides
                .trash_dir
                .clone()
                .or_else(|| settings.trash_dir.clone()),
        }
    }
}

impl Default for MergedConfig {
    fn default() -> Self {
        Self::new(&Settings::default(), &Overrides::default())
    }
}
