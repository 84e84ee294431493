// Quality tiers and color modes: static lookup tables, no side effects.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::PdfSqueezeError;

/// Named compression preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Structural optimization only; pages are never rasterized below 1:1.
    Lossless,
    Minimal,
    Light,
    #[default]
    Medium,
    Strong,
}

/// Resampling hint used when a rendered bitmap must be resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    High,
    Medium,
    Low,
}

impl Interpolation {
    pub fn filter(self) -> FilterType {
        match self {
            Interpolation::High => FilterType::Lanczos3,
            Interpolation::Medium => FilterType::Triangle,
            Interpolation::Low => FilterType::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityProfile {
    pub target_short_edge_px: u32,
    /// Lossy codec quality in `(0, 1]`.
    pub lossy_quality: f32,
    pub interpolation: Interpolation,
}

impl QualityProfile {
    /// The lossy quality on the JPEG 1-100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.lossy_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl QualityTier {
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Lossless,
        QualityTier::Minimal,
        QualityTier::Light,
        QualityTier::Medium,
        QualityTier::Strong,
    ];

    pub fn profile(self) -> QualityProfile {
        let (target_short_edge_px, lossy_quality, interpolation) = match self {
            QualityTier::Lossless => (2400, 1.0, Interpolation::High),
            QualityTier::Minimal => (1440, 0.9, Interpolation::High),
            QualityTier::Light => (1080, 0.8, Interpolation::High),
            QualityTier::Medium => (720, 0.6, Interpolation::Medium),
            QualityTier::Strong => (480, 0.4, Interpolation::Low),
        };
        QualityProfile {
            target_short_edge_px,
            lossy_quality,
            interpolation,
        }
    }

    pub fn is_lossless(self) -> bool {
        self == QualityTier::Lossless
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Lossless => "lossless",
            QualityTier::Minimal => "minimal",
            QualityTier::Light => "light",
            QualityTier::Medium => "medium",
            QualityTier::Strong => "strong",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = PdfSqueezeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PdfSqueezeError::config(format!(
                    "unknown quality '{s}' (expected lossless, minimal, light, medium or strong)"
                ))
            })
    }
}

/// Target pixel format of the rasterization surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    #[serde(rename = "full")]
    FullColor,
    #[serde(rename = "gray")]
    Grayscale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorSpaceKind {
    DeviceRgb,
    DeviceGray,
}

impl ColorSpaceKind {
    /// PDF name of the color space.
    pub fn pdf_name(self) -> &'static str {
        match self {
            ColorSpaceKind::DeviceRgb => "DeviceRGB",
            ColorSpaceKind::DeviceGray => "DeviceGray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorProfile {
    pub channels: u8,
    pub has_alpha: bool,
    pub color_space: ColorSpaceKind,
}

impl ColorMode {
    pub fn profile(self) -> ColorProfile {
        match self {
            ColorMode::FullColor => ColorProfile {
                channels: 4,
                has_alpha: true,
                color_space: ColorSpaceKind::DeviceRgb,
            },
            ColorMode::Grayscale => ColorProfile {
                channels: 1,
                has_alpha: false,
                color_space: ColorSpaceKind::DeviceGray,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::FullColor => "full",
            ColorMode::Grayscale => "gray",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = PdfSqueezeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "fullcolor" | "color" | "rgb" => Ok(ColorMode::FullColor),
            "gray" | "grey" | "grayscale" => Ok(ColorMode::Grayscale),
            _ => Err(PdfSqueezeError::config(format!(
                "unknown color mode '{s}' (expected full or gray)"
            ))),
        }
    }
}
