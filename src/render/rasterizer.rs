// Phase 5: page -> padded white surface -> JPEG

use image::imageops;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use tracing::debug;

use crate::config::merged::MergedConfig;
use crate::config::profile::{ColorMode, ColorSpaceKind, QualityTier};
use crate::error::PdfSqueezeError;
use crate::pdf::geometry::{PageBoxes, PdfRect};
use crate::render::jpeg::encode_surface;
use crate::render::{PixelSize, RenderRequest, SourceDocument, SurfaceTransform};

/// One re-encoded page.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// JPEG data.
    pub bytes: Vec<u8>,
    /// Size of the whole surface, padding included.
    pub pixel_size: PixelSize,
    /// Size of the rendered box inside the padding.
    pub content_pixel_size: PixelSize,
    /// Box the image stands for, in points.
    pub display_box: PdfRect,
    pub transform: SurfaceTransform,
    pub color_space: ColorSpaceKind,
}

/// Surface geometry computed for one page before anything is allocated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePlan {
    pub transform: SurfaceTransform,
    pub content: PixelSize,
    pub surface: PixelSize,
}

#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    padding: u32,
    max_surface_pixels: u64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Rasterizer::new(2, 100_000_000)
    }
}

impl Rasterizer {
    pub fn new(padding: u32, max_surface_pixels: u64) -> Self {
        Rasterizer {
            padding,
            max_surface_pixels,
        }
    }

    pub fn from_config(config: &MergedConfig) -> Self {
        Rasterizer::new(config.surface_padding, config.max_surface_pixels)
    }

    /// Scale and surface size for a page.
    ///
    /// Non-lossless tiers scale the shorter side of the effective box to the
    /// tier's target, so portrait and landscape pages get the same pixel
    /// budget. Returns a `RasterizationGap` for degenerate or oversized pages.
    pub fn plan(&self, boxes: &PageBoxes, tier: QualityTier) -> crate::error::Result<SurfacePlan> {
        let effective = boxes.effective();
        if effective.is_empty() {
            return Err(PdfSqueezeError::gap("page has an empty box"));
        }

        let scale = if tier.is_lossless() {
            1.0
        } else {
            let short = effective.width().min(effective.height());
            tier.profile().target_short_edge_px as f32 / short
        };
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PdfSqueezeError::gap(format!("invalid scale {scale}")));
        }

        let transform = SurfaceTransform {
            pad: self.padding,
            scale,
            origin: effective,
        };
        let (w, h) = transform.surface_extent();
        if !(w.is_finite() && h.is_finite()) || w < 1.0 || h < 1.0 || w * h > self.max_surface_pixels as f64 {
            return Err(PdfSqueezeError::gap(format!(
                "surface of {w}x{h} pixels cannot be allocated"
            )));
        }

        Ok(SurfacePlan {
            transform,
            content: transform.content_size(),
            surface: PixelSize::new(w as u32, h as u32),
        })
    }

    /// Renders and encodes one page.
    ///
    /// Every error returned here is a `RasterizationGap`: the caller omits the
    /// page and carries on.
    pub fn rasterize(
        &self,
        source: &dyn SourceDocument,
        page_index: u32,
        tier: QualityTier,
        mode: ColorMode,
    ) -> crate::error::Result<EncodedImage> {
        let boxes = source
            .page_boxes(page_index)
            .map_err(|e| PdfSqueezeError::gap(e.to_string()))?;
        self.rasterize_page(source, page_index, &boxes, tier, mode)
    }

    /// Same as [`Rasterizer::rasterize`] with the page geometry already known.
    pub fn rasterize_page(
        &self,
        source: &dyn SourceDocument,
        page_index: u32,
        boxes: &PageBoxes,
        tier: QualityTier,
        mode: ColorMode,
    ) -> crate::error::Result<EncodedImage> {
        let plan = self.plan(boxes, tier)?;
        let profile = tier.profile();

        let request = RenderRequest {
            size: plan.content,
            transform: plan.transform,
            grayscale: mode == ColorMode::Grayscale,
            rotation: boxes.rotation,
        };
        let mut rendered = source
            .render_page(page_index, &request)
            .map_err(|e| PdfSqueezeError::gap(e.to_string()))?;
        if rendered.width() == 0 || rendered.height() == 0 {
            return Err(PdfSqueezeError::gap("page rendered to an empty bitmap"));
        }

        // The image is placed in unrotated user space; viewers apply /Rotate again.
        rendered = unrotate(rendered, boxes.rotation);

        if rendered.width() != plan.content.width || rendered.height() != plan.content.height {
            rendered = rendered.resize_exact(
                plan.content.width,
                plan.content.height,
                profile.interpolation.filter(),
            );
        }

        let surface = compose_surface(&rendered, &plan, mode);
        let bytes = encode_surface(&surface, profile.jpeg_quality())
            .map_err(|e| PdfSqueezeError::gap(e.to_string()))?;

        debug!(
            page = page_index + 1,
            width = plan.surface.width,
            height = plan.surface.height,
            bytes = bytes.len(),
            "page rasterized"
        );

        Ok(EncodedImage {
            bytes,
            pixel_size: plan.surface,
            content_pixel_size: plan.content,
            display_box: plan.transform.origin,
            transform: plan.transform,
            color_space: mode.profile().color_space,
        })
    }
}

/// Turns a page rendered as displayed back into user-space orientation.
fn unrotate(rendered: DynamicImage, rotation: u16) -> DynamicImage {
    match rotation {
        90 => rendered.rotate270(),
        180 => rendered.rotate180(),
        270 => rendered.rotate90(),
        _ => rendered,
    }
}

/// Places the rendered page at `(pad, pad)` on an opaque white surface in the
/// mode's pixel format.
fn compose_surface(rendered: &DynamicImage, plan: &SurfacePlan, mode: ColorMode) -> DynamicImage {
    let pad = plan.transform.pad as i64;
    let rgba = rendered.to_rgba8();

    match mode {
        ColorMode::FullColor => {
            let mut surface =
                RgbaImage::from_pixel(plan.surface.width, plan.surface.height, Rgba([255, 255, 255, 255]));
            imageops::overlay(&mut surface, &rgba, pad, pad);
            DynamicImage::ImageRgba8(surface)
        }
        ColorMode::Grayscale => {
            // Flatten onto white first so transparent areas do not turn black.
            let mut flat = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
            imageops::overlay(&mut flat, &rgba, 0, 0);
            let luma = DynamicImage::ImageRgba8(flat).to_luma8();

            let mut surface = GrayImage::from_pixel(plan.surface.width, plan.surface.height, Luma([255]));
            imageops::replace(&mut surface, &luma, pad, pad);
            DynamicImage::ImageLuma8(surface)
        }
    }
}
