pub mod jpeg;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod rasterizer;

use std::path::Path;

use image::DynamicImage;
use serde::Serialize;

use crate::pdf::geometry::{PageBoxes, PdfRect};

/// Width and height of a bitmap in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        PixelSize { width, height }
    }

    pub fn short_edge(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Mapping from PDF user space onto a padded pixel surface.
///
/// Equivalent to: translate by `(pad, pad)`, scale by `scale`, translate by
/// `(-origin.x0, -origin.y0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceTransform {
    pub pad: u32,
    pub scale: f32,
    pub origin: PdfRect,
}

impl SurfaceTransform {
    /// Pixel size of the rendered box, without padding.
    pub fn content_size(&self) -> PixelSize {
        PixelSize::new(
            (self.origin.width() * self.scale).round().max(1.0) as u32,
            (self.origin.height() * self.scale).round().max(1.0) as u32,
        )
    }

    /// `ceil(w * scale + 2 * pad) x ceil(h * scale + 2 * pad)`, computed in
    /// `f64` so that oversized pages can be rejected before allocating.
    pub fn surface_extent(&self) -> (f64, f64) {
        let pad2 = 2.0 * self.pad as f64;
        (
            (self.origin.width() as f64 * self.scale as f64 + pad2).ceil(),
            (self.origin.height() as f64 * self.scale as f64 + pad2).ceil(),
        )
    }

    /// Maps a user-space point onto the surface (y up, origin bottom-left).
    pub fn to_surface(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.pad as f32 + (x - self.origin.x0) * self.scale,
            self.pad as f32 + (y - self.origin.y0) * self.scale,
        )
    }

    /// `cm` operands that draw a `surface`-sized image back onto the origin
    /// box, with the padding falling outside it.
    pub fn image_matrix(&self, surface: PixelSize) -> [f32; 6] {
        let w = surface.width as f32 / self.scale;
        let h = surface.height as f32 / self.scale;
        let pad = self.pad as f32 / self.scale;
        [
            w,
            0.0,
            0.0,
            h,
            self.origin.x0 - pad,
            self.origin.y1 + pad - h,
        ]
    }
}

/// What a backend is asked to draw for one page.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest {
    /// Size of the effective box in pixels, before page rotation.
    pub size: PixelSize,
    pub transform: SurfaceTransform,
    pub grayscale: bool,
    /// Page `/Rotate` in degrees clockwise.
    pub rotation: u16,
}

impl RenderRequest {
    /// Size of the page as a viewer shows it: `size` with width and height
    /// swapped for quarter turns.
    pub fn display_size(&self) -> PixelSize {
        if self.rotation % 180 == 90 {
            PixelSize::new(self.size.height, self.size.width)
        } else {
            self.size
        }
    }
}

/// A loaded document the pipeline can inspect and render.
pub trait SourceDocument {
    fn path(&self) -> &Path;

    /// Size in bytes of the file the document was loaded from.
    fn byte_size(&self) -> u64;

    fn page_count(&self) -> u32;

    /// Geometry of the page at `page_index` (0-indexed).
    fn page_boxes(&self, page_index: u32) -> crate::error::Result<PageBoxes>;

    /// Renders the effective box of the page as a viewer shows it, with
    /// `/Rotate` applied, at [`RenderRequest::display_size`]. The result may
    /// contain transparency; the caller flattens it onto white.
    fn render_page(
        &self,
        page_index: u32,
        request: &RenderRequest,
    ) -> crate::error::Result<DynamicImage>;
}

/// Opens documents from disk.
pub trait DocumentLoader {
    /// Fails with [`crate::error::PdfSqueezeError::NotFound`] when `path`
    /// does not exist and `LoadFailure` when it cannot be parsed.
    fn load<'a>(&'a self, path: &Path) -> crate::error::Result<Box<dyn SourceDocument + 'a>>;
}
