// Phase 6: pdfium-render wrapper: page -> DynamicImage (in-memory only)

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::PdfSqueezeError;
use crate::pdf::geometry::PageBoxes;
use crate::pdf::reader::PdfReader;
use crate::render::{DocumentLoader, RenderRequest, SourceDocument};

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `configured` (the `pdfium_lib_path` setting)
///
/// `None` means "use the system library".
fn resolve_pdfium_lib_path(configured: Option<&Path>) -> crate::error::Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(Some(p));
        }
        return Err(PdfSqueezeError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    match configured {
        Some(p) if p.exists() => Ok(Some(p.to_path_buf())),
        Some(p) => Err(PdfSqueezeError::render(format!(
            "pdfium_lib_path '{}' does not exist",
            p.display()
        ))),
        None => Ok(None),
    }
}

/// Loads documents with lopdf for geometry and pdfium for pixels.
pub struct PdfiumLoader {
    pdfium: Pdfium,
}

impl PdfiumLoader {
    /// Binds the pdfium shared library.
    pub fn new(configured_lib: Option<&Path>) -> crate::error::Result<Self> {
        let bindings = match resolve_pdfium_lib_path(configured_lib)? {
            Some(lib_path) => {
                let lib_path_str = lib_path.to_str().ok_or_else(|| {
                    PdfSqueezeError::render("pdfium library path contains non-UTF-8 characters")
                })?;
                debug!(path = lib_path_str, "binding pdfium");
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?
            }
            None => Pdfium::bind_to_system_library().map_err(|e| {
                PdfSqueezeError::render(format!(
                    "pdfium library not found ({e}): set PDFIUM_DYNAMIC_LIB_PATH or pdfium_lib_path"
                ))
            })?,
        };
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl DocumentLoader for PdfiumLoader {
    fn load<'a>(&'a self, path: &Path) -> crate::error::Result<Box<dyn SourceDocument + 'a>> {
        let reader = PdfReader::open(path)?;
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PdfSqueezeError::load(format!("{}: {e}", path.display())))?;
        Ok(Box::new(PdfiumSource { reader, document }))
    }
}

struct PdfiumSource<'a> {
    reader: PdfReader,
    document: PdfDocument<'a>,
}

impl SourceDocument for PdfiumSource<'_> {
    fn path(&self) -> &Path {
        self.reader.path()
    }

    fn byte_size(&self) -> u64 {
        self.reader.byte_size()
    }

    fn page_count(&self) -> u32 {
        self.reader.page_count()
    }

    fn page_boxes(&self, page_index: u32) -> crate::error::Result<PageBoxes> {
        self.reader.page_boxes(page_index)
    }

    /// pdfium draws the page's visible area (its CropBox clipped to the
    /// MediaBox) with `/Rotate` applied, so the target is the display size.
    fn render_page(
        &self,
        page_index: u32,
        request: &RenderRequest,
    ) -> crate::error::Result<DynamicImage> {
        let page_index_u16 = u16::try_from(page_index)
            .map_err(|_| PdfSqueezeError::render("page index exceeds u16 range"))?;

        let page = self.document.pages().get(page_index_u16)?;

        let target = request.display_size();
        let config = PdfRenderConfig::new()
            .set_target_width(target.width as i32)
            .set_target_height(target.height as i32)
            .use_grayscale_rendering(request.grayscale);

        let bitmap = page.render_with_config(&config)?;

        Ok(bitmap.as_image())
    }
}
