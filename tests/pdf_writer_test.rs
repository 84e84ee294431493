use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::{Document, Object, ObjectId};
use pdf_squeeze::config::profile::{ColorMode, QualityTier};
use pdf_squeeze::pdf::geometry::{PageBoxes, PdfRect};
use pdf_squeeze::pdf::reader::PdfReader;
use pdf_squeeze::pdf::writer::{
    PAGE_IMAGE_NAME, PageImageWriter, RebuildPage, page_boxes_of, rebuild, save_to_bytes,
    save_to_file,
};
use pdf_squeeze::render::jpeg::encode_surface;
use pdf_squeeze::render::rasterizer::{EncodedImage, Rasterizer};

/// Encodes a blank page surface the way the rasterizer would.
fn encoded(boxes: &PageBoxes, mode: ColorMode) -> EncodedImage {
    let plan = Rasterizer::default()
        .plan(boxes, QualityTier::Strong)
        .expect("plan");
    let surface = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        plan.surface.width,
        plan.surface.height,
        Rgba([255, 255, 255, 255]),
    ));
    let surface = match mode {
        ColorMode::FullColor => surface,
        ColorMode::Grayscale => DynamicImage::ImageLuma8(surface.to_luma8()),
    };
    EncodedImage {
        bytes: encode_surface(&surface, 40).expect("encode"),
        pixel_size: plan.surface,
        content_pixel_size: plan.content,
        display_box: plan.transform.origin,
        transform: plan.transform,
        color_space: mode.profile().color_space,
    }
}

fn page(index: u32, boxes: PageBoxes) -> RebuildPage {
    RebuildPage {
        index,
        image: encoded(&boxes, ColorMode::FullColor),
        boxes,
    }
}

fn letter() -> PageBoxes {
    PageBoxes::new(PdfRect::new(0.0, 0.0, 612.0, 792.0), None)
}

fn page_image(doc: &Document, page_id: ObjectId) -> lopdf::Stream {
    let page = doc.get_dictionary(page_id).expect("page dict");
    let resources = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .expect("resources");
    let xobjects = resources
        .get(b"XObject")
        .and_then(Object::as_dict)
        .expect("xobjects");
    let image_id = xobjects
        .get(PAGE_IMAGE_NAME.as_bytes())
        .and_then(Object::as_reference)
        .expect("image reference");
    doc.get_object(image_id)
        .and_then(Object::as_stream)
        .expect("image stream")
        .clone()
}

// ============================================================
// Content stream
// ============================================================

#[test]
fn test_build_image_content_stream() {
    let content =
        PageImageWriter::build_image_content_stream("Im0", [612.0, 0.0, 0.0, 792.0, 0.0, 0.0]);
    assert_eq!(content, b"q 612 0 0 792 0 0 cm /Im0 Do Q");
}

#[test]
fn test_build_image_content_stream_fractional_operands() {
    let content =
        PageImageWriter::build_image_content_stream("Im0", [0.5, 0.0, 0.0, 1.25, -1.7, 3.0]);
    assert_eq!(content, b"q 0.5 0 0 1.25 -1.7 3 cm /Im0 Do Q");
}

// ============================================================
// Page boxes
// ============================================================

#[test]
fn test_boxes_are_preserved() {
    let crop = PdfRect::new(36.0, 36.0, 576.0, 756.0);
    let boxes = PageBoxes::new(letter().content, Some(crop));
    let doc = rebuild(vec![page(0, boxes)], None);

    assert_eq!(page_boxes_of(&doc), vec![boxes]);
}

#[test]
fn test_empty_crop_box_is_dropped() {
    let boxes = PageBoxes::new(
        letter().content,
        Some(PdfRect::new(100.0, 100.0, 100.0, 300.0)),
    );
    let doc = rebuild(vec![page(0, boxes)], None);

    let written = page_boxes_of(&doc);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].content, letter().content);
    assert_eq!(written[0].crop, None);
}

#[test]
fn test_crop_box_is_clipped_to_media_box() {
    let boxes = PageBoxes::new(
        letter().content,
        Some(PdfRect::new(-100.0, 0.0, 612.0, 900.0)),
    );
    let doc = rebuild(vec![page(0, boxes)], None);

    let written = page_boxes_of(&doc);
    assert_eq!(written[0].crop, Some(letter().content));
}

#[test]
fn test_rotation_is_written_and_reloaded() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("rotated.pdf");
    let rotated = letter().with_rotation(90);
    let mut doc = rebuild(vec![page(0, rotated), page(1, letter())], None);
    save_to_file(&mut doc, &path).expect("save");

    let reader = PdfReader::open(&path).expect("reopen");
    assert_eq!(reader.page_boxes(0).expect("page 1").rotation, 90);
    assert_eq!(reader.page_boxes(1).expect("page 2").rotation, 0);

    let page_ids: Vec<ObjectId> = reader.document().get_pages().values().copied().collect();
    let unrotated = reader.document().get_dictionary(page_ids[1]).expect("page 2 dict");
    assert!(unrotated.get(b"Rotate").is_err(), "no /Rotate on upright pages");
}

#[test]
fn test_non_zero_origin_survives_save() {
    let boxes = PageBoxes::new(PdfRect::new(-10.0, 20.5, 600.0, 800.25), None);
    let mut doc = rebuild(vec![page(0, boxes)], None);
    let bytes = save_to_bytes(&mut doc).expect("save");

    let loaded = Document::load_mem(&bytes).expect("reload");
    assert_eq!(page_boxes_of(&loaded), vec![boxes]);
}

// ============================================================
// Page order and gaps
// ============================================================

#[test]
fn test_pages_follow_source_order_with_gaps() {
    let a = PageBoxes::new(PdfRect::new(0.0, 0.0, 100.0, 200.0), None);
    let c = PageBoxes::new(PdfRect::new(0.0, 0.0, 300.0, 400.0), None);
    // Handed over out of order; index 1 is missing.
    let doc = rebuild(vec![page(2, c), page(0, a)], None);

    assert_eq!(doc.get_pages().len(), 2);
    assert_eq!(page_boxes_of(&doc), vec![a, c]);
}

#[test]
fn test_no_pages_gives_empty_page_tree() {
    let doc = rebuild(Vec::new(), None);
    assert!(doc.get_pages().is_empty());
}

// ============================================================
// Image XObject
// ============================================================

#[test]
fn test_image_xobject_dictionary() {
    let boxes = letter();
    let image = encoded(&boxes, ColorMode::Grayscale);
    let (width, height) = (image.pixel_size.width, image.pixel_size.height);
    let doc = rebuild(
        vec![RebuildPage {
            index: 0,
            image,
            boxes,
        }],
        None,
    );

    let page_id = *doc.get_pages().get(&1).expect("page 1");
    let stream = page_image(&doc, page_id);
    let dict = &stream.dict;
    assert_eq!(dict.get(b"Width").and_then(Object::as_i64).expect("width"), width as i64);
    assert_eq!(dict.get(b"Height").and_then(Object::as_i64).expect("height"), height as i64);
    assert_eq!(
        dict.get(b"ColorSpace").and_then(Object::as_name).expect("colorspace"),
        b"DeviceGray"
    );
    assert_eq!(
        dict.get(b"Filter").and_then(Object::as_name).expect("filter"),
        b"DCTDecode"
    );
    assert_eq!(&stream.content[..2], &[0xFF, 0xD8], "JPEG SOI marker");
}

#[test]
fn test_content_stream_draws_the_image() {
    let doc = rebuild(vec![page(0, letter())], None);
    let page_id = *doc.get_pages().get(&1).expect("page 1");

    let content = doc.get_page_content(page_id).expect("page content");
    let text = String::from_utf8(content).expect("ascii content");
    assert!(text.starts_with("q "), "{text}");
    assert!(text.ends_with(&format!("cm /{PAGE_IMAGE_NAME} Do Q")), "{text}");
}

// ============================================================
// Document metadata and saving
// ============================================================

#[test]
fn test_info_dictionary() {
    let mut doc = rebuild(vec![page(0, letter())], Some("report.pdf"));
    let bytes = save_to_bytes(&mut doc).expect("save");
    let loaded = Document::load_mem(&bytes).expect("reload");

    let info_id = loaded
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .expect("info reference");
    let info = loaded.get_dictionary(info_id).expect("info dict");

    let text = |key: &[u8]| match info.get(key) {
        Ok(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(text(b"Title"), "report.pdf");
    assert!(text(b"Producer").starts_with("pdf_squeeze "));
    assert!(text(b"Creator").starts_with("pdf_squeeze "));
}

#[test]
fn test_save_to_file_reports_size_and_reloads() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("out.pdf");
    let mut doc = rebuild(vec![page(0, letter()), page(1, letter())], None);

    let size = save_to_file(&mut doc, &path).expect("save");
    assert_eq!(size, std::fs::metadata(&path).expect("metadata").len());

    let reader = PdfReader::open(&path).expect("reopen");
    assert_eq!(reader.page_count(), 2);
    assert_eq!(reader.page_boxes(1).expect("boxes"), letter());
}

#[test]
fn test_save_to_missing_directory_is_encoding_failure() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("missing").join("out.pdf");
    let mut doc = rebuild(vec![page(0, letter())], None);

    let err = save_to_file(&mut doc, &path).unwrap_err();
    assert!(matches!(
        err,
        pdf_squeeze::error::PdfSqueezeError::EncodingFailure(_)
    ));
}
