// Phase 7: ページ画像XObject構築、元のMediaBox/CropBox/Rotate、コンテンツストリーム組立

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::pdf::geometry::{PageBoxes, PdfRect};
use crate::render::rasterizer::EncodedImage;

/// 各ページの`/XObject`リソースにおけるページ画像の名前。
pub const PAGE_IMAGE_NAME: &str = "Im0";

const PRODUCER: &str = concat!("pdf_squeeze ", env!("CARGO_PKG_VERSION"));

/// [`rebuild`]に渡す1ページ分のエントリ。
#[derive(Debug, Clone)]
pub struct RebuildPage {
    /// 元ドキュメント内のページ位置(0-indexed)。
    pub index: u32,
    pub image: EncodedImage,
    pub boxes: PageBoxes,
}

/// 各ページが1枚のJPEG画像からなるPDFを構築する。
pub struct PageImageWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PageImageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageImageWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// JPEG画像XObjectを追加する。
    ///
    /// 戻り値はXObjectのオブジェクトID。
    pub fn add_image_xobject(&mut self, image: &EncodedImage) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.pixel_size.width as i64,
            "Height" => image.pixel_size.height as i64,
            "ColorSpace" => image.color_space.pdf_name(),
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        let stream = Stream::new(dict, image.bytes.clone());
        self.doc.add_object(Object::Stream(stream))
    }

    /// 画像を描画するコンテンツストリームを生成する。
    ///
    /// `q a b c d e f cm /Name Do Q`
    pub fn build_image_content_stream(name: &str, matrix: [f32; 6]) -> Vec<u8> {
        let operands: Vec<String> = matrix.iter().map(|v| format_number(*v)).collect();
        format!("q {} cm /{} Do Q", operands.join(" "), escape_name(name)).into_bytes()
    }

    /// `image`を表示するページを追加する。
    ///
    /// MediaBoxは元のコンテンツボックス、CropBoxはMediaBoxで切り詰めた元の
    /// CropBox(有効な場合のみ)、/Rotateは元ページの回転。
    pub fn add_page(&mut self, image: &EncodedImage, boxes: &PageBoxes) -> ObjectId {
        let image_id = self.add_image_xobject(image);

        let mut xobjects = Dictionary::new();
        xobjects.set(PAGE_IMAGE_NAME, Object::Reference(image_id));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(xobjects),
        };

        let matrix = image.transform.image_matrix(image.pixel_size);
        let content = Self::build_image_content_stream(PAGE_IMAGE_NAME, matrix);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content)));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => boxes.content.to_object(),
            "Resources" => resources,
            "Contents" => content_id,
        };
        if let Some(crop) = boxes.usable_crop() {
            page.set("CropBox", crop.to_object());
        }
        if boxes.rotation != 0 {
            page.set("Rotate", boxes.rotation as i64);
        }

        let page_id = self.doc.add_object(page);
        self.kids.push(page_id.into());
        page_id
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// ページツリー、カタログ、Info辞書を書き込み、完成したドキュメントを返す。
    pub fn finish(mut self, title: Option<&str>) -> Document {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
            "Creator" => Object::string_literal(PRODUCER),
        };
        if let Some(title) = title {
            info.set("Title", Object::string_literal(title));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        crate::pdf::optimizer::compress_streams(&mut self.doc);
        self.doc
    }
}

/// 再エンコード済みページをインデックス順に新しいドキュメントへ組み立てる。
/// 欠けたインデックスは出力に含まれない。
pub fn rebuild(pages: impl IntoIterator<Item = RebuildPage>, title: Option<&str>) -> Document {
    let mut pages: Vec<RebuildPage> = pages.into_iter().collect();
    pages.sort_by_key(|p| p.index);

    let mut writer = PageImageWriter::new();
    for page in &pages {
        writer.add_page(&page.image, &page.boxes);
    }
    writer.finish(title)
}

/// PDFドキュメントをバイト列として出力する。
pub fn save_to_bytes(doc: &mut Document) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| crate::error::PdfSqueezeError::encode(e.to_string()))?;
    Ok(buf)
}

/// PDFドキュメントを`path`に書き出し、書き込んだバイト数を返す。
pub fn save_to_file(doc: &mut Document, path: &Path) -> crate::error::Result<u64> {
    let bytes = save_to_bytes(doc)?;
    std::fs::write(path, &bytes)
        .map_err(|e| crate::error::PdfSqueezeError::encode(format!("{}: {e}", path.display())))?;
    Ok(bytes.len() as u64)
}

/// 再構築したドキュメントの全ページのボックスと回転をページ順に読む。
pub fn page_boxes_of(doc: &Document) -> Vec<PageBoxes> {
    doc.get_pages()
        .values()
        .filter_map(|&id| {
            let dict = doc.get_dictionary(id).ok()?;
            let rect = |key: &[u8]| {
                dict.get(key)
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .and_then(|a| PdfRect::from_array(a))
            };
            let rotation = dict.get(b"Rotate").and_then(|o| o.as_i64()).unwrap_or(0);
            Some(PageBoxes::new(rect(b"MediaBox")?, rect(b"CropBox")).with_rotation(rotation))
        })
        .collect()
}

/// 小数点以下最大4桁の最短表記。
fn format_number(v: f32) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// ISO 32000 7.3.5に従いPDF名をエスケープする(区切り文字、空白、`#`)。
fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        let regular = (0x21..=0x7E).contains(&b)
            && !matches!(
                b,
                b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%'
            );
        if regular {
            out.push(b as char);
        } else {
            out.push_str(&format!("#{:02X}", b));
        }
    }
    out
}
