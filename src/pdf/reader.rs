// Phase 2: PDF読込: ページ数、MediaBox/CropBox/Rotateの継承解決
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::PdfSqueezeError;
use crate::pdf::geometry::{PageBoxes, PdfRect};

/// 継承属性の解決で`/Parent`を辿る最大深さ。
const MAX_INHERITANCE_DEPTH: usize = 32;

/// ディスク上のPDFの読み取り専用ビュー: ページ数、ページ形状、バイトサイズ。
pub struct PdfReader {
    doc: Document,
    path: PathBuf,
    byte_size: u64,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfSqueezeError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let doc = Document::load(path)
            .map_err(|e| PdfSqueezeError::load(format!("{}: {e}", path.display())))?;
        Ok(Self {
            doc,
            path: path.to_path_buf(),
            byte_size: metadata.len(),
        })
    }

    /// 解析済みのlopdfドキュメントを返す。
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 開いた時点のファイルサイズを返す。
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 指定ページ(0-indexed)のMediaBox、CropBox、/Rotateを返す。
    ///
    /// MediaBoxは必須(直接または継承)。CropBoxと/Rotateは任意。
    pub fn page_boxes(&self, page_index: u32) -> crate::error::Result<PageBoxes> {
        let page_id = self.get_page_id(page_index)?;
        let page_dict = self.doc.get_dictionary(page_id)?;

        let content = self
            .inherited_rect(page_dict, b"MediaBox")?
            .ok_or_else(|| {
                PdfSqueezeError::load(format!("page {} has no MediaBox", page_index + 1))
            })?;
        if content.is_empty() {
            return Err(PdfSqueezeError::load(format!(
                "page {} has an empty MediaBox",
                page_index + 1
            )));
        }
        let crop = self.inherited_rect(page_dict, b"CropBox")?;
        let rotation = match self.inherited_entry(page_dict, b"Rotate")? {
            Some(obj) => obj
                .as_i64()
                .map_err(|_| PdfSqueezeError::load("invalid /Rotate entry"))?,
            None => 0,
        };

        Ok(PageBoxes::new(content, crop).with_rotation(rotation))
    }

    /// 矩形エントリをページ辞書から継承込みで取得する。
    fn inherited_rect(
        &self,
        page_dict: &Dictionary,
        key: &[u8],
    ) -> crate::error::Result<Option<PdfRect>> {
        let Some(obj) = self.inherited_entry(page_dict, key)? else {
            return Ok(None);
        };
        let rect = match obj {
            Object::Array(items) => PdfRect::from_array(items),
            _ => None,
        };
        match rect {
            Some(r) => Ok(Some(r)),
            None => Err(PdfSqueezeError::load(format!(
                "invalid /{} entry",
                String::from_utf8_lossy(key)
            ))),
        }
    }

    /// ページ辞書、続いて`/Parent`を辿ってエントリを探し、参照を解決して返す。
    fn inherited_entry<'a>(
        &'a self,
        page_dict: &'a Dictionary,
        key: &[u8],
    ) -> crate::error::Result<Option<&'a Object>> {
        let mut dict = page_dict;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(obj) = dict.get(key) {
                let (_, resolved) = self.doc.dereference(obj)?;
                return Ok(Some(resolved));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => {
                    dict = self.doc.get_dictionary(*parent_id)?;
                }
                _ => return Ok(None),
            }
        }
        Ok(None)
    }

    /// 指定ページ(0-indexed)のオブジェクトIDを返す。
    fn get_page_id(&self, page_index: u32) -> crate::error::Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages.get(&(page_index + 1)).copied().ok_or_else(|| {
            PdfSqueezeError::load(format!("page {} not found", page_index + 1))
        })
    }
}
