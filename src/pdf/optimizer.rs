// Phase 9: 重複ストリーム統合、FlateDecode圧縮、孤立オブジェクト除去、番号振り直し

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::PdfSqueezeError;

/// 最適化1回分の集計。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    pub merged_streams: usize,
    pub compressed_streams: usize,
    pub pruned_objects: usize,
}

/// 入力より厳密に小さいコピー。
#[derive(Debug, Clone)]
pub struct OptimizedDocument {
    pub path: PathBuf,
    pub byte_size: u64,
    pub input_size: u64,
    pub report: OptimizeReport,
}

#[derive(Debug, Clone)]
pub enum OptimizeOutcome {
    Optimized(OptimizedDocument),
    /// 書き直したファイルが小さくならなかったため削除済み。
    NotSmaller { input_size: u64, output_size: u64 },
}

/// 未圧縮のストリームにFlateDecode圧縮を適用する。
///
/// フィルタ付きのストリームはそのまま。圧縮で小さくなる場合のみ書き換える。
pub fn compress_streams(doc: &mut Document) -> usize {
    let mut compressed_count = 0;

    for object in doc.objects.values_mut() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !stream.allows_compression || stream.dict.get(b"Filter").is_ok() || stream.content.is_empty() {
            continue;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        if encoder.write_all(&stream.content).is_err() {
            continue;
        }
        let Ok(compressed) = encoder.finish() else {
            continue;
        };
        if compressed.len() >= stream.content.len() {
            continue;
        }

        stream.dict.set("Filter", "FlateDecode");
        stream.set_content(compressed);
        compressed_count += 1;
    }

    compressed_count
}

/// 辞書とデータが完全に一致するストリームを1つに統合し、参照を付け替える。
pub fn merge_duplicate_streams(doc: &mut Document) -> usize {
    let digests: Vec<(ObjectId, [u8; 32])> = doc
        .objects
        .par_iter()
        .filter_map(|(&id, object)| match object {
            Object::Stream(stream) if is_mergeable(stream) => Some((id, stream_digest(stream))),
            _ => None,
        })
        .collect();

    let mut groups: HashMap<[u8; 32], Vec<ObjectId>> = HashMap::new();
    for (id, digest) in digests {
        groups.entry(digest).or_default().push(id);
    }

    let mut replacements: HashMap<ObjectId, ObjectId> = HashMap::new();
    for (digest, mut ids) in groups {
        if ids.len() < 2 {
            continue;
        }
        ids.sort();
        let keep = ids[0];
        debug!(
            digest = %hex::encode(&digest[..8]),
            keep = ?keep,
            duplicates = ids.len() - 1,
            "merging duplicate streams"
        );
        for dup in &ids[1..] {
            replacements.insert(*dup, keep);
        }
    }

    if replacements.is_empty() {
        return 0;
    }

    for dup in replacements.keys() {
        doc.objects.remove(dup);
    }
    for object in doc.objects.values_mut() {
        rewrite_references(object, &replacements);
    }
    for (_, value) in doc.trailer.iter_mut() {
        rewrite_references(value, &replacements);
    }

    replacements.len()
}

/// trailerから到達できない孤立オブジェクトを削除する。
pub fn delete_unused_objects(doc: &mut Document) -> usize {
    doc.prune_objects().len()
}

/// 構造最適化を順に実行する:
///
/// 1. 重複ストリーム統合
/// 2. 未圧縮ストリームの圧縮
/// 3. 孤立オブジェクト除去
/// 4. オブジェクト番号の振り直し
pub fn optimize_document(doc: &mut Document) -> OptimizeReport {
    let merged_streams = merge_duplicate_streams(doc);
    let compressed_streams = compress_streams(doc);
    let pruned_objects = delete_unused_objects(doc);
    doc.renumber_objects();

    OptimizeReport {
        merged_streams,
        compressed_streams,
        pruned_objects,
    }
}

/// ロスレス段階: `input`を`output`に書き直し、厳密に小さい場合のみ残す。
///
/// `NotSmaller`またはエラーの場合、`output`は残らない。
pub fn optimize_file(input: &Path, output: &Path) -> crate::error::Result<OptimizeOutcome> {
    let result = optimize_file_inner(input, output);
    match &result {
        Ok(OptimizeOutcome::Optimized(_)) => {}
        Ok(OptimizeOutcome::NotSmaller { .. }) | Err(_) => {
            let _ = std::fs::remove_file(output);
        }
    }
    result
}

fn optimize_file_inner(input: &Path, output: &Path) -> crate::error::Result<OptimizeOutcome> {
    let input_size = std::fs::metadata(input)?.len();
    let mut doc = Document::load(input)
        .map_err(|e| PdfSqueezeError::optimize(format!("{}: {e}", input.display())))?;

    let report = optimize_document(&mut doc);

    doc.save(output)
        .map_err(|e| PdfSqueezeError::optimize(format!("{}: {e}", output.display())))?;
    let output_size = std::fs::metadata(output)?.len();

    if output_size >= input_size {
        debug!(input_size, output_size, "optimized copy is not smaller");
        return Ok(OptimizeOutcome::NotSmaller {
            input_size,
            output_size,
        });
    }

    info!(
        input_size,
        output_size,
        merged = report.merged_streams,
        compressed = report.compressed_streams,
        pruned = report.pruned_objects,
        "lossless optimization reduced size"
    );
    Ok(OptimizeOutcome::Optimized(OptimizedDocument {
        path: output.to_path_buf(),
        byte_size: output_size,
        input_size,
        report,
    }))
}

fn is_mergeable(stream: &lopdf::Stream) -> bool {
    !matches!(
        stream.dict.get(b"Type").and_then(Object::as_name),
        Ok(b"XRef") | Ok(b"ObjStm")
    )
}

fn stream_digest(stream: &lopdf::Stream) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (key, value) in stream.dict.iter() {
        if key.as_slice() == b"Length" {
            continue;
        }
        hasher.update(b"/");
        hasher.update(key);
        hash_object(value, &mut hasher);
    }
    hasher.update(b"stream");
    hasher.update(&stream.content);
    hasher.finalize().into()
}

/// `obj`の正規化したタグ付き表現を`hasher`に流し込む。
fn hash_object(obj: &Object, hasher: &mut Sha256) {
    match obj {
        Object::Null => hasher.update(b"n"),
        Object::Boolean(b) => hasher.update(if *b { b"t" } else { b"f" }),
        Object::Integer(i) => {
            hasher.update(b"i");
            hasher.update(i.to_le_bytes());
        }
        Object::Real(r) => {
            hasher.update(b"r");
            hasher.update(r.to_le_bytes());
        }
        Object::Name(n) => {
            hasher.update(b"/");
            hasher.update(n);
        }
        Object::String(s, _) => {
            hasher.update(b"s");
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s);
        }
        Object::Array(items) => {
            hasher.update(b"[");
            for item in items {
                hash_object(item, hasher);
            }
            hasher.update(b"]");
        }
        Object::Dictionary(dict) => {
            hasher.update(b"<<");
            for (key, value) in dict.iter() {
                hasher.update(b"/");
                hasher.update(key);
                hash_object(value, hasher);
            }
            hasher.update(b">>");
        }
        Object::Stream(stream) => hasher.update(stream_digest(stream)),
        Object::Reference((num, gen_)) => {
            hasher.update(b"R");
            hasher.update(num.to_le_bytes());
            hasher.update(gen_.to_le_bytes());
        }
    }
}

fn rewrite_references(obj: &mut Object, replacements: &HashMap<ObjectId, ObjectId>) {
    match obj {
        Object::Reference(id) => {
            if let Some(new_id) = replacements.get(id) {
                *id = *new_id;
            }
        }
        Object::Array(items) => {
            for item in items {
                rewrite_references(item, replacements);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                rewrite_references(value, replacements);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                rewrite_references(value, replacements);
            }
        }
        _ => {}
    }
}
