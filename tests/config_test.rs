use std::path::PathBuf;

use pdf_squeeze::config::{load_settings, pdfium_lib_path};
use pdf_squeeze::config::merged::{MergedConfig, Overrides};
use pdf_squeeze::config::profile::{ColorMode, QualityTier};
use pdf_squeeze::config::settings::Settings;
use pdf_squeeze::error::PdfSqueezeError;

// ============================================================
// Settings YAML
// ============================================================

#[test]
fn test_settings_full_yaml() {
    let yaml = r#"
quality: strong
color_mode: gray
optimize: false
yield_every: 8
surface_padding: 0
max_surface_pixels: 5000000
trash_dir: /tmp/pdf-trash
pdfium_lib_path: /opt/pdfium/libpdfium.so
"#;
    let settings = Settings::from_yaml(yaml).expect("parse settings");

    assert_eq!(settings.quality, QualityTier::Strong);
    assert_eq!(settings.color_mode, ColorMode::Grayscale);
    assert!(!settings.optimize);
    assert_eq!(settings.yield_every, 8);
    assert_eq!(settings.surface_padding, 0);
    assert_eq!(settings.max_surface_pixels, 5_000_000);
    assert_eq!(settings.trash_dir, Some(PathBuf::from("/tmp/pdf-trash")));
    assert_eq!(
        settings.pdfium_lib_path,
        Some(PathBuf::from("/opt/pdfium/libpdfium.so"))
    );
}

#[test]
fn test_settings_empty_yaml_uses_defaults() {
    let settings = Settings::from_yaml("{}").expect("parse settings");

    assert_eq!(settings.quality, QualityTier::Medium);
    assert_eq!(settings.color_mode, ColorMode::FullColor);
    assert!(settings.optimize);
    assert_eq!(settings.yield_every, 4);
    assert_eq!(settings.surface_padding, 2);
    assert_eq!(settings.max_surface_pixels, 100_000_000);
    assert!(settings.trash_dir.is_none());
}

#[test]
fn test_settings_partial_yaml() {
    let settings = Settings::from_yaml("quality: light\n").expect("parse settings");

    assert_eq!(settings.quality, QualityTier::Light);
    assert_eq!(settings.color_mode, ColorMode::FullColor);
    assert!(settings.optimize);
}

#[test]
fn test_settings_unknown_values_fall_back_to_defaults() {
    let yaml = "quality: ultra\ncolor_mode: sepia\n";
    let settings = Settings::from_yaml(yaml).expect("unknown values are not fatal");

    assert_eq!(settings.quality, QualityTier::Medium);
    assert_eq!(settings.color_mode, ColorMode::FullColor);
}

#[test]
fn test_settings_case_insensitive_values() {
    let settings = Settings::from_yaml("quality: LOSSLESS\ncolor_mode: Grey\n").expect("parse");
    assert_eq!(settings.quality, QualityTier::Lossless);
    assert_eq!(settings.color_mode, ColorMode::Grayscale);
}

#[test]
fn test_settings_wrong_type_is_error() {
    let result = Settings::from_yaml("yield_every: many\n");
    assert!(matches!(result, Err(PdfSqueezeError::ConfigError(_))));
}

// ============================================================
// Settings lookup
// ============================================================

#[test]
fn test_load_settings_explicit_path() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, "quality: minimal\n").expect("write settings");

    let settings = load_settings(Some(&path), None).expect("load settings");
    assert_eq!(settings.quality, QualityTier::Minimal);
}

#[test]
fn test_load_settings_explicit_missing_is_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("missing.yaml");

    let result = load_settings(Some(&path), None);
    assert!(matches!(result, Err(PdfSqueezeError::ConfigError(_))));
}

#[test]
fn test_load_settings_beside_input() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("settings.yaml"), "color_mode: gray\n").expect("write");
    let input = dir.path().join("doc.pdf");

    let settings = load_settings(None, Some(&input)).expect("load settings");
    assert_eq!(settings.color_mode, ColorMode::Grayscale);
}

#[test]
fn test_load_settings_explicit_wins_over_beside_input() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("settings.yaml"), "quality: strong\n").expect("write");
    let explicit = dir.path().join("explicit.yaml");
    std::fs::write(&explicit, "quality: light\n").expect("write");
    let input = dir.path().join("doc.pdf");

    let settings = load_settings(Some(&explicit), Some(&input)).expect("load settings");
    assert_eq!(settings.quality, QualityTier::Light);
}

#[test]
fn test_pdfium_lib_path_from_explicit_settings() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let explicit = dir.path().join("explicit.yaml");
    std::fs::write(&explicit, "pdfium_lib_path: /opt/pdfium/lib\n").expect("write");

    assert_eq!(
        pdfium_lib_path(Some(&explicit)).expect("resolve"),
        Some(PathBuf::from("/opt/pdfium/lib"))
    );
}

#[test]
fn test_pdfium_lib_path_ignores_document_settings() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let first = dir.path().join("a");
    let second = dir.path().join("b");
    for (doc_dir, lib) in [(&first, "/opt/one"), (&second, "/opt/two")] {
        std::fs::create_dir(doc_dir).expect("create doc dir");
        std::fs::write(doc_dir.join("settings.yaml"), format!("pdfium_lib_path: {lib}\n"))
            .expect("write");
    }
    let explicit = dir.path().join("explicit.yaml");
    std::fs::write(&explicit, "quality: light\n").expect("write");

    // Per-document settings still differ, but the library choice does not
    // depend on which document comes first.
    let a = load_settings(None, Some(&first.join("doc.pdf"))).expect("load a");
    let b = load_settings(None, Some(&second.join("doc.pdf"))).expect("load b");
    assert_ne!(a.pdfium_lib_path, b.pdfium_lib_path);
    assert_eq!(pdfium_lib_path(Some(&explicit)).expect("resolve"), None);
}

#[test]
fn test_pdfium_lib_path_missing_explicit_is_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let result = pdfium_lib_path(Some(&dir.path().join("missing.yaml")));
    assert!(matches!(result, Err(PdfSqueezeError::ConfigError(_))));
}

// ============================================================
// MergedConfig
// ============================================================

#[test]
fn test_merged_config_defaults() {
    let merged = MergedConfig::default();
    assert_eq!(merged.quality, QualityTier::Medium);
    assert_eq!(merged.color_mode, ColorMode::FullColor);
    assert!(merged.optimize);
    assert_eq!(merged.yield_every, 4);
    assert_eq!(merged.surface_padding, 2);
}

#[test]
fn test_merged_config_overrides_win() {
    let settings = Settings::from_yaml("quality: light\ntrash_dir: /a\n").expect("parse");
    let overrides = Overrides {
        quality: Some(QualityTier::Strong),
        color_mode: Some(ColorMode::Grayscale),
        optimize: Some(false),
        trash_dir: Some(PathBuf::from("/b")),
    };

    let merged = MergedConfig::new(&settings, &overrides);
    assert_eq!(merged.quality, QualityTier::Strong);
    assert_eq!(merged.color_mode, ColorMode::Grayscale);
    assert!(!merged.optimize);
    assert_eq!(merged.trash_dir, Some(PathBuf::from("/b")));
}

#[test]
fn test_merged_config_without_overrides_follows_settings() {
    let settings = Settings::from_yaml("quality: light\ntrash_dir: /a\n").expect("parse");
    let merged = MergedConfig::new(&settings, &Overrides::default());

    assert_eq!(merged.quality, QualityTier::Light);
    assert_eq!(merged.trash_dir, Some(PathBuf::from("/a")));
}
