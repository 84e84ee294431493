use std::process::Command;

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdf_squeeze"))
}

#[test]
fn test_main_no_args_shows_usage() {
    let output = cargo_bin().output().expect("failed to execute binary");

    assert!(
        !output.status.success(),
        "should exit with failure when no input is given"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr should contain 'Usage', got: {stderr}");
}

#[test]
fn test_main_help_flag() {
    let output = cargo_bin()
        .arg("--help")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success(), "should exit with success for --help");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "stdout should contain 'Usage', got: {stdout}");
    for flag in ["--quality", "--color", "--config", "--no-optimize", "--trash-dir", "--json"] {
        assert!(stdout.contains(flag), "help should mention {flag}");
    }
}

#[test]
fn test_main_version_flag() {
    let output = cargo_bin()
        .arg("--version")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "got: {stdout}");
}

#[test]
fn test_main_unknown_quality_is_rejected() {
    let output = cargo_bin()
        .args(["--quality", "extreme", "doc.pdf"])
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("extreme"), "got: {stderr}");
}

#[test]
fn test_main_unknown_color_mode_is_rejected() {
    let output = cargo_bin()
        .args(["--color", "cmyk", "doc.pdf"])
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
}

#[test]
fn test_main_missing_settings_file_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let output = cargo_bin()
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .arg(dir.path().join("doc.pdf"))
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR"), "got: {stderr}");
}
