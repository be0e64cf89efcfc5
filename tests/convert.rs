//! End-to-end tests for batch conversion of a figures directory.

#![cfg(feature = "png")]

mod common;

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use chart2png::{run, Config, Error, FileStatus};
use common::{chart_document, decode_png, line_chart, PNG_SIGNATURE};

/// Small images keep the tests fast; the staleness logic does not care.
fn test_config() -> Config {
    Config::new().size(160, 120).scale(1.0)
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn base_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

#[test]
fn test_converts_missing_and_skips_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let a_html = dir.path().join("a.html");
    let b_html = dir.path().join("b.html");
    let b_png = dir.path().join("b.png");
    fs::write(&a_html, line_chart()).unwrap();
    fs::write(&b_html, line_chart()).unwrap();
    fs::write(&b_png, "existing image").unwrap();
    set_mtime(&b_html, base_time());
    set_mtime(&b_png, base_time() + Duration::from_secs(60));

    let summary = run(dir.path(), &test_config()).unwrap();

    let a_png = fs::read(dir.path().join("a.png")).expect("a.png should be created");
    assert!(a_png.starts_with(&PNG_SIGNATURE));
    let pixels = decode_png(&a_png);
    assert_eq!((pixels.width, pixels.height), (160, 120));
    assert!(pixels.count_color([0xE5, 0xEC, 0xF6], 2) > 0, "plot area painted");
    assert_eq!(
        fs::read_to_string(&b_png).unwrap(),
        "existing image",
        "up-to-date output must not be rewritten"
    );

    assert_eq!(summary.discovered(), 2);
    assert_eq!(summary.converted(), 1);
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.skipped(), 1);
    assert!(matches!(summary.files[1].status, FileStatus::UpToDate));
}

#[test]
fn test_document_without_marker_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("c.html"),
        "<html><body><p>just text</p></body></html>",
    )
    .unwrap();

    let summary = run(dir.path(), &test_config()).unwrap();

    assert!(!dir.path().join("c.png").exists());
    assert_eq!(summary.converted(), 0);
    assert_eq!(summary.failed(), 1);
    match &summary.files[0].status {
        FileStatus::Failed(e) => {
            assert!(matches!(e, Error::MarkerNotFound { .. }));
            assert!(e.to_string().contains("Could not extract figure data"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_missing_directory_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("RESULTS").join("figures");

    let err = run(&missing, &test_config()).unwrap_err();
    assert!(matches!(err, Error::DirectoryNotFound { .. }));
    assert!(!missing.exists(), "no file operations on a missing directory");
}

#[test]
fn test_directory_without_documents_aborts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), "nothing").unwrap();

    let err = run(dir.path(), &test_config()).unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
}

#[test]
fn test_stale_and_tied_outputs_are_reconverted() {
    let dir = tempfile::tempdir().unwrap();
    for (name, offset) in [("stale", -60i64), ("tied", 0)] {
        let html = dir.path().join(format!("{name}.html"));
        let png = dir.path().join(format!("{name}.png"));
        fs::write(&html, line_chart()).unwrap();
        fs::write(&png, "old").unwrap();
        set_mtime(&html, base_time());
        let png_time = if offset < 0 {
            base_time() - Duration::from_secs(offset.unsigned_abs())
        } else {
            base_time()
        };
        set_mtime(&png, png_time);
    }

    let summary = run(dir.path(), &test_config()).unwrap();

    assert_eq!(summary.converted(), 2);
    for name in ["stale", "tied"] {
        let bytes = fs::read(dir.path().join(format!("{name}.png"))).unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE), "{name}.png should be rewritten");
    }
}

#[test]
fn test_failure_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    // Sorted order puts the unreadable document first.
    fs::write(dir.path().join("1-broken.html"), [0xc3, 0x28, 0xa0]).unwrap();
    fs::write(dir.path().join("1-broken.png"), "keep me").unwrap();
    set_mtime(&dir.path().join("1-broken.png"), base_time());
    fs::write(dir.path().join("2-good.html"), line_chart()).unwrap();

    let summary = run(dir.path(), &test_config()).unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.converted(), 1);
    assert!(matches!(
        summary.files[0].status,
        FileStatus::Failed(Error::Read { .. })
    ));
    assert_eq!(
        fs::read_to_string(dir.path().join("1-broken.png")).unwrap(),
        "keep me"
    );
    assert!(dir.path().join("2-good.png").exists());
}

#[test]
fn test_counts_add_up() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ok.html"), line_chart()).unwrap();
    fs::write(dir.path().join("bad.html"), "no chart").unwrap();
    fs::write(dir.path().join("fresh.html"), line_chart()).unwrap();
    fs::write(dir.path().join("fresh.png"), "png").unwrap();
    set_mtime(&dir.path().join("fresh.html"), base_time());
    set_mtime(
        &dir.path().join("fresh.png"),
        base_time() + Duration::from_secs(1),
    );

    let summary = run(dir.path(), &test_config()).unwrap();

    assert_eq!(summary.discovered(), 3);
    assert_eq!(
        summary.converted() + summary.failed(),
        summary.discovered() - summary.skipped()
    );
    assert_eq!(summary.skipped(), 1);
}

#[test]
fn test_undrawable_figure_fails_and_histogram_converts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cm.html"),
        chart_document(r#"[{"type":"heatmap","z":[[9,1],[2,8]]}]"#, "{}"),
    )
    .unwrap();
    fs::write(
        dir.path().join("hist.html"),
        chart_document(r#"[{"type":"histogram","x":[1,1,2,3,5,8]}]"#, "{}"),
    )
    .unwrap();

    let summary = run(dir.path(), &test_config()).unwrap();

    assert_eq!(summary.converted(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        summary.files[0].status,
        FileStatus::Failed(Error::UnsupportedFigure { .. })
    ));
    assert!(!dir.path().join("cm.png").exists());
    assert!(dir.path().join("hist.png").exists());
}
