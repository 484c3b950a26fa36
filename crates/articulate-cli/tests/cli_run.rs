//! Batch runs over scripted pages, through to the CSV on disk.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use articulate::converge::ConvergenceConfig;
use articulate::renderer::fixture::{FixtureDocument, FixturePage, FixtureRow};
use articulate::{EquivalencyTriple, LaunchOptions, Lookup};
use articulate_cli::{lookup, resolve_urls, run_with_page, CliError, RunOptions};

// ─────────────────────── helpers ───────────────────────

fn options(urls: &[&str], out: PathBuf) -> RunOptions {
    let mut opts = RunOptions::new(
        urls.iter().map(|u| u.to_string()).collect(),
        out,
        LaunchOptions::default(),
        1,
    );
    opts.session = opts
        .session
        .with_convergence(ConvergenceConfig::for_intensity(1).with_delay(Duration::ZERO));
    opts
}

fn college(label: &str, receiving: &str, sending: &str) -> FixtureDocument {
    FixtureDocument::new()
        .institution(label)
        .heights([500, 500, 500])
        .row(FixtureRow::new().receiving([receiving]).sending([sending]))
}

// ─────────────────────── runs ───────────────────────

#[tokio::test]
async fn test_run_writes_sorted_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/articulations.csv");
    let page = FixturePage::new()
        .with_document("https://a", college("From: De Anza College", "MATH 1B", "MATH 1C"))
        .with_document("https://b", college("From: Foothill College", "CS 61A", "CS 3A"));

    let summary = run_with_page(page, options(&["https://a", "https://b"], out.clone()))
        .await
        .unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.failed_pages, 0);
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        text,
        "b_course,cc_name,cc_course\n\
         CS 61A,Foothill College,CS 3A\n\
         MATH 1B,De Anza College,MATH 1C\n"
    );
}

#[tokio::test]
async fn test_failed_pages_still_write_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let page = FixturePage::new();
    let closes = page.close_counter();

    let summary = run_with_page(page, options(&["https://gone"], out.clone()))
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(summary.failed_pages, 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "b_course,cc_name,cc_course\n"
    );
}

#[tokio::test]
async fn test_unwritable_output_maps_to_exit_code_4() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let out = blocker.join("articulations.csv");

    let err = run_with_page(FixturePage::new(), options(&["https://x"], out))
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Output { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_links_file_comes_before_flag_urls() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# agreements").unwrap();
    writeln!(file, "  https://one  ").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "https://two").unwrap();

    let urls = resolve_urls(Some(file.path()), &["https://three".to_string()]).unwrap();
    assert_eq!(urls, vec!["https://one", "https://two", "https://three"]);
}

#[test]
fn test_no_urls_exit_code_2() {
    let err = resolve_urls(None, &[]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

// ─────────────────────── lookup ───────────────────────

fn written_dataset(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("articulations.csv");
    articulate::write_dataset_file(
        &path,
        &[
            EquivalencyTriple::new("CS 61A", "De Anza College", "CIS 22A"),
            EquivalencyTriple::new("CS 61A", "College of San Mateo, CA", "CIS 255"),
            EquivalencyTriple::new("MATH 1B", "De Anza College", "MATH 1C"),
        ],
    )
    .unwrap();
    path
}

#[test]
fn test_lookup_equivalents_for_course() {
    let dir = tempfile::tempdir().unwrap();
    let path = written_dataset(&dir);
    let mut out = Vec::new();

    let n = lookup(&path, &Lookup::Course("CS 61A".to_string()), &mut out).unwrap();

    assert_eq!(n, 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "cc_name,cc_course\nDe Anza College,CIS 22A\n\"College of San Mateo, CA\",CIS 255\n"
    );
}

#[test]
fn test_lookup_mappings_for_college() {
    let dir = tempfile::tempdir().unwrap();
    let path = written_dataset(&dir);
    let mut out = Vec::new();

    let n = lookup(&path, &Lookup::College("De Anza College".to_string()), &mut out).unwrap();

    assert_eq!(n, 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "b_course,cc_course\nCS 61A,CIS 22A\nMATH 1B,MATH 1C\n"
    );
}

#[test]
fn test_lookup_without_matches_prints_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = written_dataset(&dir);
    let mut out = Vec::new();

    let n = lookup(&path, &Lookup::College("Nowhere".to_string()), &mut out).unwrap();

    assert_eq!(n, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "b_course,cc_course\n");
}

#[test]
fn test_lookup_unreadable_dataset_exit_code_5() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");
    let err = lookup(&missing, &Lookup::Course("CS 61A".to_string()), Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, CliError::Dataset { .. }));
    assert_eq!(err.exit_code(), 5);

    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "course,college\nA,B\n").unwrap();
    let err = lookup(&bad, &Lookup::Course("A".to_string()), Vec::<u8>::new()).unwrap_err();
    assert_eq!(err.exit_code(), 5);
}
