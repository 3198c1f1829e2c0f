//! Integration tests for the roster CLI library

use roster_cli::commands::batch::{collect_inputs, run_batch};
use roster_cli::config::OutputFormat;
use roster_cli::input::{parse_body, read_email};
use roster_cli::{EngineOptions, Formatter};
use roster_domain::OutputField;
use roster_extractor::RecognizerKind;
use std::fs;
use std::path::PathBuf;

fn shipped_configs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

#[test]
fn test_engine_with_shipped_gazetteer() {
    let options = EngineOptions {
        gazetteer_dir: Some(shipped_configs()),
        recognizer: Some(RecognizerKind::Heuristic),
        ..EngineOptions::default()
    };
    let engine = options.build_engine().unwrap();
    assert_eq!(engine.recognizer_name(), "heuristic");

    let content = parse_body("Provider: Ann Lee\nNPI: 1234567893\nTaxonomy 207RC0000X", false);
    let records = engine.extract_all_fields(&content);
    assert_eq!(records[0].get(OutputField::ProviderNpi), "1234567893");
    assert_eq!(records[0].get(OutputField::ProviderSpecialty), "Cardiology");
}

#[test]
fn test_html_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail.html");
    fs::write(
        &path,
        "<p>Please add the providers below.</p>\
<table><tr><th>Provider Name</th><th>NPI</th></tr>\
<tr><td>Ann Lee</td><td>1234567893</td></tr></table>",
    )
    .unwrap();

    let content = read_email(&path, false).unwrap();
    assert!(content.html_content.is_some());

    let engine = EngineOptions::default().build_engine().unwrap();
    let records = engine.extract_all_fields(&content);
    assert_eq!(records[0].get(OutputField::ProviderName), "Ann Lee");
    assert_eq!(records[0].get(OutputField::ProviderNpi), "1234567893");
}

#[test]
fn test_batch_survives_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ok.txt"), "Provider: Ann Lee\nNPI: 1234567893").unwrap();
    fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();

    let inputs = collect_inputs(dir.path(), &["txt".to_string()]).unwrap();
    let engine = EngineOptions::default().build_engine().unwrap();
    let summary = run_batch(&engine, &inputs, None, &Formatter::new(OutputFormat::Quiet, false));

    assert_eq!(summary.files, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.records >= 1);
}
