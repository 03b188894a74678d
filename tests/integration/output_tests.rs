//! Output integration tests.
//!
//! Report views (only-found, summary) and the JSON/CSV writers.

use std::fs;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use shadowhunter::cli::output::{
    write_output, CsvFormatter, JsonFormatter, OutputFormatter, CSV_HEADER,
};
use shadowhunter::engine::orchestrator::NoopObserver;
use shadowhunter::engine::registry::PlatformRegistry;
use shadowhunter::engine::report::ScanReport;
use shadowhunter::engine::Scanner;
use shadowhunter::RunParameters;

use crate::mocks::*;

fn mixed_report(target: &str, derive: bool) -> ScanReport {
    let registry = PlatformRegistry::new(vec![
        status_platform("mock-a"),
        status_platform("mock-b"),
        status_platform("mock-c"),
    ])
    .unwrap();
    let http = MockHttp::new()
        .respond(&mock_url("mock-a", "alice"), 200, "")
        .respond(&mock_url("mock-c", "alice"), 503, "")
        .respond(&mock_url("mock-b", "alicesmith"), 200, "");
    let params = RunParameters {
        delay: Duration::ZERO,
        derive,
        ..Default::default()
    };
    Scanner::new(&registry, &http)
        .scan_at(
            target,
            &params,
            &NoopObserver,
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap(),
        )
        .unwrap()
}

#[test]
fn test_only_found_is_the_found_subset() {
    for report in [mixed_report("alice", false), mixed_report("alice.smith@example.com", true)] {
        let filtered = report.only_found();
        let kept = filtered.all_verdicts();

        assert!(kept.iter().all(|v| v.is_found()));
        assert_eq!(kept, report.found());
        assert_eq!(filtered.timestamp, report.timestamp);
        assert_eq!(filtered.platforms, report.platforms);
    }
}

#[test]
fn test_summary_counts_match_cardinalities() {
    let report = mixed_report("alice", false);
    let summary = report.summary();
    let all = report.all_verdicts();

    assert_eq!(summary.total, all.len());
    assert_eq!(summary.found, all.iter().filter(|v| v.is_found()).count());
    assert_eq!(summary.found + summary.not_found + summary.unknown, summary.total);
    assert_eq!((summary.found, summary.not_found, summary.unknown), (1, 1, 1));
    assert_eq!(summary.positives.len(), 1);
    assert_eq!(summary.positives[0].platform, "mock-a");
    assert_eq!(summary.positives[0].source, "mock-api");
}

#[test]
fn test_email_only_found_drops_empty_candidates() {
    let report = mixed_report("alice.smith@example.com", true);
    let json = serde_json::to_value(report.only_found()).unwrap();

    let hits = json["email_scan"]["platform_hits"].as_object().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits["alicesmith"][0]["platform"], "mock-b");
    assert_eq!(json["email_scan"]["gravatar"], serde_json::Value::Null);
    // candidates are kept even when they have no hits
    assert!(json["email_scan"]["username_candidates"].as_array().unwrap().len() > 1);
}

#[test]
fn test_json_top_level_key_order() {
    let text = JsonFormatter.format(&mixed_report("alice", false));
    // top-level keys are the only ones indented by exactly two spaces
    let keys = [
        "tool",
        "author",
        "version",
        "timestamp",
        "params",
        "platforms",
        "diagnostics",
        "summary",
        "username",
        "hits",
        "found",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|k| text.find(&format!("\n  \"{}\":", k)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
    assert!(text.contains("\"timestamp\": \"2024-06-01T08:30:00Z\""));
}

#[test]
fn test_reports_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let report = mixed_report("alice", false);
    let json_path = dir.path().join("out.json");
    let csv_path = dir.path().join("reports").join("out.csv");

    write_output(&json_path, &JsonFormatter.format(&report)).unwrap();
    write_output(&csv_path, &CsvFormatter.format(&report)).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 3);

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[1],
        "2024-06-01T08:30:00Z,username,alice,mock-a,https://mock-a.test/alice,true,,mock-api"
    );
    assert!(lines[3].contains(",mock-c,") && lines[3].ends_with(",,,"));
}

#[test]
fn test_email_csv_modes() {
    let report = mixed_report("alice.smith@example.com", true);
    let csv = CsvFormatter.format(&report);
    let rows: Vec<&str> = csv.lines().skip(1).collect();

    assert!(rows[0].contains(",email,alice.smith@example.com,gravatar,"));
    assert!(rows[1..].iter().all(|r| r.contains(",email-derived,")));
    assert_eq!(rows.len(), report.summary().total);
}

#[test]
fn test_write_to_unwritable_path_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").unwrap();

    let err = write_output(&blocker.join("out.json"), "{}").unwrap_err();
    assert!(format!("{:#}", err).contains("failed to"));
}
