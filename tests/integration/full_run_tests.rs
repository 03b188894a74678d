//! Full run integration tests.
//!
//! Complete scans through `Scanner`: ordering, determinism, failure
//! isolation, email mode and platform selection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use shadowhunter::engine::orchestrator::{
    NoopObserver, ScanObserver, ScanOrchestrator, SKIPPED_REASON,
};
use shadowhunter::engine::registry::{Diagnostic, PlatformRegistry};
use shadowhunter::engine::report::ScanReport;
use shadowhunter::engine::Scanner;
use shadowhunter::identity::{DerivationRule, Identifier, ScanPlan};
use shadowhunter::platforms::Platform;
use shadowhunter::{Existence, RunParameters, ScanError, Verdict};

use crate::mocks::*;

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

fn fast_params() -> RunParameters {
    RunParameters {
        delay: Duration::ZERO,
        ..Default::default()
    }
}

fn scan(registry: &PlatformRegistry, http: &MockHttp, target: &str, params: &RunParameters) -> ScanReport {
    Scanner::new(registry, http)
        .scan_at(target, params, &NoopObserver, fixed_time())
        .unwrap()
}

fn two_platform_registry() -> PlatformRegistry {
    PlatformRegistry::new(vec![status_platform("mock-a"), status_platform("mock-b")]).unwrap()
}

#[test]
fn test_alice_found_on_a_not_on_b() {
    let registry = two_platform_registry();
    let http = MockHttp::new().respond(&mock_url("mock-a", "alice"), 200, "");
    let report = scan(&registry, &http, "alice", &fast_params());

    let verdicts = report.all_verdicts();
    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0].platform(), "mock-a");
    assert_eq!(verdicts[0].existence(), &Existence::Found);
    assert_eq!(verdicts[0].source(), Some("mock-api"));
    assert_eq!(verdicts[0].url(), "https://mock-a.test/alice");
    assert_eq!(verdicts[1].platform(), "mock-b");
    assert_eq!(verdicts[1].existence(), &Existence::NotFound);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["username"], "alice");
    assert_eq!(json["found"].as_array().unwrap().len(), 1);
    assert_eq!(json["found"][0]["platform"], "mock-a");
    assert_eq!(json["found"][0]["meta"]["source"], "mock-api");
    assert_eq!(json["hits"][1]["exists"], false);
    assert_eq!(json["hits"][1]["meta"]["source"], "mock-b.test");
    assert_eq!(json["hits"][1]["meta"]["reason"], "http 404");
    assert_eq!(json["platforms"], serde_json::json!(["mock-a", "mock-b"]));
}

#[test]
fn test_sequential_runs_are_byte_identical() {
    let registry = two_platform_registry();
    let http = MockHttp::new().respond(&mock_url("mock-a", "alice"), 200, "");
    let params = fast_params();

    let first = serde_json::to_string_pretty(&scan(&registry, &http, "alice", &params)).unwrap();
    let second = serde_json::to_string_pretty(&scan(&registry, &http, "alice", &params)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_order_survives_reordered_completion() {
    let names = ["mock-a", "mock-b", "mock-c", "mock-d"];
    let registry =
        PlatformRegistry::new(names.iter().map(|&n| status_platform(n)).collect()).unwrap();

    // earlier platforms answer later
    let mut http = MockHttp::new();
    for (i, name) in names.iter().enumerate() {
        let delay = Duration::from_millis(40 * (names.len() - i) as u64);
        let status = if i % 2 == 0 { 200 } else { 404 };
        http = http.respond_after(&mock_url(name, "alice"), status, delay);
    }

    let sequential = scan(&registry, &http, "alice", &fast_params());
    let parallel = scan(
        &registry,
        &http,
        "alice",
        &RunParameters {
            concurrency: 4,
            ..fast_params()
        },
    );

    let order = |r: &ScanReport| -> Vec<String> {
        r.all_verdicts().iter().map(|v| v.platform().to_string()).collect()
    };
    assert_eq!(order(&parallel), names.to_vec());
    assert_eq!(parallel.all_verdicts(), sequential.all_verdicts());
    assert_eq!(parallel.summary(), sequential.summary());
}

#[test]
fn test_transport_error_is_isolated() {
    let registry = two_platform_registry();
    let http = MockHttp::new()
        .time_out(&mock_url("mock-a", "alice"))
        .respond(&mock_url("mock-b", "alice"), 200, "");
    let report = scan(&registry, &http, "alice", &fast_params());

    let verdicts = report.all_verdicts();
    assert!(matches!(verdicts[0].existence(), Existence::Error { .. }));
    assert_eq!(verdicts[0].existence().exists(), None);
    assert!(verdicts[1].is_found());

    let summary = report.summary();
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.unknown, 1);
    assert_eq!(summary.found, 1);
}

#[test]
fn test_panicking_checker_is_isolated() {
    let registry = PlatformRegistry::new(vec![
        Platform::new("boom", "https://boom.test/{u}", PanickingChecker),
        status_platform("mock-a"),
    ])
    .unwrap();
    let http = MockHttp::new().respond(&mock_url("mock-a", "alice"), 200, "");

    for concurrency in [1, 2] {
        let params = RunParameters {
            concurrency,
            ..fast_params()
        };
        let report = scan(&registry, &http, "alice", &params);
        let verdicts = report.all_verdicts();
        assert_eq!(
            verdicts[0].existence(),
            &Existence::Error {
                message: "checker panicked".to_string()
            }
        );
        assert!(verdicts[1].is_found());
    }
}

#[test]
fn test_undeclared_signal_never_reports_found() {
    let registry =
        PlatformRegistry::new(vec![Platform::new("rogue", "https://rogue.test/{u}", RogueChecker)])
            .unwrap();
    let report = scan(&registry, &MockHttp::new(), "alice", &fast_params());

    let verdict = report.all_verdicts()[0];
    assert_eq!(verdict.existence(), &Existence::Unknown);
    assert_eq!(verdict.source(), None);
    assert!(report.found().is_empty());
}

#[test]
fn test_every_found_names_a_source() {
    let registry = two_platform_registry();
    let http = MockHttp::new()
        .respond(&mock_url("mock-a", "alice"), 200, "")
        .respond(&mock_url("mock-b", "alice"), 200, "");
    let report = scan(&registry, &http, "alice", &fast_params());
    assert_eq!(report.found().len(), 2);
    assert!(report
        .found()
        .iter()
        .all(|v| v.source().map_or(false, |s| !s.is_empty())));
}

#[test]
fn test_invalid_target_fails_before_any_request() {
    let registry = two_platform_registry();
    let http = MockHttp::new();

    for bad in ["", "   ", "two words", "a@b@c", "@example.com", "alice@"] {
        let result = Scanner::new(&registry, &http).scan(bad, &fast_params(), &NoopObserver);
        assert!(
            matches!(result, Err(ScanError::InvalidTarget { .. })),
            "'{}' should be rejected",
            bad
        );
    }
    assert!(http.requested().is_empty());
}

#[test]
fn test_unknown_and_disabled_platforms_are_diagnosed() {
    let registry = PlatformRegistry::new(vec![
        status_platform("mock-a"),
        disabled_platform("mock-off"),
    ])
    .unwrap();
    let params = RunParameters {
        platforms: Some(vec![
            "mock-a".to_string(),
            "nope".to_string(),
            "mock-off".to_string(),
        ]),
        ..fast_params()
    };
    let report = scan(&registry, &MockHttp::new(), "alice", &params);

    assert_eq!(report.platforms, vec!["mock-a".to_string()]);
    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::UnknownPlatform("nope".to_string()),
            Diagnostic::DisabledPlatform("mock-off".to_string()),
        ]
    );
    assert_eq!(report.all_verdicts().len(), 1);
}

#[test]
fn test_default_selection_skips_disabled() {
    let registry = PlatformRegistry::new(vec![
        status_platform("mock-a"),
        disabled_platform("mock-off"),
        status_platform("mock-b"),
    ])
    .unwrap();
    let report = scan(&registry, &MockHttp::new(), "alice", &fast_params());
    assert_eq!(report.platforms, vec!["mock-a".to_string(), "mock-b".to_string()]);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_email_mode_probes_gravatar_then_local_part() {
    let registry = two_platform_registry();
    let http = MockHttp::new().respond(&mock_url("mock-a", "alice"), 200, "");
    let report = scan(&registry, &http, "alice@example.com", &fast_params());

    assert!(report.is_email());
    let requested = http.requested();
    assert!(requested[0].starts_with("https://gravatar.com/"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["email_scan"]["gravatar"]["platform"], "gravatar");
    assert_eq!(json["email_scan"]["gravatar"]["exists"], false);
    assert_eq!(json["email_scan"]["username_candidates"], serde_json::json!(["alice"]));
    assert_eq!(json["email_scan"]["platform_hits"]["alice"][0]["exists"], true);
    // gravatar counts toward the summary
    assert_eq!(report.summary().total, 3);
}

#[test]
fn test_derived_candidates_are_checked_in_order() {
    let rules = [
        DerivationRule::Identity,
        DerivationRule::StripDots,
        DerivationRule::StripPlusSign,
    ];
    let plan = ScanPlan::with_rules(
        Identifier::Email {
            local: "alice.b+test".to_string(),
            domain: "example.com".to_string(),
        },
        true,
        &rules,
        8,
    );
    assert_eq!(plan.candidates, vec!["alice.b+test", "aliceb+test", "alice.btest"]);

    let owned = vec![status_platform("mock-a"), status_platform("mock-b")];
    let platforms: Vec<&Platform> = owned.iter().collect();
    let http = MockHttp::new().respond(&mock_url("mock-b", "aliceb+test"), 200, "");
    let params = RunParameters {
        concurrency: 3,
        ..fast_params()
    };
    let results = ScanOrchestrator::new(&http, &params).run(&plan, &platforms, &NoopObserver);

    let candidates: Vec<&str> = results.groups.iter().map(|g| g.candidate.as_str()).collect();
    assert_eq!(candidates, vec!["alice.b+test", "aliceb+test", "alice.btest"]);
    assert!(results.gravatar.is_some());
    assert_eq!(results.len(), 7);
    assert!(results.groups[1].verdicts[1].is_found());
    assert!(!results.groups[0].verdicts[1].is_found());
}

#[test]
fn test_also_derive_uses_default_rules() {
    let registry = two_platform_registry();
    let params = RunParameters {
        derive: true,
        ..fast_params()
    };
    let report = scan(&registry, &MockHttp::new(), "Alice.Smith@example.com", &params);

    let json = serde_json::to_value(&report).unwrap();
    let candidates: Vec<String> =
        serde_json::from_value(json["email_scan"]["username_candidates"].clone()).unwrap();
    assert_eq!(candidates[0], "Alice.Smith");
    assert!(candidates.contains(&"alice.smith".to_string()));
    assert!(candidates.len() <= 8);
    for candidate in &candidates {
        assert!(json["email_scan"]["platform_hits"].get(candidate).is_some());
    }
}

fn four_platform_registry() -> PlatformRegistry {
    let names = ["mock-a", "mock-b", "mock-c", "mock-d"];
    PlatformRegistry::new(names.iter().map(|&n| status_platform(n)).collect()).unwrap()
}

#[test]
fn test_concurrency_bounds_requests_in_flight() {
    let registry = four_platform_registry();

    for concurrency in [1, 2, 3] {
        let mut http = MockHttp::new();
        for name in ["mock-a", "mock-b", "mock-c", "mock-d"] {
            http = http.respond_after(&mock_url(name, "alice"), 404, Duration::from_millis(30));
        }
        let params = RunParameters {
            concurrency,
            ..fast_params()
        };
        scan(&registry, &http, "alice", &params);

        let peak = http.peak_in_flight();
        assert_eq!(http.requested().len(), 4);
        assert!(peak <= concurrency, "peak {} at concurrency {}", peak, concurrency);
        if concurrency > 1 {
            assert!(peak > 1, "requests never overlapped at concurrency {}", concurrency);
        }
    }
}

#[test]
fn test_sequential_delay_spaces_requests() {
    let registry = four_platform_registry();
    let http = MockHttp::new();
    let params = RunParameters {
        delay: Duration::from_millis(25),
        ..fast_params()
    };

    let start = Instant::now();
    let report = scan(&registry, &http, "alice", &params);

    // four requests, three pauses
    assert_eq!(report.all_verdicts().len(), 4);
    assert!(start.elapsed() >= Duration::from_millis(75), "took {:?}", start.elapsed());
}

/// Raises the stop flag after the first verdict, like a Ctrl-C mid-run
struct InterruptAfterFirst<'a>(&'a AtomicBool);

impl ScanObserver for InterruptAfterFirst<'_> {
    fn on_verdict(&self, _verdict: &Verdict) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_interrupted_scan_still_reports_every_pair() {
    let registry = four_platform_registry();
    let http = MockHttp::new().respond(&mock_url("mock-a", "alice"), 200, "");
    let stop = AtomicBool::new(false);

    let report = Scanner::new(&registry, &http)
        .with_stop(&stop)
        .scan_at("alice", &fast_params(), &InterruptAfterFirst(&stop), fixed_time())
        .unwrap();

    assert_eq!(http.requested(), vec![mock_url("mock-a", "alice")]);
    let verdicts = report.all_verdicts();
    assert_eq!(verdicts.len(), 4);
    assert!(verdicts[0].is_found());
    for verdict in &verdicts[1..] {
        assert_eq!(verdict.existence(), &Existence::Unknown);
        assert_eq!(verdict.reason(), Some(SKIPPED_REASON));
    }

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["hits"][3]["platform"], "mock-d");
    assert_eq!(json["hits"][3]["status"], "unknown");
    assert_eq!(json["hits"][3]["meta"]["reason"], "skipped (interrupted)");
    assert_eq!(json["hits"][3]["meta"]["source"], serde_json::Value::Null);
    assert_eq!(json["summary"]["unknown"], 3);
}
