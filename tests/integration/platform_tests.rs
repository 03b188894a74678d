//! Built-in platform tests.
//!
//! Exercises the shipped registry and a few real checkers against the mock
//! transport.

use std::collections::HashSet;
use std::time::Duration;

use shadowhunter::engine::orchestrator::NoopObserver;
use shadowhunter::engine::registry::{Diagnostic, PlatformRegistry};
use shadowhunter::engine::Scanner;
use shadowhunter::{Existence, RunParameters};

use crate::mocks::MockHttp;

fn params() -> RunParameters {
    RunParameters {
        delay: Duration::ZERO,
        ..Default::default()
    }
}

#[test]
fn test_default_set_is_unique_and_excludes_twitch() {
    let registry = PlatformRegistry::builtin();
    let defaults = registry.default_platforms();
    let names: HashSet<&str> = defaults.iter().map(|p| p.name()).collect();

    assert_eq!(names.len(), defaults.len());
    assert!(!names.contains("twitch"));
    assert!(registry.get("twitch").is_some());
    assert!(names.contains("github"));
}

#[test]
fn test_requesting_twitch_is_diagnosed() {
    let registry = PlatformRegistry::builtin();
    let requested = vec!["GitHub".to_string(), "twitch".to_string()];
    let resolution = registry.resolve(Some(requested.as_slice()));

    assert_eq!(resolution.names(), vec!["github".to_string()]);
    assert_eq!(
        resolution.diagnostics,
        vec![Diagnostic::DisabledPlatform("twitch".to_string())]
    );
}

#[test]
fn test_every_platform_declares_signals() {
    for platform in PlatformRegistry::builtin().all() {
        assert!(!platform.signals().is_empty(), "{} has no signals", platform.name());
        assert!(platform.signals().iter().all(|s| !s.tag.is_empty()));
    }
}

#[test]
fn test_all_missing_world_has_no_positives() {
    let registry = PlatformRegistry::builtin();
    let http = MockHttp::new();
    let report = Scanner::new(&registry, &http)
        .scan("alice", &params(), &NoopObserver)
        .unwrap();

    assert_eq!(report.all_verdicts().len(), registry.default_platforms().len());
    assert!(report.found().is_empty());
}

#[test]
fn test_bare_success_pages_are_never_positive() {
    let registry = PlatformRegistry::builtin();
    let http = MockHttp::new().fallback(200);
    let report = Scanner::new(&registry, &http)
        .scan("alice", &params(), &NoopObserver)
        .unwrap();

    for verdict in report.all_verdicts() {
        assert_ne!(
            verdict.existence(),
            &Existence::Found,
            "{} accepted an empty 200",
            verdict.platform()
        );
    }
}

#[test]
fn test_github_api_hit() {
    let registry = PlatformRegistry::builtin();
    let http = MockHttp::new().respond(
        "https://api.github.com/users/octocat",
        200,
        r#"{"login":"octocat","name":"The Octocat","created_at":"2011-01-25T18:44:36Z"}"#,
    );
    let params = RunParameters {
        platforms: Some(vec!["github".to_string()]),
        ..params()
    };
    let report = Scanner::new(&registry, &http)
        .scan("octocat", &params, &NoopObserver)
        .unwrap();

    let verdict = report.all_verdicts()[0];
    assert!(verdict.is_found());
    assert_eq!(verdict.source(), Some("api.github.com"));
    assert_eq!(verdict.url(), "https://github.com/octocat");
    assert_eq!(verdict.evidence()["name"], "The Octocat");
    assert_eq!(http.requested(), vec!["https://api.github.com/users/octocat".to_string()]);
}

#[test]
fn test_api_negatives() {
    let registry = PlatformRegistry::builtin();
    let http = MockHttp::new()
        .respond("https://gitlab.com/api/v4/users?username=ghost", 200, "[]")
        .respond("https://hacker-news.firebaseio.com/v0/user/ghost.json", 200, "null");
    let params = RunParameters {
        platforms: Some(vec!["gitlab".to_string(), "hackernews".to_string()]),
        ..params()
    };
    let report = Scanner::new(&registry, &http)
        .scan("ghost", &params, &NoopObserver)
        .unwrap();

    for verdict in report.all_verdicts() {
        assert_eq!(verdict.existence(), &Existence::NotFound, "{}", verdict.platform());
    }
}

#[test]
fn test_rate_limited_api_is_unknown() {
    let registry = PlatformRegistry::builtin();
    let http = MockHttp::new().respond("https://gitlab.com/api/v4/users?username=alice", 429, "");
    let params = RunParameters {
        platforms: Some(vec!["gitlab".to_string()]),
        ..params()
    };
    let report = Scanner::new(&registry, &http)
        .scan("alice", &params, &NoopObserver)
        .unwrap();

    let verdict = report.all_verdicts()[0];
    assert_eq!(verdict.existence(), &Existence::Unknown);
    assert!(verdict.reason().unwrap_or_default().contains("429"));
}
