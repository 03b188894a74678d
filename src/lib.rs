//! shadowhunter library
//!
//! Conservative account-presence scanner for usernames and email addresses.
//!
//! This library provides:
//! - Per-platform existence checkers with named, auditable acceptance signals
//! - A registry of built-in platforms with a default-enabled set
//! - Username candidate derivation from email local-parts
//! - Sequential or bounded-concurrent orchestration with pacing
//! - Report assembly with "only found" and summary views
//!
//! # Example
//!
//! ```no_run
//! use shadowhunter::http::{HttpConfig, ReqwestFetcher};
//! use shadowhunter::{run_scan, RunParameters};
//!
//! let http = ReqwestFetcher::new(HttpConfig::default()).expect("http client");
//! let report = run_scan("octocat", &RunParameters::default(), &http).expect("scan failed");
//! println!("Found on {} platform(s)", report.summary().found);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod http;
pub mod identity;
pub mod platforms;
pub mod version;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use engine::orchestrator::NoopObserver;
use engine::registry::PlatformRegistry;
use engine::report::ScanReport;
use engine::Scanner;
use http::{HttpFetch, TransportError};
use identity::TargetMode;

// Re-exports for public API
pub use engine::orchestrator::{ScanObserver, ScanOrchestrator};
pub use engine::report::{ReportSummary, ScanReport as Report};
pub use identity::Identifier;
pub use platforms::{Checker, Outcome, Platform};

/// Attributes extracted alongside a verdict (display name, bio, ids...)
pub type Evidence = BTreeMap<String, serde_json::Value>;

/// Outcome of checking one identifier against one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    /// A named positive signal fired
    Found,
    /// The platform affirmatively reported absence
    NotFound,
    /// Ambiguous, gated or rate-limited; never promoted to Found
    Unknown,
    /// Transport failure; the Unknown case with the failure recorded
    Error { message: String },
}

impl Existence {
    /// Tri-state view used in reports: `Some(true)`, `Some(false)` or `None`
    pub fn exists(&self) -> Option<bool> {
        match self {
            Existence::Found => Some(true),
            Existence::NotFound => Some(false),
            Existence::Unknown | Existence::Error { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Existence::Found)
    }

    /// True for both `Unknown` and `Error`
    pub fn is_unknown(&self) -> bool {
        matches!(self, Existence::Unknown | Existence::Error { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Existence::Found => "found",
            Existence::NotFound => "not_found",
            Existence::Unknown => "unknown",
            Existence::Error { .. } => "error",
        }
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Existence::Found => write!(f, "FOUND"),
            Existence::NotFound => write!(f, "NOT FOUND"),
            Existence::Unknown => write!(f, "UNKNOWN"),
            Existence::Error { message } => write!(f, "ERROR: {}", message),
        }
    }
}

/// How much a positive signal is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTier {
    /// Structured existence query against an official API
    Api,
    /// Structured data embedded in a profile page
    Embedded,
    /// Status code, redirect or canonical-URL behaviour
    Heuristic,
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalTier::Api => write!(f, "api"),
            SignalTier::Embedded => write!(f, "embedded"),
            SignalTier::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// A named positive signal. The tag is what ends up in `meta.source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    pub tag: &'static str,
    pub tier: SignalTier,
}

impl Signal {
    pub const fn api(tag: &'static str) -> Self {
        Signal {
            tag,
            tier: SignalTier::Api,
        }
    }

    pub const fn embedded(tag: &'static str) -> Self {
        Signal {
            tag,
            tier: SignalTier::Embedded,
        }
    }

    pub const fn heuristic(tag: &'static str) -> Self {
        Signal {
            tag,
            tier: SignalTier::Heuristic,
        }
    }
}

/// The immutable result of one (username, platform) check.
///
/// A `Found` verdict always carries the signal that justified it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    platform: String,
    username: String,
    url: String,
    existence: Existence,
    signal: Option<Signal>,
    reason: Option<String>,
    basis: Option<String>,
    evidence: Evidence,
}

impl Verdict {
    /// Build a verdict from a checker outcome
    pub fn from_outcome(platform: &str, username: &str, url: &str, outcome: Outcome) -> Self {
        let basis = outcome.basis().map(str::to_string);
        let (existence, signal, reason, evidence) = outcome.into_parts();
        let existence = match (existence, signal) {
            (Existence::Found, Some(s)) if !s.tag.is_empty() => Existence::Found,
            (Existence::Found, _) => {
                return Verdict {
                    platform: platform.to_string(),
                    username: username.to_string(),
                    url: url.to_string(),
                    existence: Existence::Unknown,
                    signal: None,
                    reason: Some("positive result without a named signal".to_string()),
                    basis,
                    evidence,
                };
            }
            (other, _) => other,
        };

        Verdict {
            platform: platform.to_string(),
            username: username.to_string(),
            url: url.to_string(),
            signal: if existence.is_found() { signal } else { None },
            existence,
            reason,
            basis,
            evidence,
        }
    }

    /// Transport-level failure for this pair
    pub fn error(platform: &str, username: &str, url: &str, message: impl Into<String>) -> Self {
        Verdict {
            platform: platform.to_string(),
            username: username.to_string(),
            url: url.to_string(),
            existence: Existence::Error {
                message: message.into(),
            },
            signal: None,
            reason: None,
            basis: None,
            evidence: Evidence::new(),
        }
    }

    /// Record the endpoint that decided this verdict
    pub fn with_basis(mut self, basis: Option<String>) -> Self {
        self.basis = basis;
        self
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn existence(&self) -> &Existence {
        &self.existence
    }

    pub fn is_found(&self) -> bool {
        self.existence.is_found()
    }

    /// Audit tag of the signal that justified `Found`
    pub fn source(&self) -> Option<&str> {
        self.signal.map(|s| s.tag)
    }

    /// Endpoint that decided a verdict other than `Found`
    pub fn basis(&self) -> Option<&str> {
        self.basis.as_deref()
    }

    pub fn tier(&self) -> Option<SignalTier> {
        self.signal.map(|s| s.tier)
    }

    /// Why the verdict is not `Found`
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Page title, if the checker extracted one
    pub fn title(&self) -> Option<&str> {
        self.evidence.get("title").and_then(|v| v.as_str())
    }

    /// Flattened audit metadata as written to `meta` in reports.
    ///
    /// `source` is always present: the signal tag for `Found`, otherwise the
    /// endpoint that decided the verdict, or null when no request was made.
    pub fn meta(&self) -> Evidence {
        let mut meta = self.evidence.clone();
        match self.signal {
            Some(signal) => {
                meta.insert("source".to_string(), signal.tag.into());
                meta.insert("tier".to_string(), signal.tier.to_string().into());
            }
            None => {
                let basis = self.basis.clone().map_or(serde_json::Value::Null, Into::into);
                meta.insert("source".to_string(), basis);
            }
        }
        if let Some(reason) = &self.reason {
            meta.insert("reason".to_string(), reason.clone().into());
        }
        if let Existence::Error { message } = &self.existence {
            meta.insert("error".to_string(), message.clone().into());
        }
        meta
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 5)?;
        state.serialize_field("platform", &self.platform)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("exists", &self.existence.exists())?;
        state.serialize_field("status", self.existence.label())?;
        state.serialize_field("meta", &self.meta())?;
        state.end()
    }
}

/// Error types for shadowhunter operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed target; raised before any network activity
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("platform '{0}' is registered more than once")]
    DuplicatePlatform(String),

    #[error("configuration error in {path}: {message}")]
    Config { path: String, message: String },

    #[error(transparent)]
    Http(#[from] TransportError),
}

/// Immutable parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    /// How the target string is interpreted
    pub mode: TargetMode,
    /// Requested platform subset (None = registry defaults)
    pub platforms: Option<Vec<String>>,
    /// Per-request timeout
    #[serde(serialize_with = "serialize_secs")]
    pub timeout: Duration,
    /// Pause between consecutive requests
    #[serde(serialize_with = "serialize_secs")]
    pub delay: Duration,
    /// Maximum checks in flight (1 = sequential)
    pub concurrency: usize,
    /// Derive username candidates from an email local-part
    pub derive: bool,
    /// Keep only Found verdicts in written reports
    pub only_found: bool,
    /// Print counts instead of the full listing
    pub summary: bool,
}

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default pause between requests
pub const DEFAULT_DELAY: Duration = Duration::from_millis(150);
/// Sequential by default for determinism
pub const DEFAULT_CONCURRENCY: usize = 1;

impl Default for RunParameters {
    fn default() -> Self {
        RunParameters {
            mode: TargetMode::Auto,
            platforms: None,
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            concurrency: DEFAULT_CONCURRENCY,
            derive: false,
            only_found: false,
            summary: false,
        }
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Run a scan against the built-in platform registry.
///
/// This is the main entry point for library users. The returned report is
/// the full report; apply `only_found()` or `summary()` as needed.
///
/// # Example
///
/// ```no_run
/// use shadowhunter::http::{HttpConfig, ReqwestFetcher};
/// use shadowhunter::{run_scan, RunParameters};
///
/// let http = ReqwestFetcher::new(HttpConfig::default()).unwrap();
/// let params = RunParameters {
///     platforms: Some(vec!["github".to_string(), "gitlab".to_string()]),
///     ..Default::default()
/// };
///
/// match run_scan("alice", &params, &http) {
///     Ok(report) => println!("{} found", report.summary().found),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_scan(
    target: &str,
    params: &RunParameters,
    http: &dyn HttpFetch,
) -> Result<ScanReport, ScanError> {
    let registry = PlatformRegistry::builtin();
    Scanner::new(&registry, http).scan(target, params, &NoopObserver)
}
