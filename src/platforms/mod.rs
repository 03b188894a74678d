//! Per-platform existence checkers.
//!
//! Every platform is one type implementing `Checker`. A checker declares the
//! positive signals it may emit and turns HTTP responses into an `Outcome`.
//!
//! # Decision Policy
//!
//! - Found: only when one of the declared signals fires unambiguously
//! - NotFound: HTTP 404/410 or an explicit negative marker
//! - Unknown: 429, 5xx, login/consent walls, ambiguous markup
//! - Expected negatives are never returned as `Err`
//!
//! `Platform::check` wraps a checker so that transport errors and panics
//! become an `Error` verdict for that pair only, and so that a `Found` built
//! on an undeclared signal is downgraded to `Unknown`.

pub mod devto;
pub mod generic;
pub mod github;
pub mod gitlab;
pub mod gravatar;
pub mod hackernews;
pub mod keybase;
pub mod reddit;
pub mod social;
pub mod stackoverflow;
pub mod steam;
pub mod tiktok;
pub mod view;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::http::{HttpFetch, HttpResponse, TransportError};
use crate::{Evidence, Existence, Signal, Verdict};

/// Per-platform existence test.
pub trait Checker: Send + Sync {
    /// Positive signals this checker may emit
    fn signals(&self) -> &[Signal];

    /// Check one username. `Err` is reserved for transport failures.
    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError>;
}

/// What a checker concluded, before it is bound to a platform and URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    existence: Existence,
    signal: Option<Signal>,
    reason: Option<String>,
    basis: Option<String>,
    evidence: Evidence,
}

impl Outcome {
    pub fn found(signal: Signal) -> Self {
        Outcome {
            existence: Existence::Found,
            signal: Some(signal),
            reason: None,
            basis: None,
            evidence: Evidence::new(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Outcome {
            existence: Existence::NotFound,
            signal: None,
            reason: Some(reason.into()),
            basis: None,
            evidence: Evidence::new(),
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Outcome {
            existence: Existence::Unknown,
            signal: None,
            reason: Some(reason.into()),
            basis: None,
            evidence: Evidence::new(),
        }
    }

    /// Name what decided a negative or inconclusive outcome. Without it the
    /// host of the checker's last request is used.
    pub fn via(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }

    pub fn with_evidence(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.evidence.insert(key.to_string(), value.into());
        self
    }

    /// Attach evidence only when present and non-empty
    pub fn with_optional(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(v) if !v.trim().is_empty() => self.with_evidence(key, v.trim().to_string()),
            _ => self,
        }
    }

    pub fn existence(&self) -> &Existence {
        &self.existence
    }

    pub fn signal(&self) -> Option<Signal> {
        self.signal
    }

    pub fn basis(&self) -> Option<&str> {
        self.basis.as_deref()
    }

    /// Replace a positive outcome with Unknown, keeping the evidence
    pub fn downgrade(self, reason: impl Into<String>) -> Self {
        Outcome {
            existence: Existence::Unknown,
            signal: None,
            reason: Some(reason.into()),
            basis: self.basis,
            evidence: self.evidence,
        }
    }

    pub fn into_parts(self) -> (Existence, Option<Signal>, Option<String>, Evidence) {
        (self.existence, self.signal, self.reason, self.evidence)
    }
}

/// A registered platform: descriptor plus checker.
pub struct Platform {
    name: String,
    profile_template: String,
    enabled: bool,
    checker: Box<dyn Checker>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("name", &self.name)
            .field("profile_template", &self.profile_template)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Platform {
    /// An enabled platform. `profile_template` uses `{u}` for the username.
    pub fn new(name: &str, profile_template: &str, checker: impl Checker + 'static) -> Self {
        Platform {
            name: name.to_string(),
            profile_template: profile_template.to_string(),
            enabled: true,
            checker: Box::new(checker),
        }
    }

    /// A platform kept in the registry but excluded from defaults
    pub fn disabled(name: &str, profile_template: &str, checker: impl Checker + 'static) -> Self {
        Platform {
            enabled: false,
            ..Platform::new(name, profile_template, checker)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn signals(&self) -> &[Signal] {
        self.checker.signals()
    }

    /// Public profile URL for a username
    pub fn profile_url(&self, username: &str) -> String {
        self.profile_template.replace("{u}", &encode(username))
    }

    /// Run the checker and bind its outcome to a verdict. Never panics.
    pub fn check(&self, http: &dyn HttpFetch, username: &str) -> Verdict {
        let url = self.profile_url(username);
        debug!(platform = %self.name, username, "checking");

        let trail = RequestTrail::new(http);
        let result = catch_unwind(AssertUnwindSafe(|| self.checker.check(&trail, username)));

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(platform = %self.name, username, error = %e, "transport error");
                return Verdict::error(&self.name, username, &url, e.to_string())
                    .with_basis(trail.last_host());
            }
            Err(_) => {
                warn!(platform = %self.name, username, "checker panicked");
                return Verdict::error(&self.name, username, &url, "checker panicked")
                    .with_basis(trail.last_host());
            }
        };
        let outcome = match (outcome.basis(), trail.last_host()) {
            (None, Some(host)) => outcome.via(host),
            _ => outcome,
        };

        let outcome = match outcome.signal() {
            Some(signal) if outcome.existence().is_found() && !self.signals().contains(&signal) => {
                warn!(
                    platform = %self.name,
                    tag = signal.tag,
                    "undeclared signal, downgrading to unknown"
                );
                outcome.downgrade(format!("undeclared signal '{}'", signal.tag))
            }
            _ => outcome,
        };

        Verdict::from_outcome(&self.name, username, &url, outcome)
    }
}

/// Passes requests through and remembers the host of the last one, which
/// names the endpoint behind a negative verdict.
struct RequestTrail<'a> {
    inner: &'a dyn HttpFetch,
    last: Mutex<Option<String>>,
}

impl<'a> RequestTrail<'a> {
    fn new(inner: &'a dyn HttpFetch) -> Self {
        RequestTrail {
            inner,
            last: Mutex::new(None),
        }
    }

    fn note(&self, url: &str) {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        if let Ok(mut last) = self.last.lock() {
            *last = host;
        }
    }

    fn last_host(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl HttpFetch for RequestTrail<'_> {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.note(url);
        self.inner.get(url)
    }

    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.note(url);
        self.inner.head(url)
    }
}

/// Percent-encode a username for use in a URL path or query
pub fn encode(username: &str) -> String {
    url::form_urlencoded::byte_serialize(username.as_bytes()).collect()
}
