//! Report assembly.
//!
//! Folds the verdicts of a run and its metadata into a `ScanReport`, and
//! provides the "only found" and summary views over it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::engine::orchestrator::ScanResults;
use crate::engine::registry::{Diagnostic, Resolution};
use crate::identity::{Identifier, ScanPlan};
use crate::version::{DEFAULT_AUTHOR, TOOL_NAME};
use crate::{Existence, RunParameters, Verdict};

/// Tool identity stamped on every report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub author: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        ToolInfo {
            name: TOOL_NAME.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Platform verdicts for one derived candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateHits {
    pub candidate: String,
    pub hits: Vec<Verdict>,
}

/// Email-mode results
#[derive(Debug, Clone, PartialEq)]
pub struct EmailScan {
    pub gravatar: Option<Verdict>,
    pub username_candidates: Vec<String>,
    pub platform_hits: Vec<CandidateHits>,
}

/// What was scanned, with its verdicts
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSubject {
    Username { username: String, hits: Vec<Verdict> },
    Email { email: String, scan: EmailScan },
}

/// One verdict with the subject it was checked for, as flattened for
/// tabular output
#[derive(Debug, Clone, Copy)]
pub struct Entry<'r> {
    /// `username`, `email` (gravatar) or `email-derived`
    pub mode: &'static str,
    pub subject: &'r str,
    pub verdict: &'r Verdict,
}

/// A Found verdict as listed in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositiveHit {
    pub subject: String,
    pub platform: String,
    pub url: String,
    pub source: String,
}

/// Counts over every verdict in a report. `unknown` includes errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub found: usize,
    pub not_found: usize,
    pub unknown: usize,
    pub errors: usize,
    pub total: usize,
    pub positives: Vec<PositiveHit>,
}

/// The complete, immutable result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub tool: ToolInfo,
    pub timestamp: DateTime<Utc>,
    pub params: RunParameters,
    /// Platforms actually checked, in order
    pub platforms: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub subject: ReportSubject,
    /// Summary of the unfiltered run, kept by `only_found`
    pub run_summary: Option<ReportSummary>,
}

impl ScanReport {
    pub fn is_email(&self) -> bool {
        matches!(self.subject, ReportSubject::Email { .. })
    }

    /// The target as given (username or full email)
    pub fn target(&self) -> &str {
        match &self.subject {
            ReportSubject::Username { username, .. } => username,
            ReportSubject::Email { email, .. } => email,
        }
    }

    /// ISO-8601 UTC timestamp with second precision
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Every verdict in report order, with the subject it belongs to
    pub fn entries(&self) -> Vec<Entry<'_>> {
        match &self.subject {
            ReportSubject::Username { username, hits } => hits
                .iter()
                .map(|verdict| Entry {
                    mode: "username",
                    subject: username,
                    verdict,
                })
                .collect(),
            ReportSubject::Email { email, scan } => {
                let gravatar = scan.gravatar.iter().map(|verdict| Entry {
                    mode: "email",
                    subject: email,
                    verdict,
                });
                let derived = scan.platform_hits.iter().flat_map(|group| {
                    group.hits.iter().map(move |verdict| Entry {
                        mode: "email-derived",
                        subject: &group.candidate,
                        verdict,
                    })
                });
                gravatar.chain(derived).collect()
            }
        }
    }

    pub fn all_verdicts(&self) -> Vec<&Verdict> {
        self.entries().into_iter().map(|e| e.verdict).collect()
    }

    /// Found verdicts in report order
    pub fn found(&self) -> Vec<&Verdict> {
        self.all_verdicts().into_iter().filter(|v| v.is_found()).collect()
    }

    /// Copy of the report keeping exactly the Found verdicts.
    ///
    /// Candidate groups left empty are dropped; the gravatar verdict is kept
    /// only if Found. Candidates and metadata are unchanged, and the written
    /// `summary` still describes the whole run.
    pub fn only_found(&self) -> ScanReport {
        let subject = match &self.subject {
            ReportSubject::Username { username, hits } => ReportSubject::Username {
                username: username.clone(),
                hits: hits.iter().filter(|v| v.is_found()).cloned().collect(),
            },
            ReportSubject::Email { email, scan } => ReportSubject::Email {
                email: email.clone(),
                scan: EmailScan {
                    gravatar: scan.gravatar.clone().filter(Verdict::is_found),
                    username_candidates: scan.username_candidates.clone(),
                    platform_hits: scan
                        .platform_hits
                        .iter()
                        .filter_map(|group| {
                            let hits: Vec<Verdict> =
                                group.hits.iter().filter(|v| v.is_found()).cloned().collect();
                            if hits.is_empty() {
                                None
                            } else {
                                Some(CandidateHits {
                                    candidate: group.candidate.clone(),
                                    hits,
                                })
                            }
                        })
                        .collect(),
                },
            },
        };

        ScanReport {
            subject,
            run_summary: Some(self.run_summary()),
            ..self.clone()
        }
    }

    /// Summary of the whole run, even after `only_found`
    pub fn run_summary(&self) -> ReportSummary {
        self.run_summary.clone().unwrap_or_else(|| self.summary())
    }

    /// Counts and positive hits over the verdicts in this report
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();

        for entry in self.entries() {
            summary.total += 1;
            match entry.verdict.existence() {
                Existence::Found => {
                    summary.found += 1;
                    summary.positives.push(PositiveHit {
                        subject: entry.subject.to_string(),
                        platform: entry.verdict.platform().to_string(),
                        url: entry.verdict.url().to_string(),
                        source: entry.verdict.source().unwrap_or_default().to_string(),
                    });
                }
                Existence::NotFound => summary.not_found += 1,
                Existence::Unknown => summary.unknown += 1,
                Existence::Error { .. } => {
                    summary.unknown += 1;
                    summary.errors += 1;
                }
            }
        }

        summary
    }
}

impl Serialize for ScanReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tool", &self.tool.name)?;
        map.serialize_entry("author", &self.tool.author)?;
        map.serialize_entry("version", &self.tool.version)?;
        map.serialize_entry("timestamp", &self.timestamp_string())?;
        map.serialize_entry("params", &self.params)?;
        map.serialize_entry("platforms", &self.platforms)?;
        map.serialize_entry("diagnostics", &self.diagnostics)?;
        map.serialize_entry("summary", &self.run_summary())?;

        match &self.subject {
            ReportSubject::Username { username, hits } => {
                let found: Vec<&Verdict> = hits.iter().filter(|v| v.is_found()).collect();
                map.serialize_entry("username", username)?;
                map.serialize_entry("hits", hits)?;
                map.serialize_entry("found", &found)?;
            }
            ReportSubject::Email { email, scan } => {
                map.serialize_entry("email", email)?;
                map.serialize_entry("email_scan", scan)?;
            }
        }
        map.end()
    }
}

impl Serialize for EmailScan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("gravatar", &self.gravatar)?;
        map.serialize_entry("username_candidates", &self.username_candidates)?;
        map.serialize_entry("platform_hits", &PlatformHits(&self.platform_hits))?;
        map.end()
    }
}

/// `{ candidate: [hits] }` in candidate order
struct PlatformHits<'a>(&'a [CandidateHits]);

impl Serialize for PlatformHits<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in self.0 {
            map.serialize_entry(&group.candidate, &group.hits)?;
        }
        map.end()
    }
}

/// Builds reports from orchestrator results.
pub struct ReportAssembler {
    tool: ToolInfo,
}

impl ReportAssembler {
    pub fn new(tool: ToolInfo) -> Self {
        ReportAssembler { tool }
    }

    pub fn assemble(
        &self,
        params: &RunParameters,
        plan: &ScanPlan,
        resolution: &Resolution<'_>,
        results: ScanResults,
        timestamp: DateTime<Utc>,
    ) -> ScanReport {
        let subject = match &plan.identifier {
            Identifier::Username(username) => ReportSubject::Username {
                username: username.clone(),
                hits: results
                    .groups
                    .into_iter()
                    .next()
                    .map(|g| g.verdicts)
                    .unwrap_or_default(),
            },
            Identifier::Email { .. } => ReportSubject::Email {
                email: plan.identifier.to_string(),
                scan: EmailScan {
                    gravatar: results.gravatar,
                    username_candidates: plan.candidates.clone(),
                    platform_hits: results
                        .groups
                        .into_iter()
                        .map(|g| CandidateHits {
                            candidate: g.candidate,
                            hits: g.verdicts,
                        })
                        .collect(),
                },
            },
        };

        ScanReport {
            tool: self.tool.clone(),
            timestamp,
            params: params.clone(),
            platforms: resolution.names(),
            diagnostics: resolution.diagnostics.clone(),
            subject,
            run_summary: None,
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(ToolInfo::default())
    }
}
