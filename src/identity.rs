//! Target classification and username derivation.
//!
//! Turns the raw target string into an `Identifier` and, for email targets,
//! into the list of candidate usernames to check. Everything here is pure.

use std::fmt;

use serde::Serialize;

use crate::ScanError;

/// Maximum number of candidates derived from one local-part
pub const DEFAULT_CANDIDATE_CAP: usize = 8;

/// How the raw target string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Email if the target contains `@`, username otherwise
    #[default]
    Auto,
    Username,
    Email,
}

/// A classified scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Username(String),
    Email { local: String, domain: String },
}

impl Identifier {
    pub fn is_email(&self) -> bool {
        matches!(self, Identifier::Email { .. })
    }

    /// The username itself, or the email local-part
    pub fn local_part(&self) -> &str {
        match self {
            Identifier::Username(u) => u,
            Identifier::Email { local, .. } => local,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Username(u) => write!(f, "{}", u),
            Identifier::Email { local, domain } => write!(f, "{}@{}", local, domain),
        }
    }
}

/// Classify a raw target string.
///
/// Input is trimmed first. Fails with `ScanError::InvalidTarget` for empty
/// input, whitespace inside the target, more than one `@`, or an email with
/// an empty local-part or domain.
pub fn resolve_target(raw: &str, mode: TargetMode) -> Result<Identifier, ScanError> {
    let target = raw.trim();
    let invalid = |reason: &str| ScanError::InvalidTarget {
        target: raw.to_string(),
        reason: reason.to_string(),
    };

    if target.is_empty() {
        return Err(invalid("target is empty"));
    }
    if target.chars().any(char::is_whitespace) {
        return Err(invalid("target contains whitespace"));
    }

    let looks_like_email = target.contains('@');
    match mode {
        TargetMode::Auto if looks_like_email => parse_email(target).map_err(|r| invalid(r)),
        TargetMode::Email => parse_email(target).map_err(|r| invalid(r)),
        TargetMode::Username if looks_like_email => Err(invalid("username must not contain '@'")),
        TargetMode::Auto | TargetMode::Username => Ok(Identifier::Username(target.to_string())),
    }
}

fn parse_email(target: &str) -> Result<Identifier, &'static str> {
    let mut parts = target.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = match parts.next() {
        Some(d) => d,
        None => return Err("email must contain '@'"),
    };
    if parts.next().is_some() {
        return Err("email contains more than one '@'");
    }
    if local.is_empty() {
        return Err("email local-part is empty");
    }
    if domain.is_empty() {
        return Err("email domain is empty");
    }

    Ok(Identifier::Email {
        local: local.to_string(),
        domain: domain.to_string(),
    })
}

/// One transformation from an email local-part to a candidate username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationRule {
    /// The local-part unchanged
    Identity,
    Lowercase,
    /// `alice.b` -> `aliceb`
    StripDots,
    /// `alice+test` -> `alicetest`
    StripPlusSign,
    /// `alice+test` -> `alice`
    DropPlusTag,
    /// `alice.b-c` -> `alice_b_c`
    SeparatorsToUnderscore,
    /// `alice.b_c` -> `alice-b-c`
    SeparatorsToHyphen,
    /// first and last separator-delimited parts joined: `alicesmith`
    JoinFirstLast,
    /// `alice_smith`
    FirstUnderscoreLast,
    /// `alice.smith`
    FirstDotLast,
    /// `asmith`
    InitialLast,
}

/// Rules applied when derivation is requested, in order
pub const DEFAULT_RULES: &[DerivationRule] = &[
    DerivationRule::Identity,
    DerivationRule::Lowercase,
    DerivationRule::StripDots,
    DerivationRule::DropPlusTag,
    DerivationRule::StripPlusSign,
    DerivationRule::SeparatorsToUnderscore,
    DerivationRule::SeparatorsToHyphen,
    DerivationRule::JoinFirstLast,
    DerivationRule::FirstUnderscoreLast,
    DerivationRule::FirstDotLast,
    DerivationRule::InitialLast,
];

const SEPARATORS: [char; 4] = ['.', '-', '_', '+'];

impl DerivationRule {
    /// Apply the rule; `None` when it does not apply to this local-part
    pub fn apply(&self, local: &str) -> Option<String> {
        let candidate = match self {
            DerivationRule::Identity => local.to_string(),
            DerivationRule::Lowercase => local.to_lowercase(),
            DerivationRule::StripDots => local.replace('.', ""),
            DerivationRule::StripPlusSign => local.replace('+', ""),
            DerivationRule::DropPlusTag => {
                let (head, _) = local.split_once('+')?;
                head.to_string()
            }
            DerivationRule::SeparatorsToUnderscore => local.replace(['.', '-', '+'], "_"),
            DerivationRule::SeparatorsToHyphen => local.replace(['.', '_', '+'], "-"),
            DerivationRule::JoinFirstLast
            | DerivationRule::FirstUnderscoreLast
            | DerivationRule::FirstDotLast
            | DerivationRule::InitialLast => {
                let (first, last) = first_and_last(local)?;
                match self {
                    DerivationRule::JoinFirstLast => format!("{}{}", first, last),
                    DerivationRule::FirstUnderscoreLast => format!("{}_{}", first, last),
                    DerivationRule::FirstDotLast => format!("{}.{}", first, last),
                    _ => format!("{}{}", first.chars().next()?, last),
                }
            }
        };

        let meaningful = candidate.chars().any(|c| !SEPARATORS.contains(&c));
        if meaningful {
            Some(candidate)
        } else {
            None
        }
    }
}

fn first_and_last(local: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = local.split(SEPARATORS).filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }
    Some((parts[0], parts[parts.len() - 1]))
}

/// Derive candidate usernames from an email local-part.
///
/// Rules are applied in order; results are deduplicated preserving first
/// occurrence and truncated to `cap`.
pub fn derive_candidates(local: &str, rules: &[DerivationRule], cap: usize) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for rule in rules {
        if candidates.len() >= cap {
            break;
        }
        if let Some(candidate) = rule.apply(local) {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// What one run will check: the identifier plus the usernames derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub identifier: Identifier,
    pub candidates: Vec<String>,
}

impl ScanPlan {
    /// Plan with the default rule set.
    ///
    /// Usernames are checked as-is. Emails check their local-part, plus the
    /// derived candidates when `derive` is set.
    pub fn build(identifier: Identifier, derive: bool) -> Self {
        Self::with_rules(identifier, derive, DEFAULT_RULES, DEFAULT_CANDIDATE_CAP)
    }

    pub fn with_rules(
        identifier: Identifier,
        derive: bool,
        rules: &[DerivationRule],
        cap: usize,
    ) -> Self {
        let candidates = match &identifier {
            Identifier::Username(u) => vec![u.clone()],
            Identifier::Email { local, .. } if derive => derive_candidates(local, rules, cap),
            Identifier::Email { local, .. } => vec![local.clone()],
        };

        ScanPlan {
            identifier,
            candidates,
        }
    }
}
