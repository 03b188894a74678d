//! Social networks whose server-rendered pages expose the profile only via
//! Open Graph tags. All of them put login walls in front of some requests;
//! a wall is inconclusive, never a negative.

use crate::http::{HttpFetch, TransportError};
use crate::platforms::generic::normalize_url;
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

/// What an `og:title` must satisfy to count as the profile
#[derive(Debug, Clone, Copy)]
pub enum TitleRule {
    /// The title names the handle as `(@username)`
    Handle,
    /// The page canonicalizes to the profile URL and has a title
    CanonicalProfile,
}

pub fn instagram() -> Platform {
    Platform::new(
        "instagram",
        "https://www.instagram.com/{u}/",
        OgTitle {
            profile_template: "https://www.instagram.com/{u}/",
            signal: [Signal::embedded("instagram-og-title")],
            negatives: &["sorry, this page isn't available", "sorry, this page isn&#39;t available"],
            walls: &["/accounts/login"],
            rule: TitleRule::Handle,
        },
    )
}

pub fn x() -> Platform {
    Platform::new(
        "x",
        "https://x.com/{u}",
        OgTitle {
            profile_template: "https://x.com/{u}",
            signal: [Signal::embedded("x-og-title")],
            negatives: &["this account doesn't exist", "this account doesn’t exist"],
            walls: &["/i/flow/login", "/login"],
            rule: TitleRule::Handle,
        },
    )
}

pub fn linkedin() -> Platform {
    Platform::new(
        "linkedin",
        "https://www.linkedin.com/in/{u}/",
        OgTitle {
            profile_template: "https://www.linkedin.com/in/{u}/",
            signal: [Signal::embedded("linkedin-og-title")],
            negatives: &["profile not found", "this profile is not available"],
            walls: &["/authwall", "/login", "/checkpoint"],
            rule: TitleRule::CanonicalProfile,
        },
    )
}

pub struct OgTitle {
    profile_template: &'static str,
    signal: [Signal; 1],
    negatives: &'static [&'static str],
    walls: &'static [&'static str],
    rule: TitleRule,
}

impl Checker for OgTitle {
    fn signals(&self) -> &[Signal] {
        &self.signal
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let profile = self.profile_template.replace("{u}", &encode(username));
        let response = http.get(&profile)?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }
        if !response.is_success() {
            return Ok(Outcome::unknown(format!("unexpected http {}", response.status)));
        }

        let page = Page::new(&response);
        if self.walls.iter().any(|wall| page.final_url().contains(wall)) {
            return Ok(Outcome::unknown("login wall"));
        }
        if let Some(marker) = page.find_marker(self.negatives) {
            return Ok(Outcome::not_found(format!("page says '{}'", marker)));
        }

        let title = match page.meta("og:title") {
            Some(title) => title,
            None => return Ok(Outcome::unknown("page has no og:title")),
        };

        let matches = match self.rule {
            TitleRule::Handle => title
                .to_lowercase()
                .contains(&format!("(@{})", username.to_lowercase())),
            TitleRule::CanonicalProfile => page
                .canonical_url()
                .map(|c| normalize_url(&c) == normalize_url(&profile))
                .unwrap_or(false),
        };

        if matches {
            Ok(Outcome::found(self.signal[0])
                .with_evidence("title", title)
                .with_optional("description", page.meta("og:description")))
        } else {
            Ok(Outcome::unknown("og:title does not identify the profile"))
        }
    }
}
