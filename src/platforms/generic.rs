//! Canonical-URL checker for sites without a public lookup API.
//!
//! A profile page that exists declares itself as the canonical URL. Pages
//! that redirect elsewhere (login, home, search) or canonicalize to another
//! path are inconclusive. A bare 200 or a page title is never enough.

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

pub fn medium() -> Platform {
    canonical(
        "medium",
        "https://medium.com/@{u}",
        Signal::heuristic("medium-canonical-url"),
        &["page not found"],
    )
}

pub fn pinterest() -> Platform {
    canonical(
        "pinterest",
        "https://www.pinterest.com/{u}/",
        Signal::heuristic("pinterest-canonical-url"),
        &["user not found"],
    )
}

pub fn soundcloud() -> Platform {
    canonical(
        "soundcloud",
        "https://soundcloud.com/{u}",
        Signal::heuristic("soundcloud-canonical-url"),
        &["we can't find that user", "we can&#x27;t find that user"],
    )
}

pub fn vimeo() -> Platform {
    canonical(
        "vimeo",
        "https://vimeo.com/{u}",
        Signal::heuristic("vimeo-canonical-url"),
        &["sorry, we couldn't find that page", "sorry, we couldn&rsquo;t find that page"],
    )
}

pub fn facebook() -> Platform {
    canonical(
        "facebook",
        "https://www.facebook.com/{u}",
        Signal::heuristic("facebook-canonical-url"),
        &["this content isn't available", "this page isn't available"],
    )
}

pub fn kaggle() -> Platform {
    canonical(
        "kaggle",
        "https://www.kaggle.com/{u}",
        Signal::heuristic("kaggle-canonical-url"),
        &[],
    )
}

/// Registered but not enabled by default: the channel page is rendered
/// client-side and serves the same canonical URL for every name.
pub fn twitch() -> Platform {
    let checker = CanonicalUrl::new(
        "https://www.twitch.tv/{u}",
        Signal::heuristic("twitch-canonical-url"),
        &["sorry. unless you've got a time machine"],
    );
    Platform::disabled("twitch", "https://www.twitch.tv/{u}", checker)
}

fn canonical(
    name: &str,
    template: &'static str,
    signal: Signal,
    negatives: &'static [&'static str],
) -> Platform {
    Platform::new(name, template, CanonicalUrl::new(template, signal, negatives))
}

pub struct CanonicalUrl {
    profile_template: &'static str,
    signal: [Signal; 1],
    negatives: &'static [&'static str],
}

impl CanonicalUrl {
    pub fn new(profile_template: &'static str, signal: Signal, negatives: &'static [&'static str]) -> Self {
        CanonicalUrl {
            profile_template,
            signal: [signal],
            negatives,
        }
    }
}

impl Checker for CanonicalUrl {
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
        if let Some(marker) = page.find_marker(self.negatives) {
            return Ok(Outcome::not_found(format!("page says '{}'", marker)));
        }

        let expected = normalize_url(&profile);
        if normalize_url(page.final_url()) != expected {
            return Ok(Outcome::unknown(format!("redirected to {}", page.final_url())));
        }

        match page.canonical_url() {
            Some(canonical) if normalize_url(&canonical) == expected => {
                Ok(Outcome::found(self.signal[0])
                    .with_evidence("canonical_url", canonical)
                    .with_optional("title", page.meta("og:title").or_else(|| page.title())))
            }
            Some(canonical) => Ok(Outcome::unknown(format!(
                "canonical url {} does not name the profile",
                canonical
            ))),
            None => Ok(Outcome::unknown("page declares no canonical url")),
        }
    }
}

/// Compare form of a URL: no scheme, no `www.`, no query or fragment, no
/// trailing slash, lowercase
pub fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    rest.trim_end_matches('/').to_string()
}
