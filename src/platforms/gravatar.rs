//! Gravatar probe for email targets.
//!
//! Gravatar addresses profiles by a SHA-256 hash of the normalized email.
//! The JSON profile is tried first; the avatar endpoint with `d=404`
//! answers 404 when no image is registered.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{Checker, Outcome, Platform};
use crate::{Signal, Verdict};

const PROFILE_JSON: Signal = Signal::api("gravatar-profile-json");
const AVATAR: Signal = Signal::api("gravatar-avatar");
const SIGNALS: &[Signal] = &[PROFILE_JSON, AVATAR];

/// Hex SHA-256 of the trimmed, lowercased email
pub fn email_hash(email: &str) -> String {
    hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
}

pub fn json_url(hash: &str) -> String {
    format!("https://gravatar.com/{}.json", hash)
}

pub fn avatar_url(hash: &str) -> String {
    format!("https://gravatar.com/avatar/{}?d=404", hash)
}

/// Gravatar as a platform whose "username" is the email hash
pub fn platform() -> Platform {
    Platform::new("gravatar", "https://gravatar.com/avatar/{u}?d=404", Gravatar)
}

/// Probe the Gravatar entry for an email. One verdict, never panics.
pub fn probe(http: &dyn HttpFetch, email: &str) -> Verdict {
    platform().check(http, &email_hash(email))
}

pub struct Gravatar;

impl Checker for Gravatar {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, hash: &str) -> Result<Outcome, TransportError> {
        let json_url = json_url(hash);
        let img_url = avatar_url(hash);

        let response = http.get(&json_url)?;
        if response.status == 200 {
            if let Some(entry) = view::json(&response).and_then(|j| j.pointer("/entry/0").cloned()) {
                return Ok(Outcome::found(PROFILE_JSON)
                    .with_evidence("gravatar_json_url", json_url)
                    .with_evidence("gravatar_img_url", img_url)
                    .with_optional("display_name", view::str_field(&entry, "displayName"))
                    .with_optional("profile_url", view::str_field(&entry, "profileUrl"))
                    .with_optional(
                        "username",
                        entry.get("preferredUsername").and_then(Value::as_str),
                    ));
            }
        }

        let avatar = http.head(&img_url)?;
        let outcome = match avatar.status {
            200 => Outcome::found(AVATAR),
            404 => Outcome::not_found("no profile and no avatar"),
            _ => view::classify_status(&avatar)
                .unwrap_or_else(|| Outcome::unknown(format!("avatar http {}", avatar.status))),
        };

        Ok(outcome
            .with_evidence("gravatar_json_url", json_url)
            .with_evidence("gravatar_img_url", img_url))
    }
}
