//! Keybase: the lookup API returns `them: [null]` for unknown usernames.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const LOOKUP_API: Signal = Signal::api("keybase.io/_/api");
const SIGNALS: &[Signal] = &[LOOKUP_API];

/// Status code Keybase uses for a syntactically invalid username
const STATUS_BAD_USERNAME: i64 = 100;
const STATUS_NOT_FOUND: i64 = 205;

pub fn platform() -> Platform {
    Platform::new("keybase", "https://keybase.io/{u}", Keybase)
}

pub struct Keybase;

impl Checker for Keybase {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let url = format!(
            "https://keybase.io/_/api/1.0/user/lookup.json?usernames={}&fields=basics,profile",
            encode(username)
        );
        let response = http.get(&url)?;
        let body = view::json(&response);

        let status = body
            .as_ref()
            .and_then(|b| b.pointer("/status/code"))
            .and_then(Value::as_i64);
        match status {
            Some(STATUS_BAD_USERNAME) => return Ok(Outcome::not_found("not a valid keybase username")),
            Some(STATUS_NOT_FOUND) => return Ok(Outcome::not_found("lookup returned NOT_FOUND")),
            _ => {}
        }
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let first = body
            .as_ref()
            .and_then(|b| b.get("them"))
            .and_then(Value::as_array)
            .and_then(|them| them.first().cloned());

        match first {
            Some(Value::Null) => Ok(Outcome::not_found("lookup returned null")),
            Some(user) => {
                let name = user
                    .pointer("/basics/username")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if !name.eq_ignore_ascii_case(username) {
                    return Ok(Outcome::unknown("lookup returned a different user"));
                }
                Ok(Outcome::found(LOOKUP_API)
                    .with_evidence("username", name)
                    .with_optional("id", view::str_field(&user, "id"))
                    .with_optional(
                        "full_name",
                        user.pointer("/profile/full_name").and_then(Value::as_str),
                    ))
            }
            None => Ok(Outcome::unknown("lookup api returned an unexpected body")),
        }
    }
}
