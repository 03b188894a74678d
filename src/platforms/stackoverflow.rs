//! Stack Overflow: profiles are addressed by numeric user id. A name that
//! is not an id cannot be looked up, so the result is Unknown and no request
//! is made.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{Checker, Outcome, Platform};
use crate::Signal;

const USERS_API: Signal = Signal::api("api.stackexchange.com");
const SIGNALS: &[Signal] = &[USERS_API];

pub fn platform() -> Platform {
    Platform::new("stack_overflow", "https://stackoverflow.com/users/{u}", StackOverflow)
}

pub struct StackOverflow;

impl Checker for StackOverflow {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let id: u64 = match username.parse() {
            Ok(id) if username.bytes().all(|b| b.is_ascii_digit()) => id,
            _ => return Ok(Outcome::unknown("profiles are addressed by numeric user id")),
        };

        let url = format!("https://api.stackexchange.com/2.3/users/{}?site=stackoverflow", id);
        let response = http.get(&url)?;

        // throttling is reported as 400 with an error_id body
        let body = view::json(&response);
        if let Some(error) = body.as_ref().and_then(|b| view::str_field(b, "error_name")) {
            return Ok(Outcome::unknown(format!("api error: {}", error)));
        }
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let items = match body.as_ref().and_then(|b| b.get("items")).and_then(Value::as_array) {
            Some(items) => items,
            None => return Ok(Outcome::unknown("users api returned an unexpected body")),
        };

        let user = items
            .iter()
            .find(|u| u.get("user_id").and_then(Value::as_u64) == Some(id));
        match user {
            Some(user) => {
                let mut outcome = Outcome::found(USERS_API)
                    .with_evidence("user_id", id)
                    .with_optional("display_name", view::str_field(user, "display_name"))
                    .with_optional("link", view::str_field(user, "link"));
                if let Some(rep) = user.get("reputation").and_then(Value::as_i64) {
                    outcome = outcome.with_evidence("reputation", rep);
                }
                Ok(outcome)
            }
            None => Ok(Outcome::not_found("no user with that id")),
        }
    }
}
