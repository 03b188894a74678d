//! DEV Community: `/api/users/by_username` returns the user or 404.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const USERS_API: Signal = Signal::api("dev.to/api");
const SIGNALS: &[Signal] = &[USERS_API];

pub fn platform() -> Platform {
    Platform::new("devto", "https://dev.to/{u}", DevTo)
}

pub struct DevTo;

impl Checker for DevTo {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let url = format!("https://dev.to/api/users/by_username?url={}", encode(username));
        let response = http.get(&url)?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let user = match view::json(&response) {
            Some(user) => user,
            None => return Ok(Outcome::unknown("users api returned an unexpected body")),
        };

        match view::str_field(&user, "username") {
            Some(name) if name.eq_ignore_ascii_case(username) => {
                let mut outcome = Outcome::found(USERS_API)
                    .with_evidence("username", name)
                    .with_optional("name", view::str_field(&user, "name"))
                    .with_optional("summary", view::str_field(&user, "summary"))
                    .with_optional("joined_at", view::str_field(&user, "joined_at"));
                if let Some(id) = user.get("id").and_then(Value::as_u64) {
                    outcome = outcome.with_evidence("id", id);
                }
                Ok(outcome)
            }
            _ => Ok(Outcome::unknown("users api returned a different user")),
        }
    }
}
