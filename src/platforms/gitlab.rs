//! GitLab: the public users search endpoint answers with an empty array for
//! unknown usernames.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const USERS_API: Signal = Signal::api("gitlab.com/api/v4");
const SIGNALS: &[Signal] = &[USERS_API];

pub fn platform() -> Platform {
    Platform::new("gitlab", "https://gitlab.com/{u}", GitLab)
}

pub struct GitLab;

impl Checker for GitLab {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let url = format!("https://gitlab.com/api/v4/users?username={}", encode(username));
        let response = http.get(&url)?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let users = match view::json(&response) {
            Some(Value::Array(users)) => users,
            _ => return Ok(Outcome::unknown("users api returned an unexpected body")),
        };

        let user = users.iter().find(|u| {
            view::str_field(u, "username")
                .map(|name| name.eq_ignore_ascii_case(username))
                .unwrap_or(false)
        });

        match user {
            Some(user) => {
                let mut outcome = Outcome::found(USERS_API)
                    .with_optional("name", view::str_field(user, "name"))
                    .with_optional("state", view::str_field(user, "state"))
                    .with_optional("web_url", view::str_field(user, "web_url"));
                if let Some(id) = user.get("id").and_then(Value::as_u64) {
                    outcome = outcome.with_evidence("id", id);
                }
                Ok(outcome)
            }
            None if users.is_empty() => Ok(Outcome::not_found("no user with that username")),
            None => Ok(Outcome::unknown("users api returned other usernames")),
        }
    }
}
