//! Hacker News: the Firebase API returns the user object, or the literal
//! `null` for unknown ids. Ids are case-sensitive.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const USER_API: Signal = Signal::api("hacker-news.firebaseio.com");
const SIGNALS: &[Signal] = &[USER_API];

pub fn platform() -> Platform {
    Platform::new("hackernews", "https://news.ycombinator.com/user?id={u}", HackerNews)
}

pub struct HackerNews;

impl Checker for HackerNews {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let url = format!(
            "https://hacker-news.firebaseio.com/v0/user/{}.json",
            encode(username)
        );
        let response = http.get(&url)?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        match view::json(&response) {
            Some(Value::Null) => Ok(Outcome::not_found("api returned null")),
            Some(user) if view::str_field(&user, "id").as_deref() == Some(username) => {
                let mut outcome = Outcome::found(USER_API);
                if let Some(karma) = user.get("karma").and_then(Value::as_i64) {
                    outcome = outcome.with_evidence("karma", karma);
                }
                if let Some(created) = user.get("created").and_then(Value::as_i64) {
                    outcome = outcome.with_evidence("created", created);
                }
                Ok(outcome)
            }
            _ => Ok(Outcome::unknown("user api returned an unexpected body")),
        }
    }
}
