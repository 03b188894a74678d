//! Reddit: `about.json` is authoritative. The HTML profile is only consulted
//! for explicit negatives when the JSON endpoint is blocked; it never yields
//! a positive.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const ABOUT_JSON: Signal = Signal::api("reddit-about-json");
const SIGNALS: &[Signal] = &[ABOUT_JSON];

const NEGATIVE_MARKERS: &[&str] = &[
    "sorry, nobody on reddit goes by that name",
    "this account has been suspended",
    "this account may have been banned",
];

pub fn platform() -> Platform {
    Platform::new("reddit", "https://www.reddit.com/user/{u}/", Reddit)
}

pub struct Reddit;

impl Checker for Reddit {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let about = format!("https://www.reddit.com/user/{}/about.json", encode(username));
        let response = http.get(&about)?;

        match response.status {
            404 | 410 => return Ok(Outcome::not_found(format!("http {} from about.json", response.status))),
            200 => {
                let data = view::json(&response).and_then(|j| j.get("data").cloned());
                if let Some(data) = data {
                    let name = view::str_field(&data, "name").unwrap_or_default();
                    if name.eq_ignore_ascii_case(username) {
                        let mut outcome = Outcome::found(ABOUT_JSON).with_evidence("name", name);
                        if let Some(created) = data.get("created_utc").and_then(Value::as_f64) {
                            outcome = outcome.with_evidence("created_utc", created);
                        }
                        if let Some(karma) = data.get("total_karma").and_then(Value::as_i64) {
                            outcome = outcome.with_evidence("total_karma", karma);
                        }
                        if data.get("is_suspended").and_then(Value::as_bool) == Some(true) {
                            outcome = outcome.with_evidence("suspended", true);
                        }
                        return Ok(outcome);
                    }
                }
            }
            _ => {}
        }

        check_profile_negatives(http, username)
    }
}

fn check_profile_negatives(http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
    let response = http.get(&format!("https://www.reddit.com/user/{}/", encode(username)))?;
    if let Some(outcome) = view::classify_status(&response) {
        return Ok(outcome);
    }

    let page = Page::new(&response);
    match page.find_marker(NEGATIVE_MARKERS) {
        Some(marker) => Ok(Outcome::not_found(format!("profile page says '{}'", marker))),
        None => Ok(Outcome::unknown("about.json unavailable and profile page inconclusive")),
    }
}
