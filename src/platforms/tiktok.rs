//! TikTok: profile pages embed the user record as JSON in the
//! `__UNIVERSAL_DATA_FOR_REHYDRATION__` script.

use serde_json::Value;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const UNIVERSAL_DATA: Signal = Signal::embedded("tiktok-universal-data");
const SIGNALS: &[Signal] = &[UNIVERSAL_DATA];

const DATA_SCRIPT_ID: &str = "__UNIVERSAL_DATA_FOR_REHYDRATION__";
const USER_NOT_EXIST: i64 = 10221;

const NEGATIVE_MARKERS: &[&str] = &["couldn't find this account", "couldn&#39;t find this account"];

pub fn platform() -> Platform {
    Platform::new("tiktok", "https://www.tiktok.com/@{u}", TikTok)
}

pub struct TikTok;

impl Checker for TikTok {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let response = http.get(&format!("https://www.tiktok.com/@{}", encode(username)))?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let page = Page::new(&response);
        let detail = page
            .script_by_id(DATA_SCRIPT_ID)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .and_then(|data| data.pointer("/__DEFAULT_SCOPE__/webapp.user-detail").cloned());

        if let Some(detail) = detail {
            let status = detail.get("statusCode").and_then(Value::as_i64);
            if status == Some(USER_NOT_EXIST) {
                return Ok(Outcome::not_found("user detail status 10221"));
            }

            let user = detail.pointer("/userInfo/user");
            let unique_id = user
                .and_then(|u| u.get("uniqueId"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if status == Some(0) && unique_id.eq_ignore_ascii_case(username) {
                let mut outcome = Outcome::found(UNIVERSAL_DATA)
                    .with_evidence("unique_id", unique_id)
                    .with_optional("nickname", user.and_then(|u| view::str_field(u, "nickname")))
                    .with_optional("id", user.and_then(|u| view::str_field(u, "id")));
                if let Some(followers) = detail
                    .pointer("/userInfo/stats/followerCount")
                    .and_then(Value::as_i64)
                {
                    outcome = outcome.with_evidence("followers", followers);
                }
                return Ok(outcome);
            }
        }

        match page.find_marker(NEGATIVE_MARKERS) {
            Some(_) => Ok(Outcome::not_found("page says the account cannot be found")),
            None => Ok(Outcome::unknown("no user detail in embedded data")),
        }
    }
}
