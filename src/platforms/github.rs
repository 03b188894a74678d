//! GitHub: users API, with the profile page as fallback when the API is
//! rate limited or unavailable.

use tracing::debug;

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const USERS_API: Signal = Signal::api("api.github.com");
const PROFILE_META: Signal = Signal::embedded("github-profile-meta");
const SIGNALS: &[Signal] = &[USERS_API, PROFILE_META];

pub fn platform() -> Platform {
    Platform::new("github", "https://github.com/{u}", GitHub)
}

pub struct GitHub;

impl Checker for GitHub {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let api_url = format!("https://api.github.com/users/{}", encode(username));
        let response = http.get(&api_url)?;

        match response.status {
            200 => {
                if let Some(user) = view::json(&response) {
                    let login = view::str_field(&user, "login").unwrap_or_default();
                    if login.eq_ignore_ascii_case(username) {
                        return Ok(Outcome::found(USERS_API)
                            .with_evidence("login", login)
                            .with_optional("name", view::str_field(&user, "name"))
                            .with_optional("bio", view::str_field(&user, "bio"))
                            .with_optional("created_at", view::str_field(&user, "created_at")));
                    }
                }
                Ok(Outcome::unknown("users api returned an unexpected body"))
            }
            404 => Ok(Outcome::not_found("http 404 from users api")),
            status => {
                debug!(status, "github users api unavailable, falling back to profile page");
                check_profile_page(http, username)
            }
        }
    }
}

fn check_profile_page(http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
    let response = http.get(&format!("https://github.com/{}", encode(username)))?;
    if let Some(outcome) = view::classify_status(&response) {
        return Ok(outcome);
    }

    let page = Page::new(&response);
    match page.meta("profile:username") {
        Some(login) if login.eq_ignore_ascii_case(username) => Ok(Outcome::found(PROFILE_META)
            .with_evidence("login", login)
            .with_optional("title", page.title())),
        _ => Ok(Outcome::unknown("profile page carries no profile:username")),
    }
}
