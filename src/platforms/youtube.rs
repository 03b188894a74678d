//! YouTube: a handle page that exists canonicalizes to `/channel/UC...`.

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view::{self, Page};
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const CHANNEL_ID: Signal = Signal::embedded("youtube-channel-id");
const SIGNALS: &[Signal] = &[CHANNEL_ID];

const NEGATIVE_MARKERS: &[&str] = &["this channel does not exist", "this page isn't available"];

pub fn platform() -> Platform {
    Platform::new("youtube", "https://www.youtube.com/@{u}", YouTube)
}

pub struct YouTube;

impl Checker for YouTube {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let response = http.get(&format!("https://www.youtube.com/@{}", encode(username)))?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        let page = Page::new(&response);
        if page.final_url().contains("consent.youtube.com") {
            return Ok(Outcome::unknown("consent wall"));
        }
        if page.find_marker(NEGATIVE_MARKERS).is_some() {
            return Ok(Outcome::not_found("page says the channel does not exist"));
        }

        let channel_id = page
            .canonical_url()
            .and_then(|url| url.split("/channel/").nth(1).map(str::to_string))
            .map(|id| id.trim_end_matches('/').to_string())
            .filter(|id| id.starts_with("UC"));

        match channel_id {
            Some(id) => Ok(Outcome::found(CHANNEL_ID)
                .with_evidence("channel_id", id)
                .with_optional("title", page.meta("og:title"))),
            None => Ok(Outcome::unknown("no channel id in canonical url")),
        }
    }
}
