//! Steam: vanity profile URLs answer `?xml=1` with either a `<profile>`
//! document carrying `<steamID64>` or an `<error>` document.

use crate::http::{HttpFetch, TransportError};
use crate::platforms::view;
use crate::platforms::{encode, Checker, Outcome, Platform};
use crate::Signal;

const PROFILE_XML: Signal = Signal::api("steam-profile-xml");
const SIGNALS: &[Signal] = &[PROFILE_XML];

pub fn platform() -> Platform {
    Platform::new("steam", "https://steamcommunity.com/id/{u}", Steam)
}

pub struct Steam;

impl Checker for Steam {
    fn signals(&self) -> &[Signal] {
        SIGNALS
    }

    fn check(&self, http: &dyn HttpFetch, username: &str) -> Result<Outcome, TransportError> {
        let url = format!("https://steamcommunity.com/id/{}/?xml=1", encode(username));
        let response = http.get(&url)?;
        if let Some(outcome) = view::classify_status(&response) {
            return Ok(outcome);
        }

        if let Some(error) = xml_text(&response.body, "error") {
            return Ok(Outcome::not_found(error));
        }

        match xml_text(&response.body, "steamID64") {
            Some(id) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(Outcome::found(PROFILE_XML)
                    .with_evidence("steam_id64", id)
                    .with_optional("display_name", xml_text(&response.body, "steamID")))
            }
            _ => Ok(Outcome::unknown("profile xml has no steamID64")),
        }
    }
}

/// Text content of the first `<tag>` element, unwrapping CDATA
fn xml_text(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    let text = body[start..end].trim();
    let text = text
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text);
    Some(view::decode_entities(text.trim()))
}
