//! Response inspection helpers shared by checkers.
//!
//! Pages are searched with a small tag scanner rather than a full HTML
//! parser: checkers only need the `<title>`, `<meta>` and `<link>` tags and
//! lowercase marker lookups.

use serde_json::Value;

use crate::http::HttpResponse;
use crate::platforms::Outcome;

/// Classify statuses that settle a check before the body is looked at.
///
/// - 404/410 -> NotFound
/// - 401/403, 429, 5xx -> Unknown
pub fn classify_status(response: &HttpResponse) -> Option<Outcome> {
    match response.status {
        404 | 410 => Some(Outcome::not_found(format!("http {}", response.status))),
        429 => Some(Outcome::unknown("rate limited (http 429)")),
        401 | 403 => Some(Outcome::unknown(format!(
            "access denied (http {})",
            response.status
        ))),
        500..=599 => Some(Outcome::unknown(format!(
            "server error (http {})",
            response.status
        ))),
        _ => None,
    }
}

/// Parse the body as JSON
pub fn json(response: &HttpResponse) -> Option<Value> {
    serde_json::from_str(&response.body).ok()
}

/// String field of a JSON object, if present and non-null
pub fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A fetched HTML page with a lowercase copy for marker lookups.
pub struct Page<'a> {
    response: &'a HttpResponse,
    lower: String,
}

impl<'a> Page<'a> {
    pub fn new(response: &'a HttpResponse) -> Self {
        Page {
            response,
            lower: response.body.to_ascii_lowercase(),
        }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// URL after redirects
    pub fn final_url(&self) -> &str {
        &self.response.url
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.lower.contains(&marker.to_ascii_lowercase())
    }

    /// First of `markers` present in the page (case-insensitive)
    pub fn find_marker<'m>(&self, markers: &[&'m str]) -> Option<&'m str> {
        markers.iter().copied().find(|m| self.contains(m))
    }

    /// Text of the `<title>` element, entity-decoded and whitespace-collapsed
    pub fn title(&self) -> Option<String> {
        let open = find_tag(&self.lower, "title", 0)?;
        let start = self.lower[open..].find('>')? + open + 1;
        let end = self.lower[start..].find("</title")? + start;
        let title = collapse_whitespace(&decode_entities(&self.response.body[start..end]));
        if title.is_empty() {
            None
        } else {
            Some(title)
        }
    }

    /// `content` of the first `<meta>` whose `property` or `name` equals `key`
    pub fn meta(&self, key: &str) -> Option<String> {
        self.tags("meta").into_iter().find_map(|attrs| {
            let matches = attrs
                .iter()
                .any(|(k, v)| (k == "property" || k == "name") && v.eq_ignore_ascii_case(key));
            if matches {
                attr(&attrs, "content").filter(|c| !c.trim().is_empty())
            } else {
                None
            }
        })
    }

    /// `href` of `<link rel="canonical">`, falling back to `og:url`
    pub fn canonical_url(&self) -> Option<String> {
        self.tags("link")
            .into_iter()
            .find_map(|attrs| {
                let canonical = attr(&attrs, "rel")
                    .map(|rel| rel.eq_ignore_ascii_case("canonical"))
                    .unwrap_or(false);
                if canonical {
                    attr(&attrs, "href")
                } else {
                    None
                }
            })
            .or_else(|| self.meta("og:url"))
    }

    /// Raw body of the `<script id="...">` element
    pub fn script_by_id(&self, id: &str) -> Option<&str> {
        let mut from = 0;
        while let Some(open) = find_tag(&self.lower, "script", from) {
            let end = open + self.lower[open..].find('>')?;
            let attrs = attributes(&self.response.body[open + 1..end]);
            if attr(&attrs, "id").as_deref() == Some(id) {
                let close = end + self.lower[end..].find("</script")?;
                return Some(&self.response.body[end + 1..close]);
            }
            from = end;
        }
        None
    }

    /// Attribute lists of every `<name ...>` tag in document order
    fn tags(&self, name: &str) -> Vec<Vec<(String, String)>> {
        let mut out = Vec::new();
        let mut from = 0;
        while let Some(open) = find_tag(&self.lower, name, from) {
            let end = match self.lower[open..].find('>') {
                Some(offset) => open + offset,
                None => break,
            };
            out.push(attributes(&self.response.body[open + 1..end]));
            from = end;
        }
        out
    }
}

/// Byte offset of the next `<name` tag opening at or after `from`
fn find_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("<{}", name);
    let mut from = from;
    while let Some(offset) = lower.get(from..)?.find(&needle) {
        let open = from + offset;
        let after = open + needle.len();
        match lower.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(open),
            Some(_) => from = after,
            None => return None,
        }
    }
    None
}

fn attr(attrs: &[(String, String)], name: &str) -> Option<String> {
    attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

/// Parse `name="value"` pairs from the inside of a tag (tag name first)
fn attributes(tag: &str) -> Vec<(String, String)> {
    let b = tag.as_bytes();
    let mut i = 0;
    while i < b.len() && !b[i].is_ascii_whitespace() {
        i += 1;
    }

    let mut out = Vec::new();
    loop {
        while i < b.len() && (b[i].is_ascii_whitespace() || b[i] == b'/') {
            i += 1;
        }
        if i >= b.len() {
            break;
        }

        let start = i;
        while i < b.len() && b[i] != b'=' && !b[i].is_ascii_whitespace() && b[i] != b'/' {
            i += 1;
        }
        let name = tag[start..i].to_ascii_lowercase();
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < b.len() && b[i] == b'=' {
            i += 1;
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = if i < b.len() && (b[i] == b'"' || b[i] == b'\'') {
                let quote = b[i];
                i += 1;
                let value_start = i;
                while i < b.len() && b[i] != quote {
                    i += 1;
                }
                let value = &tag[value_start..i];
                if i < b.len() {
                    i += 1;
                }
                value
            } else {
                let value_start = i;
                while i < b.len() && !b[i].is_ascii_whitespace() {
                    i += 1;
                }
                &tag[value_start..i]
            };
            out.push((name, decode_entities(value)));
        } else if !name.is_empty() {
            out.push((name, String::new()));
        }
    }
    out
}

/// Decode the handful of HTML entities profile pages actually use
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
