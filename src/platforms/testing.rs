//! Scripted transport for checker unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::http::{HttpFetch, HttpResponse, Method, TransportError};

type Scripted = Result<HttpResponse, TransportError>;

/// Replays canned responses keyed by (method, url). Unscripted URLs fail
/// with a connect error so a test notices an unexpected request.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: HashMap<(&'static str, String), Scripted>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            ("GET", url.to_string()),
            Ok(HttpResponse::new(status, url, body)),
        );
        self
    }

    /// GET that lands on `final_url` after redirects
    pub fn on_redirect(mut self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            ("GET", url.to_string()),
            Ok(HttpResponse::new(status, final_url, body)),
        );
        self
    }

    pub fn on_head(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            ("HEAD", url.to_string()),
            Ok(HttpResponse::new(status, url, "")),
        );
        self
    }

    pub fn on_timeout(mut self, url: &str) -> Self {
        self.responses.insert(
            ("GET", url.to_string()),
            Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        );
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn respond(&self, method: Method, url: &str) -> Scripted {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let key = match method {
            Method::Get => "GET",
            Method::Head => "HEAD",
        };
        self.responses
            .get(&(key, url.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Connect {
                    url: url.to_string(),
                    message: "unscripted request".to_string(),
                })
            })
    }
}

impl HttpFetch for ScriptedHttp {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.respond(Method::Get, url)
    }

    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.respond(Method::Head, url)
    }
}
