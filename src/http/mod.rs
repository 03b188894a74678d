//! HTTP client adapter.
//!
//! Issues GET/HEAD requests with a per-request timeout and returns status,
//! headers, final URL and body, or a `TransportError`.

pub mod client;

pub use client::{HttpConfig, HttpFetch, HttpResponse, Method, ReqwestFetcher, TransportError};
