//! Minimal response abstraction consumed by the dispatch engine.
//!
//! The engine itself only needs to mark and query whether a response has
//! been produced, so the terminal fallback never writes over handler output.
//! The convenience writers exist for handlers and tests; a transport
//! collaborator serializes the finished value onto the wire.

use http::StatusCode;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::warn;

/// Maximum inline headers before heap allocation.
/// Most responses carry ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because names repeat across responses
/// (Content-Type, Allow, ...) and `Arc::clone()` is O(1); values remain
/// `String` as per-response data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A response under construction during dispatch.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderVec,
    body: Vec<u8>,
    sent: bool,
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderVec::new(),
            body: Vec::new(),
            sent: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether a response has already been produced. The engine queries this
    /// to detect "handler produced output without calling its continuation"
    /// and to keep the terminal fallback from writing twice.
    #[must_use]
    pub fn sent(&self) -> bool {
        self.sent
    }

    /// Write a text body and mark the response sent. A second send is
    /// ignored with a warning; the first response wins.
    pub fn send(&mut self, body: impl Into<String>) {
        if self.sent {
            warn!("response already sent; duplicate send ignored");
            return;
        }
        if self.get_header("content-type").is_none() {
            self.set_header("content-type", "text/plain".to_string());
        }
        self.body = body.into().into_bytes();
        self.sent = true;
    }

    /// Write a JSON body and mark the response sent.
    pub fn send_json(&mut self, body: &serde_json::Value) {
        if self.sent {
            warn!("response already sent; duplicate send ignored");
            return;
        }
        self.set_header("content-type", "application/json".to_string());
        self.body = body.to_string().into_bytes();
        self.sent = true;
    }

    /// Set the status and send its canonical reason phrase as the body.
    pub fn send_status(&mut self, status: StatusCode) {
        self.set_status(status);
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());
        self.send(reason);
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let mut res = Response::new();
        res.set_header("Content-Type", "text/html".to_string());
        assert_eq!(res.get_header("content-type"), Some("text/html"));
        res.set_header("content-type", "text/plain".to_string());
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_first_send_wins() {
        let mut res = Response::new();
        res.send("first");
        res.send("second");
        assert_eq!(res.body_text(), "first");
        assert!(res.sent());
    }

    #[test]
    fn test_send_status_uses_reason() {
        let mut res = Response::new();
        res.send_status(StatusCode::NOT_FOUND);
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.body_text(), "Not Found");
    }
}
