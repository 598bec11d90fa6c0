//! The response sink handed to every handler, and its hand-off to the
//! transport.

use dashmap::DashMap;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::io;
use std::sync::Arc;
use tracing::warn;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Content type every adapter response carries.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// What happened while producing the response body.
///
/// Set by the adapter, the registry and the recovery middleware so that outer
/// layers (tracing, status policy) can react without re-parsing the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// The handler value was encoded.
    #[default]
    Success,
    /// The handler returned an error; the body is an error envelope.
    HandlerError,
    /// The handler value could not be encoded; the body is an error envelope.
    EncodingError,
    /// The handler panicked and the recovery middleware wrote the envelope.
    Panic,
    /// No route matched the path.
    NotFound,
    /// The path matched but not the method.
    MethodNotAllowed,
}

impl Outcome {
    /// `true` for every outcome whose body is an error envelope.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, Outcome::Success)
    }
}

/// Response under construction.
///
/// Handlers receive `&mut ResponseSink` as their first argument. The sink
/// starts out with the transport default status (`200`), no headers and an
/// empty body. It implements [`io::Write`] so encoders can stream into it.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    status: u16,
    headers: HeaderVec,
    body: Vec<u8>,
    outcome: Outcome,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
            outcome: Outcome::Success,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Drop anything written so far. Used before an error envelope replaces
    /// partial output.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Replace the whole body.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body is not valid JSON for `T`.
    pub fn body_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }

    /// Split the sink into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderVec, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl io::Write for ResponseSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("OK")
}

/// Upper bound on distinct interned header lines.
const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// Leaked header lines, reused across responses.
///
/// `may_minihttp` only accepts `&'static str` header lines. Each distinct
/// line is leaked once; past `cap` new lines are refused, so headers must
/// have low cardinality. `Allow` is exempt from the cap: its values are
/// subsets of the registered methods.
pub(crate) struct HeaderLines {
    lines: DashMap<String, &'static str>,
    cap: usize,
}

impl HeaderLines {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            lines: DashMap::new(),
            cap,
        }
    }

    fn intern(&self, line: String, capped: bool) -> Option<&'static str> {
        if let Some(found) = self.lines.get(&line) {
            return Some(*found);
        }
        if capped && self.lines.len() >= self.cap {
            return None;
        }
        let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
        Some(*self.lines.entry(line).or_insert(leaked))
    }

    pub(crate) fn line(&self, name: &str, value: &str) -> Option<&'static str> {
        if name.eq_ignore_ascii_case("content-type") && value == JSON_CONTENT_TYPE {
            return Some("Content-Type: application/json");
        }
        let capped = !name.eq_ignore_ascii_case("allow");
        self.intern(format!("{name}: {value}"), capped)
    }
}

static HEADER_LINES: Lazy<HeaderLines> =
    Lazy::new(|| HeaderLines::with_capacity(MAX_INTERNED_HEADER_LINES));

/// Copy a finished sink onto the transport response.
pub fn write_sink(res: &mut Response, sink: ResponseSink) {
    let (status, headers, body) = sink.into_parts();
    res.status_code(usize::from(status), status_reason(status));
    for (name, value) in &headers {
        match HEADER_LINES.line(name, value) {
            Some(line) => {
                res.header(line);
            }
            None => warn!(
                header = %name,
                "Header dropped: interned header line limit reached"
            ),
        }
    }
    res.body_vec(body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
    }

    #[test]
    fn test_sink_defaults_to_transport_status() {
        let sink = ResponseSink::new();
        assert_eq!(sink.status(), 200);
        assert!(sink.body().is_empty());
        assert_eq!(sink.outcome(), Outcome::Success);
    }

    #[test]
    fn test_only_success_is_not_a_failure() {
        assert!(!Outcome::Success.is_failure());
        for outcome in [
            Outcome::HandlerError,
            Outcome::EncodingError,
            Outcome::Panic,
            Outcome::NotFound,
            Outcome::MethodNotAllowed,
        ] {
            assert!(outcome.is_failure(), "{outcome:?}");
        }
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut sink = ResponseSink::new();
        sink.set_header("Content-Type", "text/plain");
        sink.set_header("content-type", JSON_CONTENT_TYPE);
        assert_eq!(sink.headers().count(), 1);
        assert_eq!(sink.header("CONTENT-TYPE"), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_sink_is_a_writer() {
        let mut sink = ResponseSink::new();
        write!(sink, "{{\"a\":1}}").unwrap();
        let value: serde_json::Value = sink.body_json().unwrap();
        assert_eq!(value["a"], 1);
        sink.clear_body();
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_header_lines_are_interned_once() {
        let lines = HeaderLines::with_capacity(8);
        let a = lines.line("Allow", "GET, POST").unwrap();
        let b = lines.line("Allow", "GET, POST").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, "Allow: GET, POST");
        assert_eq!(lines.lines.len(), 1);
    }

    #[test]
    fn test_full_table_still_serves_known_and_allow_lines() {
        let lines = HeaderLines::with_capacity(4);
        let kept = lines.line("X-Region", "eu").unwrap();
        for n in 0..10 {
            lines.line("X-Trace", &format!("t{n}"));
        }
        assert_eq!(lines.lines.len(), 4);
        assert_eq!(lines.line("X-Trace", "fresh"), None);
        assert!(std::ptr::eq(lines.line("X-Region", "eu").unwrap(), kept));
        assert_eq!(
            lines.line("Allow", "DELETE, PATCH"),
            Some("Allow: DELETE, PATCH")
        );
        assert_eq!(
            lines.line("content-type", JSON_CONTENT_TYPE),
            Some("Content-Type: application/json")
        );
    }
}
