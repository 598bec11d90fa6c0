use serde::Deserialize;

use crate::adapter::Procedure;
use crate::server::{Outcome, Request, ResponseSink};

/// Status codes to apply when a request fails.
///
/// Every field defaults to `None`, which leaves the status as the handler
/// (or transport) set it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorStatusPolicy {
    /// Applied when the handler returned an error
    pub handler_error: Option<u16>,
    /// Applied when the success value could not be encoded
    pub encoding_error: Option<u16>,
    /// Applied when a panic was recovered
    pub panic: Option<u16>,
}

impl ErrorStatusPolicy {
    /// `500` for every failure.
    #[must_use]
    pub fn internal_server_error() -> Self {
        Self {
            handler_error: Some(500),
            encoding_error: Some(500),
            panic: Some(500),
        }
    }

    #[must_use]
    pub fn status_for(&self, outcome: Outcome) -> Option<u16> {
        match outcome {
            Outcome::HandlerError => self.handler_error,
            Outcome::EncodingError => self.encoding_error,
            Outcome::Panic => self.panic,
            Outcome::Success | Outcome::NotFound | Outcome::MethodNotAllowed => None,
        }
    }
}

/// Rewrites the status of failed requests according to an
/// [`ErrorStatusPolicy`].
///
/// Must sit outside [`Recovery`](super::Recovery) to see recovered panics.
pub struct StatusPolicy<P> {
    inner: P,
    policy: ErrorStatusPolicy,
}

impl<P: Procedure> StatusPolicy<P> {
    pub fn new(inner: P, policy: ErrorStatusPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<P: Procedure> Procedure for StatusPolicy<P> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        self.inner.call(sink, req);
        let outcome = sink.outcome();
        if !outcome.is_failure() {
            return;
        }
        if let Some(status) = self.policy.status_for(outcome) {
            sink.set_status(status);
        }
    }
}
