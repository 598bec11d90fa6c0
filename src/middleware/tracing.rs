use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::adapter::Procedure;
use crate::server::{Outcome, Request, ResponseSink};

/// Wraps a procedure in a per-request span and logs its completion.
pub struct Traced<P> {
    inner: P,
}

impl<P: Procedure> Traced<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Procedure> Procedure for Traced<P> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        let span = info_span!(
            "request",
            request_id = %req.id,
            method = %req.method,
            path = %req.path,
        );
        let _entered = span.enter();
        let start = Instant::now();

        self.inner.call(sink, req);

        let latency_us = start.elapsed().as_micros() as u64;
        match sink.outcome() {
            Outcome::Panic => warn!(
                status = sink.status(),
                outcome = ?sink.outcome(),
                latency_us,
                "Request recovered from panic"
            ),
            outcome => info!(
                status = sink.status(),
                outcome = ?outcome,
                latency_us,
                "Request completed"
            ),
        }
    }
}
