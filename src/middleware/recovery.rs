use crate::adapter::{write_envelope, Procedure};
use crate::server::{Outcome, Request, ResponseSink};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Prefix of the envelope message written for a recovered panic.
pub const PANIC_PREFIX: &str = "PANIC: ";

/// Text of a panic payload: `&str` and `String` verbatim, anything else a
/// fixed placeholder.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Turns a panic in the wrapped procedure into `{"Error": "PANIC: ..."}`.
///
/// Whatever the procedure wrote to the body is discarded; headers and status
/// are kept. The sink is the only state touched, so other requests never see
/// the failure.
pub struct Recovery<P> {
    inner: P,
}

impl<P: Procedure> Recovery<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Procedure> Procedure for Recovery<P> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        let result = catch_unwind(AssertUnwindSafe(|| self.inner.call(sink, req)));
        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            error!(
                request_id = %req.id,
                method = %req.method,
                path = %req.path,
                panic = %message,
                "Handler panicked"
            );
            sink.clear_body();
            sink.set_outcome(Outcome::Panic);
            write_envelope(sink, &format!("{PANIC_PREFIX}{message}"));
        }
    }
}
