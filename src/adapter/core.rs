use crate::server::{Outcome, Request, ResponseSink, JSON_CONTENT_TYPE};
use crate::typed::{sample, Handler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A uniform network-facing procedure: fills a sink for a request.
///
/// Adapted handlers, the registry and every middleware layer implement it,
/// so they compose freely.
pub trait Procedure: Send + Sync {
    fn call(&self, sink: &mut ResponseSink, req: &Request);
}

impl<P: Procedure + ?Sized> Procedure for Arc<P> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        (**self).call(sink, req);
    }
}

impl<P: Procedure + ?Sized> Procedure for Box<P> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        (**self).call(sink, req);
    }
}

/// The one JSON shape every failure takes: `{"Error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "Error")]
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Encode one JSON document followed by a newline.
fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Replace the body with `{"Error": message}` and mark the JSON content type.
pub fn write_envelope(sink: &mut ResponseSink, message: &str) {
    sink.set_header("Content-Type", JSON_CONTENT_TYPE);
    let body = encode(&ErrorEnvelope::new(message))
        .unwrap_or_else(|_| b"{\"Error\":\"error envelope encoding failed\"}\n".to_vec());
    sink.set_body(body);
}

/// Turns a typed [`Handler`] into a [`Procedure`].
///
/// The value is encoded into a buffer before anything reaches the sink, so
/// the body is always exactly one JSON document: the value, or an envelope
/// carrying the handler error or the encoding error. The status is left
/// alone on every path.
pub struct Adapter<H> {
    handler: H,
}

impl<H: Handler> Adapter<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: Handler> Procedure for Adapter<H> {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        sink.set_header("Content-Type", JSON_CONTENT_TYPE);
        match self.handler.handle(sink, req) {
            Err(err) => {
                let message = err.to_string();
                debug!(
                    request_id = %req.id,
                    handler = self.handler.identity(),
                    error = %message,
                    "Handler returned error"
                );
                sink.set_outcome(Outcome::HandlerError);
                write_envelope(sink, &message);
            }
            Ok(value) => match encode(&value) {
                Ok(body) => {
                    sink.set_outcome(Outcome::Success);
                    sink.set_body(body);
                }
                Err(err) => {
                    debug!(
                        request_id = %req.id,
                        handler = self.handler.identity(),
                        error = %err,
                        "Response encoding failed"
                    );
                    sink.set_outcome(Outcome::EncodingError);
                    write_envelope(sink, &err.to_string());
                }
            },
        }
    }
}

/// Object-safe view of an adapted handler, as stored in a route.
pub trait AdaptedHandler: Procedure {
    /// Qualified handler name, see [`Handler::identity`].
    fn identity(&self) -> &'static str;

    /// Type name of the success value.
    fn response_type(&self) -> &'static str;

    /// Documented sample of the success value for one route, as JSON.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if the sample cannot be represented as JSON.
    fn sample_response(
        &self,
        method: &str,
        url: &str,
        func_name: &str,
    ) -> serde_json::Result<serde_json::Value>;
}

impl<H: Handler> AdaptedHandler for Adapter<H> {
    fn identity(&self) -> &'static str {
        self.handler.identity()
    }

    fn response_type(&self) -> &'static str {
        std::any::type_name::<H::Response>()
    }

    fn sample_response(
        &self,
        method: &str,
        url: &str,
        func_name: &str,
    ) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(sample::<H::Response>(method, url, func_name))
    }
}
