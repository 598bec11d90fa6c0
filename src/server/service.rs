use super::request::parse_request;
use super::response::{write_sink, ResponseSink};
use crate::adapter::Procedure;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

/// `may_minihttp` service running one shared [`Procedure`] per request.
///
/// `may_minihttp` clones the service once per connection; the clone only
/// bumps the `Arc`, so every connection sees the same read-only registry.
#[derive(Clone)]
pub struct AppService {
    pub procedure: Arc<dyn Procedure>,
}

impl AppService {
    pub fn new(procedure: impl Procedure + 'static) -> Self {
        Self {
            procedure: Arc::new(procedure),
        }
    }

    pub fn from_shared(procedure: Arc<dyn Procedure>) -> Self {
        Self { procedure }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = parse_request(req);
        let mut sink = ResponseSink::new();
        self.procedure.call(&mut sink, &request);
        write_sink(res, sink);
        Ok(())
    }
}
