pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, Request};
pub use response::{write_sink, Outcome, ResponseSink, JSON_CONTENT_TYPE};
pub use service::AppService;
