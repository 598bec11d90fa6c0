//! # routedoc
//!
//! **routedoc** serves typed JSON request handlers on `may_minihttp` and
//! generates API documentation for them from the crate's own source.
//!
//! ## Overview
//!
//! A handler is a plain function from a response sink and a request to a
//! `Result`:
//!
//! ```rust,ignore
//! fn list_items(sink: &mut ResponseSink, req: &Request) -> Result<Vec<Item>, MyError>
//! ```
//!
//! The same function is used twice. At serve time it is adapted into a
//! [`Procedure`] that always answers with exactly one JSON document: the
//! value, or `{"Error": "<message>"}`. At documentation time the crate's
//! source is scanned for route tables and each table is probed to recover
//! example responses that source alone cannot show.
//!
//! ## Architecture
//!
//! - **[`typed`]** - the [`Handler`] contract and the [`Example`] capability
//! - **[`adapter`]** - turns a handler into a [`Procedure`] with the error envelope
//! - **[`router`]** - [`Route`], [`RouteTable`] and the dispatching [`Registry`]
//! - **[`middleware`]** - panic recovery, status policy, tracing
//! - **[`server`]** - request/response types and the `may_minihttp` service
//! - **[`contract`]** - handler signature checks over parsed source
//! - **[`scanner`]** - finds route tables and doc comments in a crate
//! - **[`probe`]** - compiles and runs a throwaway program per route table
//! - **[`docs`]** - the documentation model with JSON and HTML renderers
//! - **[`cli`]** - the `routedoc-gen` front end
//!
//! ### Request Handling Flow
//!
//! ```text
//! may_minihttp ─► AppService ─► Traced ─► StatusPolicy ─► Recovery ─► Registry ─► Adapter ─► handler
//! ```
//!
//! ### Documentation Flow
//!
//! ```text
//! Cargo.toml + src/ ─► scanner::discover ─► Oracle::probe (per table) ─► Documentation ─► JSON | HTML
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use routedoc::middleware::ProcedureExt;
//! use routedoc::server::{AppService, HttpServer};
//! use routedoc::{route, Request, ResponseSink, RouteTable};
//!
//! fn hello(_: &mut ResponseSink, req: &Request) -> Result<String, String> {
//!     Ok(format!("hello {}", req.form_value("name")))
//! }
//!
//! let table = RouteTable::new(vec![route(Method::GET, "/hello", hello)]);
//! let registry = table.registry().expect("valid routes");
//! let service = AppService::new(registry.with_recovery().with_tracing());
//! let handle = HttpServer(service).start("127.0.0.1:8080").expect("bind");
//! handle.join().ok();
//! ```
//!
//! ## Runtime Considerations
//!
//! routedoc runs on the `may` coroutine runtime: one coroutine per
//! connection, handlers called synchronously inside it. Coroutine stack size
//! comes from `ROUTEDOC_STACK_SIZE` (see [`runtime_config`]).

pub mod adapter;
pub mod cli;
pub mod config;
pub mod contract;
pub mod docs;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod probe;
pub mod router;
pub mod runtime_config;
pub mod scanner;
pub mod server;
pub mod typed;

pub use adapter::{ErrorEnvelope, Procedure};
pub use docs::{Documentation, Endpoint, RouteGroup};
pub use router::{route, Registry, RegistryBuilder, Route, RouteError, RouteTable};
pub use server::{Request, ResponseSink};
pub use typed::{Example, Handler};
