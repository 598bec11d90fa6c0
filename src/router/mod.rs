//! # Router Module
//!
//! Route declaration and dispatch.
//!
//! Application code declares [`Route`]s, usually collected into a
//! [`RouteTable`]. A [`RegistryBuilder`] turns routes into an immutable
//! [`Registry`], which is itself a [`Procedure`](crate::adapter::Procedure)
//! and can be handed to the server as-is.
//!
//! ## Architecture
//!
//! 1. **Registration**: every `(method, path)` pair is checked for
//!    duplicates (parameter names do not count: `/items/{id}` and
//!    `/items/{key}` are the same path) and inserted into a radix tree.
//! 2. **Matching**: the request path is walked segment by segment, static
//!    segments first, `{param}` segments second, with backtracking.
//!    Parameters captured on the way are attached to the request.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use routedoc::{route, Request, ResponseSink, RouteTable};
//!
//! fn hello(_: &mut ResponseSink, req: &Request) -> Result<String, String> {
//!     Ok(format!("hello {}", req.path_param("name").unwrap_or("?")))
//! }
//!
//! let table = RouteTable::new(vec![route(Method::GET, "/hello/{name}", hello)]);
//! let registry = table.registry().unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

mod core;
mod radix;
mod registry;
#[cfg(test)]
mod tests;

pub use core::{route, Route, RouteTable};
pub use radix::RadixTree;
pub use registry::{Registry, RegistryBuilder, RouteError};
