//! # Typed Module
//!
//! The handler contract. A handler is a function from a response sink and a
//! request to a value or an error:
//!
//! ```rust,ignore
//! fn get_item(sink: &mut ResponseSink, req: &Request) -> Result<Item, MyError>;
//! ```
//!
//! The contract is enforced by the [`Handler`] trait bound, so a callable of
//! any other shape is rejected by the compiler when it is registered. The
//! success type must also be `Default + Example`; those two supply the
//! sample response used when documentation is generated.
//!
//! ```rust
//! use routedoc::{Example, Request, ResponseSink};
//! use serde::Serialize;
//!
//! #[derive(Serialize, Default)]
//! struct Item {
//!     name: String,
//! }
//!
//! impl Example for Item {}
//!
//! fn get_item(_: &mut ResponseSink, req: &Request) -> Result<Item, String> {
//!     Ok(Item { name: req.form_value("name") })
//! }
//! # let _ = routedoc::route(http::Method::GET, "/item", get_item);
//! ```

mod core;

pub use core::*;
