//! Handler contract checks over parsed source.
//!
//! Handlers registered in code are checked by the compiler through the
//! [`Handler`](crate::Handler) bound. When documentation is generated, the
//! scanner checks every handler function a route table names before any
//! probe is compiled, so a malformed handler is reported with its position
//! in the signature instead of as a compiler error in generated code.

mod core;

pub use core::{verify_signature, ContractError, Position, Verifier};
