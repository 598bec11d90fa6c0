//! # Source Scanner
//!
//! Recovers documentation for a crate from its source and a probe.
//!
//! The scanner reads the crate's `Cargo.toml`, parses the library and every
//! non-test module reachable from it with `syn`, and looks for route tables:
//! `static` items of type `RouteTable` (usually behind `Lazy`/`LazyLock`)
//! and argument-less functions returning one. Types are matched by resolving
//! paths through the module's `use` declarations, so a `RouteTable` from an
//! unrelated crate is never picked up and a renamed or glob import still is.
//!
//! ## Pipeline
//!
//! 1. [`discover`]: manifest, module tree, doc table, route tables, and a
//!    contract check of every crate function the tables register;
//! 2. [`Scanner::probe_all`]: one [`Oracle`](crate::probe::Oracle) call per
//!    table, in source order, with the doc comment of each handler attached
//!    to its endpoint.
//!
//! Any failure ends the scan with a [`ScanError`].

mod core;
mod docs;
mod error;
mod modules;
mod resolve;
mod tables;

pub use core::{discover, DiscoveredTable, Discovery, Scanner};
pub use docs::{doc_text, DocTable};
pub use error::ScanError;
pub use modules::{load_modules, Module, ModuleTree};
pub use resolve::Resolver;
pub use tables::{RoutingLibrary, TableKind};
