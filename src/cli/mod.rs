//! # CLI Module
//!
//! Command-line front end of the documentation pipeline, used by the
//! `routedoc-gen` binary.
//!
//! ```bash
//! routedoc-gen [--html <FILE>] [--pretty] [--cargo <BIN>] \
//!     [--target-dir <DIR>] [--timeout-secs <N>] [--offline] <CRATE_DIR>
//! ```
//!
//! Without `--html` the documentation is written to stdout as JSON. Logs go
//! to stderr. On any failure nothing is written and the process exits with
//! status 1.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use routedoc::cli::{run, Cli};
//! use routedoc::runtime_config::RuntimeConfig;
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["routedoc-gen", "--pretty", "."]);
//! run(&cli, &RuntimeConfig::from_env())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run, run_cli, Cli};
