//! # Runtime Configuration Module
//!
//! Environment-driven settings read once at startup.
//!
//! ## Environment Variables
//!
//! ### `ROUTEDOC_STACK_SIZE`
//!
//! Stack size for `may` coroutines (one per connection). Accepts decimal
//! (`16384`) or hexadecimal (`0x4000`). Default: `0x4000` (16 KB).
//!
//! ### `ROUTEDOC_PROBE_TIMEOUT_SECS`
//!
//! Upper bound on one probe run (compile plus execute) during documentation
//! generation. The child is killed when it is exceeded. Default: `300`.
//!
//! ### `ROUTEDOC_CARGO_BIN`
//!
//! Cargo executable used to build and run probes. Default: `cargo`.
//!
//! ```rust
//! use routedoc::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
    pub probe_timeout: Duration,
    pub cargo_bin: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            cargo_bin: PathBuf::from("cargo"),
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal size.
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables. Unparseable values
    /// fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let stack_size = env::var("ROUTEDOC_STACK_SIZE")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(defaults.stack_size);
        let probe_timeout = env::var("ROUTEDOC_PROBE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.probe_timeout);
        let cargo_bin = env::var_os("ROUTEDOC_CARGO_BIN")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cargo_bin);
        RuntimeConfig {
            stack_size,
            probe_timeout,
            cargo_bin,
        }
    }

    /// Apply the coroutine settings to the `may` runtime.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}
