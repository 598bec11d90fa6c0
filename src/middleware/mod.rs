//! Procedure wrappers.
//!
//! Each middleware wraps a [`Procedure`] and is one itself. Compose them with
//! [`ProcedureExt`], innermost first:
//!
//! ```rust,ignore
//! let app = registry
//!     .with_recovery()
//!     .with_status_policy(ErrorStatusPolicy::internal_server_error())
//!     .with_tracing();
//! ```

mod recovery;
mod status;
mod tracing;
#[cfg(test)]
mod tests;

pub use self::tracing::Traced;
pub use recovery::{panic_message, Recovery, PANIC_PREFIX};
pub use status::{ErrorStatusPolicy, StatusPolicy};

use crate::adapter::Procedure;

/// Builder-style wrapping for any procedure.
pub trait ProcedureExt: Procedure + Sized {
    /// Catch panics and answer with a `PANIC:` envelope.
    fn with_recovery(self) -> Recovery<Self> {
        Recovery::new(self)
    }

    /// Per-request span plus a completion log line.
    fn with_tracing(self) -> Traced<Self> {
        Traced::new(self)
    }

    /// Map failure outcomes to status codes.
    fn with_status_policy(self, policy: ErrorStatusPolicy) -> StatusPolicy<Self> {
        StatusPolicy::new(self, policy)
    }
}

impl<P: Procedure + Sized> ProcedureExt for P {}
