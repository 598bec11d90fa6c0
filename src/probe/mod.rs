//! Recovering sample responses by running the route table.
//!
//! Source scanning cannot tell what a handler's success value looks like as
//! JSON. The probe answers that: [`CargoProbe`] renders a tiny binary crate
//! that depends on the documented crate, calls [`emit`] on one route table,
//! and decodes what the binary prints. The exchange is one JSON array of
//! [`ProbeRecord`]s on stdout; anything on stderr is diagnostics only.
//!
//! Tests and alternative backends plug in through [`Oracle`].

mod emit;
mod error;
mod program;
mod runner;

use serde::{Deserialize, Serialize};

use crate::docs::Endpoint;
use crate::manifest::CrateManifest;

pub use emit::{describe, emit};
pub use error::ProbeError;
pub use program::{render_program, write_program, CargoProbe, ProbeProgram};
pub use runner::{run_probe, STDERR_TAIL_LINES};

/// One route as reported by a probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Func")]
    pub func: String,
    #[serde(rename = "Response", default)]
    pub response: serde_json::Value,
}

impl From<ProbeRecord> for Endpoint {
    fn from(record: ProbeRecord) -> Self {
        Endpoint {
            method: record.method,
            url: record.url,
            package: record.package,
            func: record.func,
            doc: String::new(),
            response: record.response,
        }
    }
}

/// What to probe: one route table of one crate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub manifest: CrateManifest,
    /// Group name, for diagnostics
    pub table_name: String,
    /// Expression of type `&RouteTable` valid in a crate depending on the
    /// target, e.g. `&*my_app::api::URLS`
    pub table_expr: String,
}

/// Source of endpoint lists for route tables.
pub trait Oracle {
    /// The endpoints of `target`, in table order, without docs.
    ///
    /// # Errors
    ///
    /// Returns the [`ProbeError`] of the failing stage.
    fn probe(&self, target: &ProbeTarget) -> Result<Vec<Endpoint>, ProbeError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn probe(&self, target: &ProbeTarget) -> Result<Vec<Endpoint>, ProbeError> {
        (**self).probe(target)
    }
}
