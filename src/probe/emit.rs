//! Probe child side: describe a route table on stdout.

use std::io::{self, Write};
use std::process::ExitCode;

use super::ProbeRecord;
use crate::router::RouteTable;
use crate::typed::split_identity;

/// One record per route, in table order.
///
/// The sample response is the success type's example for the route, or its
/// `Default` value.
///
/// # Errors
///
/// Returns the encoder error for a sample that cannot be represented as JSON.
pub fn describe(table: &RouteTable) -> serde_json::Result<Vec<ProbeRecord>> {
    table
        .iter()
        .map(|route| {
            let handler = route.handler();
            let (package, func) = split_identity(handler.identity());
            let method = route.method().as_str();
            let response = handler.sample_response(method, route.path(), func)?;
            Ok(ProbeRecord {
                method: method.to_string(),
                url: route.path().to_string(),
                package: package.to_string(),
                func: func.to_string(),
                response,
            })
        })
        .collect()
}

/// Entry point of a generated probe program.
///
/// Writes the JSON record array to stdout and the response type of every
/// route to stderr. Returns a failure exit code, with the reason on stderr,
/// if the table cannot be described.
#[must_use]
pub fn emit(table: &RouteTable) -> ExitCode {
    let mut diagnostics = io::stderr().lock();
    for route in table {
        // Diagnostics are best-effort
        writeln!(
            diagnostics,
            "{} {} -> {} ({})",
            route.method(),
            route.path(),
            route.handler().response_type(),
            route.handler().identity()
        )
        .ok();
    }

    let records = match describe(table) {
        Ok(records) => records,
        Err(e) => {
            writeln!(diagnostics, "cannot encode sample response: {e}").ok();
            return ExitCode::FAILURE;
        }
    };

    let mut out = io::stdout().lock();
    let written = serde_json::to_writer(&mut out, &records)
        .map_err(io::Error::from)
        .and_then(|()| out.write_all(b"\n"))
        .and_then(|()| out.flush());
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            writeln!(diagnostics, "cannot write probe output: {e}").ok();
            ExitCode::FAILURE
        }
    }
}
