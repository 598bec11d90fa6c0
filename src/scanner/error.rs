use std::fmt;
use std::path::PathBuf;

use crate::contract::ContractError;
use crate::manifest::ManifestError;
use crate::probe::ProbeError;

/// A failed documentation scan. There is no partial result.
#[derive(Debug)]
pub enum ScanError {
    Manifest(ManifestError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: syn::Error,
    },
    /// `mod name;` with no file at any of the searched locations.
    MissingModule {
        module: String,
        searched: Vec<PathBuf>,
    },
    /// A handler named by a route table breaks the handler contract.
    Contract {
        handler: String,
        table: String,
        source: ContractError,
    },
    Probe { table: String, source: ProbeError },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Manifest(e) => write!(f, "manifest: {e}"),
            ScanError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ScanError::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            ScanError::MissingModule { module, searched } => {
                let searched: Vec<String> =
                    searched.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "module '{module}' not found (looked for {})",
                    searched.join(", ")
                )
            }
            ScanError::Contract {
                handler,
                table,
                source,
            } => write!(f, "handler '{handler}' in route table '{table}': {source}"),
            ScanError::Probe { table, source } => {
                write!(f, "probing route table '{table}': {source}")
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Manifest(e) => Some(e),
            ScanError::Io { source, .. } => Some(source),
            ScanError::Parse { source, .. } => Some(source),
            ScanError::Contract { source, .. } => Some(source),
            ScanError::Probe { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ManifestError> for ScanError {
    fn from(e: ManifestError) -> Self {
        ScanError::Manifest(e)
    }
}
