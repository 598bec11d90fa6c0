use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::docs::DocTable;
use super::error::ScanError;
use super::modules::{load_modules, ModuleTree};
use super::resolve::Resolver;
use super::tables::{find_tables, table_handlers, RoutingLibrary, TableItem};
use crate::contract::Verifier;
use crate::docs::{Documentation, RouteGroup};
use crate::manifest::CrateManifest;
use crate::probe::{Oracle, ProbeTarget};

/// A route table ready to probe.
#[derive(Debug, Clone)]
pub struct DiscoveredTable {
    /// Key of the table's group in the documentation
    pub group: String,
    pub doc: String,
    pub target: ProbeTarget,
}

/// Everything learned from source before any probe runs.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub manifest: CrateManifest,
    /// In source order
    pub tables: Vec<DiscoveredTable>,
    pub docs: DocTable,
}

/// Why a table cannot be named from outside the crate, if it cannot.
fn unreachable_reason(table: &TableItem) -> Option<String> {
    if !table.item_public {
        Some("the item is not declared `pub`".to_string())
    } else if !table.module_public {
        Some(format!(
            "module '{}' is not public all the way from the crate root",
            table.module.join("::")
        ))
    } else {
        None
    }
}

fn verify_handlers(
    table: &TableItem,
    tree: &ModuleTree,
    resolver: &Resolver,
    crate_ident: &str,
) -> Result<(), ScanError> {
    let routing = resolver.routing();
    for handler in table_handlers(table, tree, resolver) {
        let mut verifier = Verifier::new();
        for name in resolver.imports_matching(&handler.module, |p| routing.is_sink(p)) {
            verifier = verifier.sink_alias(name);
        }
        for name in resolver.imports_matching(&handler.module, |p| routing.is_request(p)) {
            verifier = verifier.request_alias(name);
        }
        let qualified = handler.display_path(crate_ident);
        debug!(handler = %qualified, table = %table.name, "Checking handler contract");
        verifier
            .verify(&handler.signature)
            .map_err(|source| ScanError::Contract {
                handler: qualified,
                table: table.qualified_name(),
                source,
            })?;
    }
    Ok(())
}

/// Read a crate's source and find its route tables.
///
/// Only tables that can be named from outside the crate are documented;
/// private ones are skipped. Every handler the documented tables name is
/// checked against the handler contract here, so a bad handler fails the
/// scan before anything is compiled.
///
/// # Errors
///
/// Returns [`ScanError`] for manifest, parse and contract failures.
pub fn discover(crate_dir: &Path) -> Result<Discovery, ScanError> {
    let manifest = CrateManifest::load(crate_dir)?;
    let tree = load_modules(&manifest.lib_path)?;
    let resolver = Resolver::new(&tree, RoutingLibrary::new(manifest.routedoc.ident()));
    let docs = DocTable::build(&manifest.lib_ident, &tree);

    let items = find_tables(&tree, &resolver);
    let mut taken = HashSet::new();
    let mut tables = Vec::with_capacity(items.len());
    for item in &items {
        if let Some(reason) = unreachable_reason(item) {
            info!(table = %item.qualified_name(), %reason, "Skipping private route table");
            continue;
        }
        verify_handlers(item, &tree, &resolver, &manifest.lib_ident)?;

        let group = if taken.contains(&item.name) {
            item.qualified_name()
        } else {
            item.name.clone()
        };
        taken.insert(group.clone());
        tables.push(DiscoveredTable {
            doc: item.doc.clone(),
            target: ProbeTarget {
                manifest: manifest.clone(),
                table_name: group.clone(),
                table_expr: item.table_expr(&manifest.lib_ident),
            },
            group,
        });
    }

    info!(
        package = %manifest.package_name,
        modules = tree.modules.len(),
        tables = tables.len(),
        documented_functions = docs.len(),
        "Scanned crate source"
    );
    Ok(Discovery {
        manifest,
        tables,
        docs,
    })
}

/// Builds [`Documentation`] for a crate with a probe [`Oracle`].
pub struct Scanner<O> {
    oracle: O,
}

impl<O: Oracle> Scanner<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Discover, then probe every table in source order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScanError`]; nothing is returned for the tables
    /// that succeeded before it.
    pub fn scan(&self, crate_dir: &Path) -> Result<Documentation, ScanError> {
        let discovery = discover(crate_dir)?;
        self.probe_all(&discovery)
    }

    /// Probe the tables of an earlier discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Probe`] for the first failing table.
    pub fn probe_all(&self, discovery: &Discovery) -> Result<Documentation, ScanError> {
        let mut documentation = Documentation::new();
        for table in &discovery.tables {
            info!(table = %table.group, expr = %table.target.table_expr, "Probing route table");
            let mut endpoints =
                self.oracle
                    .probe(&table.target)
                    .map_err(|source| ScanError::Probe {
                        table: table.group.clone(),
                        source,
                    })?;
            for endpoint in &mut endpoints {
                if let Some(doc) = discovery.docs.lookup(&endpoint.package, &endpoint.func) {
                    endpoint.doc = doc.to_string();
                }
            }
            debug!(table = %table.group, endpoints = endpoints.len(), "Route table probed");
            documentation.insert(
                table.group.clone(),
                RouteGroup {
                    endpoints,
                    doc: table.doc.clone(),
                },
            );
        }
        Ok(documentation)
    }
}
