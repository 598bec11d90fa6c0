use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One documented route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "URL")]
    pub url: String,
    /// Module path of the handler, e.g. `my_crate::items`
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Func")]
    pub func: String,
    #[serde(rename = "Doc", default)]
    pub doc: String,
    /// Sample response; `null` when there is none
    #[serde(rename = "Response", default)]
    pub response: serde_json::Value,
}

impl Endpoint {
    /// `Package::Func`, or just `Func` when the package is empty.
    #[must_use]
    pub fn qualified_func(&self) -> String {
        if self.package.is_empty() {
            self.func.clone()
        } else {
            format!("{}::{}", self.package, self.func)
        }
    }
}

/// The endpoints of one route table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteGroup {
    #[serde(rename = "Endpoints")]
    pub endpoints: Vec<Endpoint>,
    /// Doc comment of the route table item
    #[serde(rename = "Doc", default)]
    pub doc: String,
}

/// Route groups keyed by route table name, sorted by name.
pub type Documentation = BTreeMap<String, RouteGroup>;
