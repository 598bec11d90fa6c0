//! A tiny item store served and documented with routedoc.

use http::Method;
use once_cell::sync::Lazy;
use routedoc::{route, Example, Request, ResponseSink, Route, RouteTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub name: String,
    pub value: i64,
    pub value8: i8,
    pub value16: i16,
    pub value32: i32,
    pub value64: i64,
    pub bool: bool,
}

impl Item {
    fn boop(name: &str) -> Self {
        Item {
            name: name.to_string(),
            value: 7,
            value8: 8,
            value16: 9,
            value32: 10,
            value64: 11,
            bool: true,
        }
    }
}

impl Example for Item {
    fn example(_method: &str, _url: &str, func_name: &str) -> Option<Self> {
        match func_name {
            "return_boop" => Some(Item::boop("boop")),
            "post" => Some(Item::boop("posted boop")),
            _ => None,
        }
    }
}

/// ReturnBoop does some really cool stuff.
/// I'm adding some **markdown** in here for
/// style points.
pub fn return_boop(_: &mut ResponseSink, req: &Request) -> Result<Item, String> {
    let name = req.form_value("boop");
    Ok(Item::boop(if name.is_empty() { "boop" } else { &name }))
}

/// Stores an item. Always fails for now.
pub fn post(_: &mut ResponseSink, _: &Request) -> Result<Item, String> {
    Err(format!("stuff went wrong: {}", 2354))
}

#[allow(clippy::panic)]
pub fn delete(_: &mut ResponseSink, _: &Request) -> Result<Item, String> {
    panic!("NOPE")
}

/// The application router
pub static URLS: Lazy<RouteTable> = Lazy::new(|| {
    RouteTable::new(vec![
        route(Method::GET, "/items", return_boop),
        route(Method::POST, "/items", post),
    ])
});

/// Every route the demo server answers: the documented table plus
/// `DELETE /items`, which always panics.
#[must_use]
pub fn serving_routes() -> Vec<Route> {
    let mut routes: Vec<Route> = URLS.iter().cloned().collect();
    routes.push(Route::new(Method::DELETE, "/items", delete));
    routes
}
