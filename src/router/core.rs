use crate::adapter::{AdaptedHandler, Adapter};
use crate::typed::Handler;
use http::Method;
use std::fmt;
use std::sync::Arc;

use super::registry::{Registry, RouteError};

/// A `(method, path, handler)` triple.
///
/// The handler is adapted once, when the route is created; the contract is
/// checked by the [`Handler`] bound at that point and never again.
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    handler: Arc<dyn AdaptedHandler>,
}

impl Route {
    pub fn new<H: Handler>(method: Method, path: impl Into<String>, handler: H) -> Self {
        Self {
            method,
            path: path.into(),
            handler: Arc::new(Adapter::new(handler)),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn AdaptedHandler> {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler", &self.handler.identity())
            .finish()
    }
}

/// Shorthand for [`Route::new`].
pub fn route<H: Handler>(method: Method, path: impl Into<String>, handler: H) -> Route {
    Route::new(method, path, handler)
}

/// An ordered, immutable list of routes declared by application code.
///
/// Declare one as a crate-level item so documentation can be generated for
/// it:
///
/// ```rust,ignore
/// /// Item endpoints.
/// pub static ITEMS: Lazy<RouteTable> = Lazy::new(|| {
///     RouteTable::new(vec![
///         route(Method::GET, "/items", list_items),
///         route(Method::POST, "/items", create_item),
///     ])
/// });
/// ```
///
/// or as `pub fn items() -> RouteTable`.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build a registry serving every route in the table.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if two routes share a method and path, or a
    /// path is malformed.
    pub fn registry(&self) -> Result<Registry, RouteError> {
        let mut builder = Registry::builder();
        for route in &self.routes {
            builder.add_route(route)?;
        }
        Ok(builder.build())
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
