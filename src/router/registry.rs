use crate::adapter::{write_envelope, AdaptedHandler, Procedure};
use crate::server::{Outcome, Request, ResponseSink};
use crate::typed::Handler;
use http::Method;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::core::Route;
use super::radix::{erase_param_names, RadixTree};

/// Registration failures. Always a programming mistake, reported before
/// serving starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// `(method, path)` registered twice. Paths differing only in parameter
    /// names count as the same path.
    Duplicate { method: Method, path: String },
    /// The path template is not usable.
    InvalidPath { path: String, reason: &'static str },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Duplicate { method, path } => {
                write!(f, "duplicate route: {method} {path} is already registered")
            }
            RouteError::InvalidPath { path, reason } => {
                write!(f, "invalid route path '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for RouteError {}

fn validate_path(path: &str) -> Result<(), RouteError> {
    let invalid = |reason| {
        Err(RouteError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };
    if !path.starts_with('/') {
        return invalid("must start with '/'");
    }
    for segment in path.split('/') {
        let opens = segment.matches('{').count();
        let closes = segment.matches('}').count();
        if opens != closes || opens > 1 {
            return invalid("unbalanced '{' '}'");
        }
        if opens == 1 && !(segment.starts_with('{') && segment.ends_with('}')) {
            return invalid("a parameter must span a whole segment");
        }
        if segment == "{}" {
            return invalid("parameter without a name");
        }
    }
    Ok(())
}

/// Collects routes before serving. Consumed by [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    tree: RadixTree<Arc<dyn AdaptedHandler>>,
    seen: HashSet<(Method, String)>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Duplicate`] if `(method, path)` is already
    /// present, or [`RouteError::InvalidPath`] for a malformed template.
    pub fn add<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(&Route::new(method, path, handler))
    }

    /// Register an already-built route.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryBuilder::add`].
    pub fn add_route(&mut self, route: &Route) -> Result<&mut Self, RouteError> {
        validate_path(route.path())?;
        let key = (route.method().clone(), erase_param_names(route.path()));
        if !self.seen.insert(key) {
            return Err(RouteError::Duplicate {
                method: route.method().clone(),
                path: route.path().to_string(),
            });
        }
        debug!(
            method = %route.method(),
            path = %route.path(),
            handler = route.handler().identity(),
            "Route registered"
        );
        self.tree.insert(
            route.method().clone(),
            route.path(),
            Arc::clone(route.handler()),
        );
        Ok(self)
    }

    /// Freeze the routes into a dispatch table.
    #[must_use]
    pub fn build(self) -> Registry {
        info!(routes = self.seen.len(), "Registry built");
        Registry {
            tree: self.tree,
            len: self.seen.len(),
        }
    }
}

/// Immutable dispatch table.
///
/// Matched requests go to the adapted handler with path parameters attached.
/// A known path with an unregistered method gets `405` with an `Allow`
/// header; an unknown path gets `404`. Both carry an error envelope.
pub struct Registry {
    tree: RadixTree<Arc<dyn AdaptedHandler>>,
    len: usize,
}

impl Registry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Identity of the handler serving `method path`, if any.
    #[must_use]
    pub fn handler_for(&self, method: &Method, path: &str) -> Option<&'static str> {
        self.tree
            .lookup(method, path)
            .map(|(handler, _)| handler.identity())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("routes", &self.len).finish()
    }
}

impl Procedure for Registry {
    fn call(&self, sink: &mut ResponseSink, req: &Request) {
        if let Some((handler, params)) = self.tree.lookup(&req.method, &req.path) {
            if params.is_empty() {
                handler.call(sink, req);
            } else {
                let mut scoped = req.clone();
                scoped.path_params = params;
                handler.call(sink, &scoped);
            }
            return;
        }

        let allowed = self.tree.allowed_methods(&req.path);
        if allowed.is_empty() {
            sink.set_status(404);
            sink.set_outcome(Outcome::NotFound);
            write_envelope(sink, "not found");
        } else {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            sink.set_status(405);
            sink.set_header("Allow", allow);
            sink.set_outcome(Outcome::MethodNotAllowed);
            write_envelope(sink, "method not allowed");
        }
    }
}
