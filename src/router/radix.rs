//! Radix tree for HTTP route matching
//!
//! Paths are split into `/`-separated segments and stored as a tree where:
//! - each node represents a path segment
//! - static segments (e.g., `items`) match exactly
//! - parameter segments (e.g., `{id}`) match any single segment
//! - values are stored at terminal nodes, keyed by HTTP method
//!
//! Lookup is O(k) in the number of path segments. Static children are tried
//! before parameter children, with backtracking when a branch dead-ends.
//!
//! ```rust,ignore
//! let mut tree = RadixTree::new();
//! tree.insert(Method::GET, "/items/{id}", "get_item");
//! let (value, params) = tree.lookup(&Method::GET, "/items/7").unwrap();
//! assert_eq!(*value, "get_item");
//! assert_eq!(params["id"], "7");
//! ```

use http::Method;
use std::borrow::Cow;
use std::collections::HashMap;

/// Split a path into its non-empty segments.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
}

/// Path with every `{name}` replaced by `{}`, so templates that differ only
/// in parameter names compare equal.
pub(crate) fn erase_param_names(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for segment in segments(path) {
        out.push('/');
        if param_name(segment).is_some() {
            out.push_str("{}");
        } else {
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Node in the radix tree
#[derive(Clone)]
struct RadixNode<T> {
    /// The path segment this node represents (without leading /)
    segment: Cow<'static, str>,
    /// Values stored at this node, one per HTTP method
    routes: HashMap<Method, T>,
    /// Parameter name if this segment is a path parameter (e.g., "{id}" -> Some("id"))
    param_name: Option<Cow<'static, str>>,
    children: Vec<RadixNode<T>>,
    /// One child per distinct parameter name at this position
    param_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: Cow<'static, str>) -> Self {
        Self {
            segment: Cow::Borrowed(""),
            routes: HashMap::new(),
            param_name: Some(param_name),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    /// Insert a value; returns the value previously stored for `method` at
    /// exactly this template, if any.
    fn insert(&mut self, segments: &[&str], method: Method, value: T) -> Option<T> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.insert(method, value);
        };

        if let Some(name) = param_name(segment) {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(name))
            {
                return child.insert(remaining, method, value);
            }
            let mut child = RadixNode::new_param(Cow::Owned(name.to_string()));
            let previous = child.insert(remaining, method, value);
            self.param_children.push(child);
            return previous;
        }

        if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
            return child.insert(remaining, method, value);
        }
        let mut child = RadixNode::new(Cow::Owned(segment.to_string()));
        let previous = child.insert(remaining, method, value);
        self.children.push(child);
        previous
    }

    fn search<'a>(
        &'a self,
        segments: &[&str],
        method: &Method,
        params: &mut HashMap<String, String>,
    ) -> Option<&'a T> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.get(method);
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(found) = child.search(remaining, method, params) {
                    return Some(found);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(ref name) = param_child.param_name {
                params.insert(name.to_string(), segment.to_string());
                if let Some(found) = param_child.search(remaining, method, params) {
                    return Some(found);
                }
                // Backtrack
                params.remove(name.as_ref());
            }
        }

        None
    }

    /// Collect every method stored at any terminal node matching the path.
    fn collect_methods(&self, segments: &[&str], out: &mut Vec<Method>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            for method in self.routes.keys() {
                if !out.contains(method) {
                    out.push(method.clone());
                }
            }
            return;
        };

        for child in self.children.iter().filter(|c| c.segment == segment) {
            child.collect_methods(remaining, out);
        }
        for param_child in &self.param_children {
            param_child.collect_methods(remaining, out);
        }
    }
}

/// Method-keyed radix tree over path templates.
#[derive(Clone)]
pub struct RadixTree<T> {
    root: RadixNode<T>,
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixTree<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
        }
    }

    /// Store `value` for `method` at `template`, returning any value it
    /// replaces.
    pub fn insert(&mut self, method: Method, template: &str, value: T) -> Option<T> {
        self.root.insert(&segments(template), method, value)
    }

    /// Match a concrete path, returning the value and the extracted path
    /// parameters.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(&T, HashMap<String, String>)> {
        let mut params = HashMap::new();
        let found = self.root.search(&segments(path), method, &mut params)?;
        Some((found, params))
    }

    /// Methods served at a concrete path, in a stable order. Empty when the
    /// path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut out = Vec::new();
        self.root.collect_methods(&segments(path), &mut out);
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }
}
