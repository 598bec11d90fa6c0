use syn::punctuated::Punctuated;
use syn::visit::{self, Visit};
use syn::{
    Block, Expr, GenericArgument, ImplItem, Item, Macro, PathArguments, ReturnType, Signature,
    Token, Type, Visibility,
};

use super::docs::doc_text;
use super::modules::{is_cfg_test, ModuleTree};
use super::resolve::{Resolver, CRATE};

/// Wrappers a static route table may sit behind.
const LAZY_WRAPPERS: &[&str] = &["Lazy", "LazyLock", "LazyCell"];

/// Items of the routing library the scanner looks for, with the module
/// each also lives in.
const LIBRARY_ITEMS: &[(&str, &str)] = &[
    ("router", "RouteTable"),
    ("router", "Route"),
    ("router", "route"),
    ("server", "ResponseSink"),
    ("server", "Request"),
];

/// The routing library as the scanned crate names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingLibrary {
    ident: String,
}

impl RoutingLibrary {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
        }
    }

    #[must_use]
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// `path` is `<lib>::<item..>` or `<lib>::<module>::<item..>`.
    fn names(&self, path: &[String], module: &str, item: &[&str]) -> bool {
        let Some((first, tail)) = path.split_first() else {
            return false;
        };
        if *first != self.ident {
            return false;
        }
        let matches = |t: &[String]| t.len() == item.len() && t.iter().zip(item).all(|(a, b)| a == b);
        matches(tail) || (tail.first().is_some_and(|m| m == module) && matches(&tail[1..]))
    }

    pub fn is_route_table(&self, path: &[String]) -> bool {
        self.names(path, "router", &["RouteTable"])
    }

    /// `Route::new` or `route`.
    pub fn is_route_constructor(&self, path: &[String]) -> bool {
        self.names(path, "router", &["Route", "new"]) || self.names(path, "router", &["route"])
    }

    pub fn is_sink(&self, path: &[String]) -> bool {
        self.names(path, "server", &["ResponseSink"])
    }

    pub fn is_request(&self, path: &[String]) -> bool {
        self.names(path, "server", &["Request"])
    }

    /// Whether `path` starts with a known library item; used for glob
    /// imports out of the library.
    pub fn provides(&self, path: &[String]) -> bool {
        (2..=path.len().min(3)).any(|n| {
            LIBRARY_ITEMS
                .iter()
                .any(|&(module, item)| self.names(&path[..n], module, &[item]))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `static NAME: Lazy<RouteTable>`
    Static,
    /// `fn name() -> RouteTable`
    Fn,
}

#[derive(Debug, Clone)]
enum TableBody {
    Expr(Box<Expr>),
    Block(Box<Block>),
}

/// A route table declared in the crate.
#[derive(Debug, Clone)]
pub struct TableItem {
    pub name: String,
    /// Declaring module, below the crate root
    pub module: Vec<String>,
    pub kind: TableKind,
    pub doc: String,
    /// `pub` item in a module reachable from the crate root
    pub item_public: bool,
    pub module_public: bool,
    body: TableBody,
}

impl TableItem {
    /// `module::name`, or just `name` at the crate root.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut parts = self.module.clone();
        parts.push(self.name.clone());
        parts.join("::")
    }

    /// Expression of type `&RouteTable` for code outside the crate.
    #[must_use]
    pub fn table_expr(&self, crate_ident: &str) -> String {
        let mut parts = vec![crate_ident.to_string()];
        parts.extend(self.module.iter().cloned());
        parts.push(self.name.clone());
        let path = parts.join("::");
        match self.kind {
            TableKind::Static => format!("&*{path}"),
            TableKind::Fn => format!("&{path}()"),
        }
    }
}

fn is_table_type(resolver: &Resolver, module: &[String], ty: &Type) -> bool {
    if resolver
        .resolve_type(module, ty)
        .is_some_and(|path| resolver.routing().is_route_table(&path))
    {
        return true;
    }
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(last) = path.path.segments.last() else {
        return false;
    };
    if !LAZY_WRAPPERS.iter().any(|w| last.ident == w) {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return false;
    };
    args.args.iter().any(|arg| match arg {
        GenericArgument::Type(inner) => is_table_type(resolver, module, inner),
        _ => false,
    })
}

/// Route tables in module order, then item order.
pub fn find_tables(tree: &ModuleTree, resolver: &Resolver) -> Vec<TableItem> {
    let mut tables = Vec::new();
    for module in &tree.modules {
        for item in &module.items {
            let found = match item {
                Item::Static(s)
                    if !is_cfg_test(&s.attrs) && is_table_type(resolver, &module.path, &s.ty) =>
                {
                    Some((
                        s.ident.to_string(),
                        TableKind::Static,
                        &s.attrs,
                        &s.vis,
                        TableBody::Expr(s.expr.clone()),
                    ))
                }
                Item::Fn(f)
                    if !is_cfg_test(&f.attrs)
                        && f.sig.inputs.is_empty()
                        && f.sig.generics.params.is_empty()
                        && matches!(&f.sig.output, ReturnType::Type(_, ty)
                            if is_table_type(resolver, &module.path, ty)) =>
                {
                    Some((
                        f.sig.ident.to_string(),
                        TableKind::Fn,
                        &f.attrs,
                        &f.vis,
                        TableBody::Block(f.block.clone()),
                    ))
                }
                _ => None,
            };
            if let Some((name, kind, attrs, vis, body)) = found {
                tables.push(TableItem {
                    name,
                    module: module.path.clone(),
                    kind,
                    doc: doc_text(attrs),
                    item_public: matches!(vis, Visibility::Public(_)),
                    module_public: module.public,
                    body,
                });
            }
        }
    }
    tables
}

/// A handler function of the crate named by a route.
#[derive(Debug, Clone)]
pub struct HandlerRef {
    /// `crate`-prefixed resolved path
    pub path: Vec<String>,
    /// Module the function is defined in
    pub module: Vec<String>,
    pub signature: Signature,
}

impl HandlerRef {
    /// Path as reported at run time, `my_crate::module::func`.
    #[must_use]
    pub fn display_path(&self, crate_ident: &str) -> String {
        let mut parts = vec![crate_ident.to_string()];
        parts.extend(self.path.iter().skip(1).cloned());
        parts.join("::")
    }
}

struct RouteCalls<'a> {
    resolver: &'a Resolver,
    module: &'a [String],
    handlers: Vec<Vec<String>>,
}

fn peel(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(p) => peel(&p.expr),
        Expr::Group(g) => peel(&g.expr),
        Expr::Reference(r) => peel(&r.expr),
        other => other,
    }
}

impl<'ast> Visit<'ast> for RouteCalls<'_> {
    fn visit_expr_call(&mut self, call: &'ast syn::ExprCall) {
        if let Expr::Path(func) = peel(&call.func) {
            let is_route = self
                .resolver
                .resolve_path(self.module, &func.path)
                .is_some_and(|path| self.resolver.routing().is_route_constructor(&path));
            if is_route && call.args.len() == 3 {
                if let Some(Expr::Path(handler)) = call.args.iter().nth(2).map(peel) {
                    if let Some(path) = self.resolver.resolve_path(self.module, &handler.path) {
                        if path.first().map(String::as_str) == Some(CRATE) {
                            self.handlers.push(path);
                        }
                    }
                }
            }
        }
        visit::visit_expr_call(self, call);
    }

    // vec![..] and friends hide their calls in tokens
    fn visit_macro(&mut self, mac: &'ast Macro) {
        let Ok(exprs) = mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) else {
            return;
        };
        let mut inner = RouteCalls {
            resolver: self.resolver,
            module: self.module,
            handlers: Vec::new(),
        };
        for expr in &exprs {
            inner.visit_expr(expr);
        }
        self.handlers.append(&mut inner.handlers);
    }
}

fn find_function(tree: &ModuleTree, path: &[String]) -> Option<HandlerRef> {
    let inner = path.get(1..)?;
    let (name, owner) = inner.split_last()?;

    // Free function
    if let Some(module) = tree.get(owner) {
        for item in &module.items {
            if let Item::Fn(f) = item {
                if f.sig.ident == name {
                    return Some(HandlerRef {
                        path: path.to_vec(),
                        module: owner.to_vec(),
                        signature: f.sig.clone(),
                    });
                }
            }
        }
    }

    // Associated function, `Type::func`
    let (ty, module_path) = owner.split_last()?;
    let module = tree.get(module_path)?;
    module.items.iter().find_map(|item| {
        let Item::Impl(imp) = item else {
            return None;
        };
        let Type::Path(self_ty) = imp.self_ty.as_ref() else {
            return None;
        };
        if self_ty.path.segments.last().map(|s| s.ident == ty) != Some(true) {
            return None;
        }
        imp.items.iter().find_map(|inner| match inner {
            ImplItem::Fn(f) if f.sig.ident == name => Some(HandlerRef {
                path: path.to_vec(),
                module: module_path.to_vec(),
                signature: f.sig.clone(),
            }),
            _ => None,
        })
    })
}

/// Crate functions passed as handlers to `Route::new`/`route` in the
/// table's initializer, in order of appearance.
pub fn table_handlers(table: &TableItem, tree: &ModuleTree, resolver: &Resolver) -> Vec<HandlerRef> {
    let mut calls = RouteCalls {
        resolver,
        module: &table.module,
        handlers: Vec::new(),
    };
    match &table.body {
        TableBody::Expr(expr) => calls.visit_expr(expr),
        TableBody::Block(block) => calls.visit_block(block),
    }
    calls
        .handlers
        .iter()
        .filter_map(|path| find_function(tree, path))
        .collect()
}
