//! Path resolution over `use` declarations.
//!
//! Enough of Rust's name resolution to tell what a type or function path in
//! some module refers to: local items, `use` with renames, groups and
//! globs, `crate`/`self`/`super`, re-exports and type aliases. Paths that
//! leave the crate are returned as written, with the extern crate name first.

use std::collections::{HashMap, HashSet};
use syn::ext::IdentExt;
use syn::{Item, Path, Type, UseTree};

use super::modules::ModuleTree;
use super::tables::RoutingLibrary;

/// Prefix of a resolved path that stays inside the crate.
pub const CRATE: &str = "crate";
/// Resolution steps allowed for one lookup.
const MAX_STEPS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Local {
    Module,
    Alias(Type),
    Other,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    locals: HashMap<String, Local>,
    uses: HashMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
}

fn flatten(tree: &UseTree, prefix: &mut Vec<String>, scope: &mut Scope) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.unraw().to_string());
            flatten(&p.tree, prefix, scope);
            prefix.pop();
        }
        UseTree::Name(n) => {
            let name = n.ident.unraw().to_string();
            if name == "self" {
                if let Some(last) = prefix.last() {
                    scope.uses.insert(last.clone(), prefix.clone());
                }
            } else {
                let mut target = prefix.clone();
                target.push(name.clone());
                scope.uses.insert(name, target);
            }
        }
        UseTree::Rename(r) => {
            let original = r.ident.unraw().to_string();
            let mut target = prefix.clone();
            if original != "self" {
                target.push(original);
            }
            let alias = r.rename.unraw().to_string();
            if alias != "_" {
                scope.uses.insert(alias, target);
            }
        }
        UseTree::Glob(_) => scope.globs.push(prefix.clone()),
        UseTree::Group(g) => {
            for item in &g.items {
                flatten(item, prefix, scope);
            }
        }
    }
}

fn item_name(item: &Item) -> Option<(String, Local)> {
    let (ident, local) = match item {
        Item::Mod(m) => (&m.ident, Local::Module),
        Item::Type(t) => (&t.ident, Local::Alias((*t.ty).clone())),
        Item::Fn(f) => (&f.sig.ident, Local::Other),
        Item::Struct(s) => (&s.ident, Local::Other),
        Item::Enum(e) => (&e.ident, Local::Other),
        Item::Union(u) => (&u.ident, Local::Other),
        Item::Trait(t) => (&t.ident, Local::Other),
        Item::Static(s) => (&s.ident, Local::Other),
        Item::Const(c) => (&c.ident, Local::Other),
        _ => return None,
    };
    Some((ident.unraw().to_string(), local))
}

/// Segments of a path, generic arguments dropped. A leading `::` is kept as
/// an empty first segment.
#[must_use]
pub fn path_segments(path: &Path) -> Vec<String> {
    let mut segments = Vec::with_capacity(path.segments.len() + 1);
    if path.leading_colon.is_some() {
        segments.push(String::new());
    }
    segments.extend(path.segments.iter().map(|s| s.ident.unraw().to_string()));
    segments
}

/// Per-lookup state: steps taken and the modules whose globs were already
/// searched, so cyclic imports terminate.
#[derive(Default)]
struct Lookup {
    steps: usize,
    globbed: HashSet<Vec<String>>,
}

impl Lookup {
    fn descend(&mut self) -> bool {
        self.steps += 1;
        self.steps <= MAX_STEPS
    }
}

/// Resolves paths within one crate's module tree.
#[derive(Debug, Clone)]
pub struct Resolver {
    scopes: HashMap<Vec<String>, Scope>,
    /// `extern crate x as y;` at the root
    extern_aliases: HashMap<String, String>,
    routing: RoutingLibrary,
}

impl Resolver {
    pub fn new(tree: &ModuleTree, routing: RoutingLibrary) -> Self {
        let mut scopes = HashMap::new();
        let mut extern_aliases = HashMap::new();
        for module in &tree.modules {
            let mut scope = Scope::default();
            for item in &module.items {
                match item {
                    Item::Use(u) => flatten(&u.tree, &mut Vec::new(), &mut scope),
                    Item::ExternCrate(e) => {
                        let original = e.ident.unraw().to_string();
                        if let Some((_, alias)) = &e.rename {
                            let alias = alias.unraw().to_string();
                            if module.path.is_empty() {
                                extern_aliases.insert(alias.clone(), original.clone());
                            }
                            scope.uses.insert(alias, vec![original]);
                        }
                    }
                    other => {
                        if let Some((name, local)) = item_name(other) {
                            scope.locals.insert(name, local);
                        }
                    }
                }
            }
            scopes.insert(module.path.clone(), scope);
        }
        Self {
            scopes,
            extern_aliases,
            routing,
        }
    }

    pub fn routing(&self) -> &RoutingLibrary {
        &self.routing
    }

    /// Resolve `path` as written in `module`.
    pub fn resolve_path(&self, module: &[String], path: &Path) -> Option<Vec<String>> {
        self.resolve(module, &path_segments(path))
    }

    /// Resolve a type as written in `module`, seeing through type aliases.
    /// Only path types resolve.
    pub fn resolve_type(&self, module: &[String], ty: &Type) -> Option<Vec<String>> {
        self.resolve_type_at(module, ty, &mut Lookup::default())
    }

    /// Resolve raw segments as written in `module`.
    ///
    /// Returns `crate`-prefixed segments for paths inside the crate and the
    /// written segments, extern crate first, for everything else.
    pub fn resolve(&self, module: &[String], segments: &[String]) -> Option<Vec<String>> {
        self.resolve_at(module, segments, &mut Lookup::default())
    }

    fn resolve_at(
        &self,
        module: &[String],
        segments: &[String],
        cx: &mut Lookup,
    ) -> Option<Vec<String>> {
        if !cx.descend() {
            return None;
        }
        let (first, rest) = segments.split_first()?;
        match first.as_str() {
            "" => Some(self.extern_path(rest)),
            CRATE => self.walk(&[], rest, cx),
            "self" => self.walk(module, rest, cx),
            "super" => {
                let (_, parent) = module.split_last()?;
                if rest.first().map(String::as_str) == Some("super") {
                    self.resolve_at(parent, rest, cx)
                } else {
                    self.walk(parent, rest, cx)
                }
            }
            _ => match self.walk(module, segments, cx) {
                Some(found) => Some(found),
                None if cx.steps <= MAX_STEPS => Some(self.extern_path(segments)),
                None => None,
            },
        }
    }

    fn extern_path(&self, segments: &[String]) -> Vec<String> {
        let mut out = segments.to_vec();
        if let Some(first) = out.first_mut() {
            if let Some(original) = self.extern_aliases.get(first) {
                *first = original.clone();
            }
        }
        out
    }

    /// Look `segments` up starting in `module`; `None` when the first
    /// segment is not defined there.
    fn walk(&self, module: &[String], segments: &[String], cx: &mut Lookup) -> Option<Vec<String>> {
        if !cx.descend() {
            return None;
        }
        let Some((name, rest)) = segments.split_first() else {
            return Some(internal(module, &[]));
        };
        let scope = self.scopes.get(module)?;

        if let Some(local) = scope.locals.get(name) {
            let mut here = module.to_vec();
            here.push(name.clone());
            return match local {
                Local::Module => self.walk(&here, rest, cx),
                Local::Alias(ty) if rest.is_empty() => self
                    .resolve_type_at(module, ty, cx)
                    .or_else(|| Some(internal(&here, &[]))),
                _ => Some(internal(&here, rest)),
            };
        }

        if let Some(target) = scope.uses.get(name) {
            // `use serde;` names the extern crate itself
            if target.len() == 1 && &target[0] == name {
                return Some(self.extern_path(segments));
            }
            let mut full = target.clone();
            full.extend(rest.iter().cloned());
            return self.resolve_at(module, &full, cx);
        }

        if !cx.globbed.insert(module.to_vec()) {
            return None;
        }
        for glob in &scope.globs {
            let Some(base) = self.resolve_at(module, glob, cx) else {
                continue;
            };
            if base.first().map(String::as_str) == Some(CRATE) {
                if let Some(found) = self.walk(&base[1..], segments, cx) {
                    return Some(found);
                }
            } else {
                let mut candidate = base;
                candidate.extend(segments.iter().cloned());
                if self.routing.provides(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn resolve_type_at(&self, module: &[String], ty: &Type, cx: &mut Lookup) -> Option<Vec<String>> {
        match ty {
            Type::Path(p) if p.qself.is_none() => {
                self.resolve_at(module, &path_segments(&p.path), cx)
            }
            Type::Paren(p) => self.resolve_type_at(module, &p.elem, cx),
            Type::Group(g) => self.resolve_type_at(module, &g.elem, cx),
            _ => None,
        }
    }

    /// Names imported into `module` whose target satisfies `pred`.
    pub fn imports_matching(&self, module: &[String], pred: impl Fn(&[String]) -> bool) -> Vec<String> {
        let Some(scope) = self.scopes.get(module) else {
            return Vec::new();
        };
        let mut names: Vec<String> = scope
            .uses
            .keys()
            .filter(|name| {
                self.resolve(module, std::slice::from_ref(*name))
                    .is_some_and(|resolved| pred(&resolved))
            })
            .cloned()
            .collect();
        names.sort();
        names
    }
}

fn internal(module: &[String], rest: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(module.len() + rest.len() + 1);
    out.push(CRATE.to_string());
    out.extend(module.iter().cloned());
    out.extend(rest.iter().cloned());
    out
}
