use std::collections::HashMap;
use syn::{Attribute, Expr, ImplItem, Item, Lit, Meta, Type, Visibility};

use super::modules::ModuleTree;

/// Text of the `///` and `#[doc = ".."]` attributes, one line each, with
/// the single space after `///` removed.
#[must_use]
pub fn doc_text(attrs: &[Attribute]) -> String {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(s) => Some(s.value()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .flat_map(|value| {
            value
                .split('\n')
                .map(|line| line.strip_prefix(' ').unwrap_or(line).to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    lines.join("\n").trim_end().to_string()
}

/// Documentation of the crate's public functions.
///
/// Keyed by the path a function reports at run time
/// (`my_crate::module::func`, `my_crate::module::Type::method`) and by bare
/// name. A bare name shared by several functions keeps the first one in
/// module order.
#[derive(Debug, Clone, Default)]
pub struct DocTable {
    qualified: HashMap<String, String>,
    bare: HashMap<String, String>,
}

impl DocTable {
    pub fn build(crate_ident: &str, tree: &ModuleTree) -> Self {
        let mut table = Self::default();
        for module in &tree.modules {
            let mut prefix = vec![crate_ident.to_string()];
            prefix.extend(module.path.iter().cloned());
            let prefix = prefix.join("::");

            for item in &module.items {
                match item {
                    Item::Fn(f) if matches!(f.vis, Visibility::Public(_)) => {
                        table.insert(&prefix, &f.sig.ident.to_string(), doc_text(&f.attrs));
                    }
                    Item::Impl(imp) if imp.trait_.is_none() => {
                        let Type::Path(self_ty) = imp.self_ty.as_ref() else {
                            continue;
                        };
                        let Some(ty) = self_ty.path.segments.last() else {
                            continue;
                        };
                        let owner = format!("{prefix}::{}", ty.ident);
                        for inner in &imp.items {
                            if let ImplItem::Fn(f) = inner {
                                if matches!(f.vis, Visibility::Public(_)) {
                                    table.insert(
                                        &owner,
                                        &f.sig.ident.to_string(),
                                        doc_text(&f.attrs),
                                    );
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        table
    }

    fn insert(&mut self, prefix: &str, name: &str, doc: String) {
        self.bare
            .entry(name.to_string())
            .or_insert_with(|| doc.clone());
        self.qualified.insert(format!("{prefix}::{name}"), doc);
    }

    /// Doc for `package::func`, falling back to `func` alone.
    pub fn lookup(&self, package: &str, func: &str) -> Option<&str> {
        let qualified = if package.is_empty() {
            func.to_string()
        } else {
            format!("{package}::{func}")
        };
        self.qualified
            .get(&qualified)
            .or_else(|| self.bare.get(func))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.qualified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty()
    }
}
