use std::fs;
use std::path::{Path, PathBuf};
use syn::ext::IdentExt;
use syn::{Attribute, Expr, Item, ItemMod, Lit, Meta, Visibility};
use tracing::debug;

use super::error::ScanError;

/// One module of the crate with its items.
#[derive(Debug, Clone)]
pub struct Module {
    /// Segments below the crate root; empty for the root
    pub path: Vec<String>,
    /// File the items were read from
    pub file: PathBuf,
    /// Nameable from outside the crate (`pub` at every level)
    pub public: bool,
    pub items: Vec<Item>,
}

impl Module {
    /// `a::b`, or `crate` for the root.
    #[must_use]
    pub fn display_path(&self) -> String {
        if self.path.is_empty() {
            "crate".to_string()
        } else {
            self.path.join("::")
        }
    }
}

/// Every non-test module reachable through `mod` items, root first, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct ModuleTree {
    pub modules: Vec<Module>,
}

impl ModuleTree {
    pub fn get(&self, path: &[String]) -> Option<&Module> {
        self.modules.iter().find(|m| m.path == path)
    }
}

pub(crate) fn parse_file(path: &Path) -> Result<syn::File, ScanError> {
    let text = fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    syn::parse_file(&text).map_err(|source| ScanError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

fn path_attr(attrs: &[Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| match &attr.meta {
        Meta::NameValue(nv) if nv.path.is_ident("path") => match &nv.value {
            Expr::Lit(lit) => match &lit.lit {
                Lit::Str(s) => Some(s.value()),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    })
}

/// Where a module's `mod` items are looked up.
struct Dirs {
    /// Base for `mod name;`
    children: PathBuf,
    /// Base for `#[path]` on `mod name;`
    path_attr: PathBuf,
}

/// Read the module tree rooted at `root_file`.
///
/// # Errors
///
/// Returns [`ScanError`] for unreadable or unparsable files and for `mod`
/// items with no file.
pub fn load_modules(root_file: &Path) -> Result<ModuleTree, ScanError> {
    let file = parse_file(root_file)?;
    let dir = root_file.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut tree = ModuleTree::default();
    walk(
        Vec::new(),
        root_file.to_path_buf(),
        true,
        file.items,
        &Dirs {
            children: dir.clone(),
            path_attr: dir,
        },
        &mut tree,
    )?;
    debug!(modules = tree.modules.len(), root = %root_file.display(), "Loaded module tree");
    Ok(tree)
}

fn walk(
    path: Vec<String>,
    file: PathBuf,
    public: bool,
    items: Vec<Item>,
    dirs: &Dirs,
    tree: &mut ModuleTree,
) -> Result<(), ScanError> {
    let children: Vec<ItemMod> = items
        .iter()
        .filter_map(|item| match item {
            Item::Mod(m) if !is_cfg_test(&m.attrs) => Some(m.clone()),
            _ => None,
        })
        .collect();
    tree.modules.push(Module {
        path: path.clone(),
        file: file.clone(),
        public,
        items,
    });

    for child in children {
        let name = child.ident.unraw().to_string();
        let mut child_path = path.clone();
        child_path.push(name.clone());
        let child_public = public && matches!(child.vis, Visibility::Public(_));
        let explicit = path_attr(&child.attrs);

        match child.content {
            Some((_, items)) => {
                // Nested inline modules behave like directories
                let base = match &explicit {
                    Some(p) => dirs.children.join(p),
                    None => dirs.children.join(&name),
                };
                let inner = Dirs {
                    children: base.clone(),
                    path_attr: base,
                };
                walk(child_path, file.clone(), child_public, items, &inner, tree)?;
            }
            None => {
                let (child_file, child_dirs) = locate(&child_path, &name, explicit, dirs)?;
                let parsed = parse_file(&child_file)?;
                walk(child_path, child_file, child_public, parsed.items, &child_dirs, tree)?;
            }
        }
    }
    Ok(())
}

fn locate(
    module: &[String],
    name: &str,
    explicit: Option<String>,
    dirs: &Dirs,
) -> Result<(PathBuf, Dirs), ScanError> {
    let missing = |searched: Vec<PathBuf>| ScanError::MissingModule {
        module: module.join("::"),
        searched,
    };

    if let Some(rel) = explicit {
        let file = dirs.path_attr.join(rel);
        if !file.is_file() {
            return Err(missing(vec![file]));
        }
        // Files loaded through #[path] own their directory like mod.rs
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        return Ok((
            file,
            Dirs {
                children: dir.clone(),
                path_attr: dir,
            },
        ));
    }

    let flat = dirs.children.join(format!("{name}.rs"));
    let nested = dirs.children.join(name).join("mod.rs");
    if flat.is_file() {
        let dir = dirs.children.join(name);
        let attr_dir = dirs.children.clone();
        Ok((
            flat,
            Dirs {
                children: dir,
                path_attr: attr_dir,
            },
        ))
    } else if nested.is_file() {
        let dir = dirs.children.join(name);
        Ok((
            nested,
            Dirs {
                children: dir.clone(),
                path_attr: dir,
            },
        ))
    } else {
        Err(missing(vec![flat, nested]))
    }
}
