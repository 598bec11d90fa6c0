use quote::ToTokens;
use std::fmt;
use syn::{FnArg, GenericArgument, PathArguments, ReturnType, Signature, Type, TypeParamBound};

/// Which part of a handler signature broke the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Number of inputs
    Arity,
    /// Input `n` (1-based)
    Input(usize),
    /// Shape of the return type
    Outputs,
    /// Output `n` (1-based)
    Output(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Arity => f.write_str("arity"),
            Position::Input(n) => write!(f, "input {n}"),
            Position::Outputs => f.write_str("outputs"),
            Position::Output(n) => write!(f, "output {n}"),
        }
    }
}

/// A handler signature that does not have the
/// `(&mut ResponseSink, &Request) -> Result<T, E>` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub position: Position,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.position, self.expected, self.actual
        )
    }
}

impl std::error::Error for ContractError {}

/// Compact token rendering: `& mut a :: B < C >` becomes `&mut a::B<C>`.
pub(crate) fn render<T: ToTokens>(node: &T) -> String {
    let mut text = node.to_token_stream().to_string();
    for (from, to) in [
        (" :: ", "::"),
        (":: ", "::"),
        ("& ", "&"),
        (" < ", "<"),
        ("< ", "<"),
        (" <", "<"),
        (" >", ">"),
        (" ,", ","),
    ] {
        text = text.replace(from, to);
    }
    text
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) if p.qself.is_none() => {
            p.path.segments.last().map(|s| s.ident.to_string())
        }
        Type::Paren(p) => last_ident(&p.elem),
        Type::Group(g) => last_ident(&g.elem),
        _ => None,
    }
}

fn bound_names_error(bounds: &syn::punctuated::Punctuated<TypeParamBound, syn::Token![+]>) -> bool {
    bounds.iter().any(|b| match b {
        TypeParamBound::Trait(t) => t
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "Error" || s.ident == "Display"),
        _ => false,
    })
}

/// Signature checker. Type names are matched on their last path segment;
/// extra names can be registered for `use ... as` renames.
#[derive(Debug, Clone)]
pub struct Verifier {
    sink_names: Vec<String>,
    request_names: Vec<String>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            sink_names: vec!["ResponseSink".to_string()],
            request_names: vec!["Request".to_string()],
        }
    }
}

impl Verifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept `name` as the response sink type.
    #[must_use]
    pub fn sink_alias(mut self, name: impl Into<String>) -> Self {
        self.sink_names.push(name.into());
        self
    }

    /// Also accept `name` as the request type.
    #[must_use]
    pub fn request_alias(mut self, name: impl Into<String>) -> Self {
        self.request_names.push(name.into());
        self
    }

    /// Check `sig` against the handler contract, in order: arity, input 1,
    /// input 2, output count, output 2.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn verify(&self, sig: &Signature) -> Result<(), ContractError> {
        let inputs: Vec<&FnArg> = sig.inputs.iter().collect();
        if inputs.len() != 2 {
            return Err(ContractError {
                position: Position::Arity,
                expected: "2 inputs".to_string(),
                actual: format!("{} inputs", inputs.len()),
            });
        }

        self.check_input(inputs[0], 1, "&mut ResponseSink", |ty| match ty {
            Type::Reference(r) if r.mutability.is_some() => {
                last_ident(&r.elem).is_some_and(|n| self.sink_names.contains(&n))
            }
            _ => false,
        })?;
        self.check_input(inputs[1], 2, "&Request", |ty| match ty {
            Type::Reference(r) if r.mutability.is_none() => {
                last_ident(&r.elem).is_some_and(|n| self.request_names.contains(&n))
            }
            _ => false,
        })?;

        let error_ty = self.outputs(sig)?;
        if let Some(error_ty) = error_ty {
            check_error_capability(error_ty)?;
        }
        Ok(())
    }

    fn check_input(
        &self,
        arg: &FnArg,
        index: usize,
        expected: &str,
        accepts: impl Fn(&Type) -> bool,
    ) -> Result<(), ContractError> {
        let fail = |actual: String| ContractError {
            position: Position::Input(index),
            expected: expected.to_string(),
            actual,
        };
        match arg {
            FnArg::Receiver(r) => Err(fail(render(r))),
            FnArg::Typed(pat) if accepts(&pat.ty) => Ok(()),
            FnArg::Typed(pat) => Err(fail(render(&*pat.ty))),
        }
    }

    /// Validate the `Result<T, E>` shape; returns `E` when it is spelled out.
    fn outputs<'a>(&self, sig: &'a Signature) -> Result<Option<&'a Type>, ContractError> {
        let fail = |actual: String| ContractError {
            position: Position::Outputs,
            expected: "Result<T, E>".to_string(),
            actual,
        };
        if sig.asyncness.is_some() {
            return Err(fail("async fn".to_string()));
        }
        let ty = match &sig.output {
            ReturnType::Default => return Err(fail("()".to_string())),
            ReturnType::Type(_, ty) => ty.as_ref(),
        };
        let Type::Path(path) = ty else {
            return Err(fail(render(ty)));
        };
        let Some(last) = path.path.segments.last() else {
            return Err(fail(render(ty)));
        };
        if last.ident != "Result" {
            return Err(fail(render(ty)));
        }
        let types: Vec<&Type> = match &last.arguments {
            PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .filter_map(|a| match a {
                    GenericArgument::Type(t) => Some(t),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        match types.len() {
            // anyhow::Result<T>, io::Result<T>: the error type is implied
            1 => Ok(None),
            2 => Ok(Some(types[1])),
            _ => Err(fail(render(ty))),
        }
    }
}

fn check_error_capability(ty: &Type) -> Result<(), ContractError> {
    let fail = || ContractError {
        position: Position::Output(2),
        expected: "an error type implementing Display".to_string(),
        actual: render(ty),
    };
    match ty {
        Type::Paren(p) => check_error_capability(&p.elem),
        Type::Group(g) => check_error_capability(&g.elem),
        Type::Reference(r) => check_error_capability(&r.elem),
        Type::Path(_) | Type::Macro(_) => Ok(()),
        Type::ImplTrait(t) if bound_names_error(&t.bounds) => Ok(()),
        Type::TraitObject(t) if bound_names_error(&t.bounds) => Ok(()),
        _ => Err(fail()),
    }
}

/// Check `sig` with the default type names.
///
/// # Errors
///
/// Returns the first [`ContractError`] found.
pub fn verify_signature(sig: &Signature) -> Result<(), ContractError> {
    Verifier::default().verify(sig)
}
