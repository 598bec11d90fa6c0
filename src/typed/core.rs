use crate::server::{Request, ResponseSink};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;

/// Trait implemented by typed request handlers.
///
/// A handler receives the response sink and the request, and returns either
/// a value to encode or an error whose message becomes the error envelope.
/// Any `Fn(&mut ResponseSink, &Request) -> Result<T, E>` with a serializable
/// `T` and displayable `E` is a handler, so plain functions register as-is.
pub trait Handler: Send + Sync + 'static {
    /// The success value (serialized to JSON)
    type Response: Serialize + Default + Example;
    /// The failure value; only its `Display` text reaches the caller
    type Error: Display;

    /// Handle a request.
    ///
    /// The sink may be used for headers or status; the body is owned by the
    /// adapter and anything written to it is discarded.
    fn handle(&self, sink: &mut ResponseSink, req: &Request)
        -> Result<Self::Response, Self::Error>;

    /// Fully qualified name of the handler, `crate::module::function` for
    /// function items.
    fn identity(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F, T, E> Handler for F
where
    F: Fn(&mut ResponseSink, &Request) -> Result<T, E> + Send + Sync + 'static,
    T: Serialize + Default + Example,
    E: Display,
{
    type Response = T;
    type Error = E;

    fn handle(&self, sink: &mut ResponseSink, req: &Request) -> Result<T, E> {
        self(sink, req)
    }
}

/// Optional documentation sample for a response type.
///
/// Implement it with an empty body to document the type's `Default` value,
/// or override [`Example::example`] to supply something richer for a given
/// route.
pub trait Example: Sized {
    /// Sample value for the route `method url` served by `func_name`.
    fn example(_method: &str, _url: &str, _func_name: &str) -> Option<Self> {
        None
    }
}

/// The documented sample for `T`: its example when it has one, otherwise its
/// `Default` value.
pub fn sample<T: Default + Example>(method: &str, url: &str, func_name: &str) -> T {
    T::example(method, url, func_name).unwrap_or_default()
}

/// Split a qualified identity into `(package, function)` at the last `::`.
///
/// Generic arguments are ignored when looking for the separator.
#[must_use]
pub fn split_identity(identity: &str) -> (&str, &str) {
    let head = identity.split('<').next().unwrap_or(identity);
    match head.rfind("::") {
        Some(idx) => (&identity[..idx], &identity[idx + 2..]),
        None => ("", identity),
    }
}

macro_rules! zero_example {
    ($($ty:ty),* $(,)?) => {
        $(impl Example for $ty {})*
    };
}

zero_example!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    serde_json::Value,
);

impl<T> Example for Vec<T> {}

// Indirections document the value they point at.

impl<T: Example> Example for Box<T> {
    fn example(method: &str, url: &str, func_name: &str) -> Option<Self> {
        T::example(method, url, func_name).map(Box::new)
    }
}

impl<T: Example> Example for Arc<T> {
    fn example(method: &str, url: &str, func_name: &str) -> Option<Self> {
        T::example(method, url, func_name).map(Arc::new)
    }
}

/// Documents the present case: `T`'s example, or its `Default`.
impl<T: Default + Example> Example for Option<T> {
    fn example(method: &str, url: &str, func_name: &str) -> Option<Self> {
        Some(Some(sample::<T>(method, url, func_name)))
    }
}
impl<K, V, S> Example for HashMap<K, V, S> {}
impl<K, V> Example for BTreeMap<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[derive(Serialize, Default, PartialEq, Debug)]
    struct Greeting {
        text: String,
    }

    impl Example for Greeting {
        fn example(method: &str, _url: &str, func_name: &str) -> Option<Self> {
            (method == "GET" && func_name == "hello").then(|| Greeting {
                text: "hi".into(),
            })
        }
    }

    fn hello(_: &mut ResponseSink, req: &Request) -> Result<Greeting, String> {
        Ok(Greeting {
            text: req.form_value("name"),
        })
    }

    fn assert_handler<H: Handler>(_: &H) {}

    #[test]
    fn test_functions_are_handlers() {
        assert_handler(&hello);
        let mut sink = ResponseSink::new();
        let req = Request::new(Method::GET, "/?name=x");
        let out = Handler::handle(&hello, &mut sink, &req).unwrap();
        assert_eq!(out.text, "x");
    }

    #[test]
    fn test_identity_of_function_item() {
        let identity = Handler::identity(&hello);
        assert!(identity.ends_with("::hello"), "{identity}");
        assert_eq!(split_identity(identity).1, "hello");
    }

    #[test]
    fn test_split_identity() {
        assert_eq!(split_identity("a::b::c"), ("a::b", "c"));
        assert_eq!(split_identity("plain"), ("", "plain"));
        assert_eq!(
            split_identity("a::f<b::C>"),
            ("a", "f<b::C>")
        );
    }

    #[test]
    fn test_sample_prefers_example() {
        assert_eq!(sample::<Greeting>("GET", "/", "hello").text, "hi");
        assert_eq!(sample::<Greeting>("POST", "/", "hello"), Greeting::default());
        assert_eq!(sample::<u64>("GET", "/", "x"), 0);
    }

    #[test]
    fn test_indirections_use_inner_example() {
        assert_eq!(sample::<Box<Greeting>>("GET", "/", "hello").text, "hi");
        assert_eq!(sample::<Arc<Greeting>>("GET", "/", "hello").text, "hi");
        assert_eq!(
            sample::<Option<Greeting>>("GET", "/", "hello"),
            Some(Greeting { text: "hi".into() })
        );
        assert_eq!(
            sample::<Option<Greeting>>("POST", "/", "hello"),
            Some(Greeting::default())
        );
        assert_eq!(sample::<Box<Greeting>>("POST", "/", "hello").text, "");
    }
}
