use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Content type whose body contributes to [`Request::form_value`].
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Inbound request as seen by handlers.
///
/// Built from the transport request by [`parse_request`], or by hand with
/// [`Request::new`] and the `with_*` builders (useful in tests and benches).
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Filled in by the registry when the route template has `{param}`s
    pub path_params: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    /// A bodiless request. A query string on `path` is split off and parsed.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        let (path_only, query) = split_path(path);
        Self {
            id: RequestId::new(),
            method,
            path: path_only.to_string(),
            query,
            headers: HashMap::new(),
            path_params: HashMap::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// First value for `key` from a urlencoded form body, then from the query
    /// string. Missing keys yield an empty string.
    #[must_use]
    pub fn form_value(&self, key: &str) -> String {
        if self.is_form_body() {
            if let Some((_, v)) =
                url::form_urlencoded::parse(&self.body).find(|(k, _)| k.as_ref() == key)
            {
                return v.into_owned();
            }
        }
        self.query.get(key).cloned().unwrap_or_default()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    fn is_form_body(&self) -> bool {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    }
}

/// Split `/p?x=1` into the path and its decoded query parameters.
fn split_path(raw: &str) -> (&str, HashMap<String, String>) {
    match raw.split_once('?') {
        Some((path, query)) => (path, parse_query_params(query)),
        None => (raw, HashMap::new()),
    }
}

/// URL-decode a query string. Later duplicates do not override earlier ones.
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }
    params
}

/// Build a [`Request`] from the raw `may_minihttp` request.
///
/// Unknown methods map to an extension [`Method`]; an unreadable body is
/// treated as empty.
pub fn parse_request(req: may_minihttp::Request) -> Request {
    let method = Method::from_bytes(req.method().as_bytes()).unwrap_or(Method::GET);
    let (path, query) = split_path(req.path());
    let path = if path.is_empty() { "/" } else { path }.to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let id = RequestId::from_header_or_new(headers.get(REQUEST_ID_HEADER).map(String::as_str));

    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        debug!(request_id = %id, error = %e, "Request body unreadable, treating as empty");
        body.clear();
    }

    debug!(
        request_id = %id,
        method = %method,
        path = %path,
        header_count = headers.len(),
        query_count = query.len(),
        body_bytes = body.len(),
        "Request parsed"
    );

    Request {
        id,
        method,
        path,
        query,
        headers,
        path_params: HashMap::new(),
        body,
    }
}
