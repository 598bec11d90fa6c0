use super::*;
use crate::adapter::{ErrorEnvelope, Procedure};
use crate::server::{Outcome, Request, ResponseSink};
use http::Method;

fn list(_: &mut ResponseSink, _: &Request) -> Result<Vec<String>, String> {
    Ok(vec!["a".into(), "b".into()])
}

fn create(_: &mut ResponseSink, _: &Request) -> Result<String, String> {
    Ok("created".into())
}

fn echo_id(_: &mut ResponseSink, req: &Request) -> Result<String, String> {
    req.path_param("id")
        .map(str::to_string)
        .ok_or_else(|| "no id".to_string())
}

fn dispatch(registry: &Registry, method: Method, path: &str) -> ResponseSink {
    let mut sink = ResponseSink::new();
    registry.call(&mut sink, &Request::new(method, path));
    sink
}

#[test]
fn test_duplicate_rejected_in_any_order() {
    let mut builder = Registry::builder();
    builder.add(Method::GET, "/items", list).unwrap();
    let err = builder.add(Method::GET, "/items", create).err().unwrap();
    assert_eq!(
        err,
        RouteError::Duplicate {
            method: Method::GET,
            path: "/items".into()
        }
    );

    let mut builder = Registry::builder();
    builder.add(Method::GET, "/items", create).unwrap();
    assert!(builder.add(Method::GET, "/items", list).is_err());
}

#[test]
fn test_duplicate_ignores_param_names() {
    let mut builder = Registry::builder();
    builder.add(Method::GET, "/items/{id}", echo_id).unwrap();
    let err = builder.add(Method::GET, "/items/{key}", echo_id).err().unwrap();
    assert!(err.to_string().contains("duplicate route: GET /items/{key}"));
    // A different method on the same path is fine
    builder.add(Method::DELETE, "/items/{key}", echo_id).unwrap();
}

#[test]
fn test_invalid_paths() {
    let mut builder = Registry::builder();
    assert!(matches!(
        builder.add(Method::GET, "items", list).err(),
        Some(RouteError::InvalidPath { .. })
    ));
    assert!(builder.add(Method::GET, "/items/{", list).is_err());
    assert!(builder.add(Method::GET, "/items/x{id}", list).is_err());
    assert!(builder.add(Method::GET, "/items/{}", list).is_err());
}

#[test]
fn test_table_registry_dispatches() {
    let table = RouteTable::new(vec![
        route(Method::GET, "/items", list),
        Route::new(Method::POST, "/items", create),
        route(Method::GET, "/items/{id}", echo_id),
    ]);
    let registry = table.registry().unwrap();
    assert_eq!(registry.len(), 3);

    let sink = dispatch(&registry, Method::GET, "/items");
    assert_eq!(sink.body(), b"[\"a\",\"b\"]\n");

    let sink = dispatch(&registry, Method::POST, "/items");
    assert_eq!(sink.body(), b"\"created\"\n");

    let sink = dispatch(&registry, Method::GET, "/items/42?x=1");
    assert_eq!(sink.body(), b"\"42\"\n");
}

#[test]
fn test_table_with_duplicates_fails() {
    let table: RouteTable = vec![
        route(Method::GET, "/items", list),
        route(Method::GET, "/items", list),
    ]
    .into_iter()
    .collect();
    assert!(table.registry().is_err());
}

#[test]
fn test_not_found_envelope() {
    let registry = RouteTable::new(vec![route(Method::GET, "/items", list)])
        .registry()
        .unwrap();
    let sink = dispatch(&registry, Method::GET, "/nothing");
    assert_eq!(sink.status(), 404);
    assert_eq!(sink.outcome(), Outcome::NotFound);
    assert_eq!(sink.header("content-type"), Some("application/json"));
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "not found");
}

#[test]
fn test_method_not_allowed_envelope() {
    let registry = RouteTable::new(vec![
        route(Method::GET, "/items", list),
        route(Method::POST, "/items", create),
    ])
    .registry()
    .unwrap();
    let sink = dispatch(&registry, Method::DELETE, "/items");
    assert_eq!(sink.status(), 405);
    assert_eq!(sink.outcome(), Outcome::MethodNotAllowed);
    assert_eq!(sink.header("allow"), Some("GET, POST"));
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "method not allowed");
}

#[test]
fn test_handler_for_reports_identity() {
    let registry = RouteTable::new(vec![route(Method::GET, "/items/{id}", echo_id)])
        .registry()
        .unwrap();
    let identity = registry.handler_for(&Method::GET, "/items/9").unwrap();
    assert!(identity.ends_with("::echo_id"));
    assert!(registry.handler_for(&Method::POST, "/items/9").is_none());
}

#[test]
fn test_route_debug_names_handler() {
    let r = route(Method::GET, "/items", list);
    let text = format!("{r:?}");
    assert!(text.contains("/items"));
    assert!(text.contains("list"));
}
