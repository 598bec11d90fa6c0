use super::*;
use crate::adapter::{ErrorEnvelope, Procedure};
use crate::router::{route, Registry, RouteTable};
use crate::server::{Outcome, Request, ResponseSink};
use http::Method;
use std::io::Write;

fn fine(_: &mut ResponseSink, _: &Request) -> Result<String, String> {
    Ok("fine".into())
}

fn nope(_: &mut ResponseSink, _: &Request) -> Result<String, String> {
    panic!("NOPE");
}

fn formatted(_: &mut ResponseSink, req: &Request) -> Result<String, String> {
    panic!("bad path {}", req.path);
}

fn failing(_: &mut ResponseSink, _: &Request) -> Result<String, String> {
    Err("nope".into())
}

struct WritesThenPanics;

impl Procedure for WritesThenPanics {
    fn call(&self, sink: &mut ResponseSink, _: &Request) {
        sink.set_status(202);
        sink.write_all(b"{\"partial\":").ok();
        std::panic::panic_any(42_u32);
    }
}

fn registry() -> Registry {
    RouteTable::new(vec![
        route(Method::GET, "/fine", fine),
        route(Method::DELETE, "/items", nope),
        route(Method::GET, "/formatted", formatted),
        route(Method::POST, "/items", failing),
    ])
    .registry()
    .unwrap()
}

fn call<P: Procedure>(p: &P, method: Method, path: &str) -> ResponseSink {
    let mut sink = ResponseSink::new();
    p.call(&mut sink, &Request::new(method, path));
    sink
}

#[test]
fn test_recovery_str_payload_then_next_request_succeeds() {
    let app = registry().with_recovery();
    let sink = call(&app, Method::DELETE, "/items");
    assert_eq!(sink.body(), b"{\"Error\":\"PANIC: NOPE\"}\n");
    assert_eq!(sink.outcome(), Outcome::Panic);
    assert_eq!(sink.status(), 200);

    let sink = call(&app, Method::GET, "/fine");
    assert_eq!(sink.outcome(), Outcome::Success);
    assert_eq!(sink.body(), b"\"fine\"\n");
}

#[test]
fn test_recovery_string_payload() {
    let app = registry().with_recovery();
    let sink = call(&app, Method::GET, "/formatted");
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "PANIC: bad path /formatted");
}

#[test]
fn test_recovery_discards_partial_body() {
    let app = WritesThenPanics.with_recovery();
    let sink = call(&app, Method::GET, "/");
    assert_eq!(sink.status(), 202);
    assert_eq!(sink.header("content-type"), Some("application/json"));
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "PANIC: unknown panic payload");
}

#[test]
fn test_status_policy_default_preserves_status() {
    let app = registry()
        .with_recovery()
        .with_status_policy(ErrorStatusPolicy::default());
    assert_eq!(call(&app, Method::POST, "/items").status(), 200);
    assert_eq!(call(&app, Method::DELETE, "/items").status(), 200);
}

#[test]
fn test_status_policy_maps_failures() {
    let policy = ErrorStatusPolicy {
        handler_error: Some(422),
        encoding_error: None,
        panic: Some(500),
    };
    let app = registry().with_recovery().with_status_policy(policy).with_tracing();
    assert_eq!(call(&app, Method::POST, "/items").status(), 422);
    assert_eq!(call(&app, Method::DELETE, "/items").status(), 500);
    assert_eq!(call(&app, Method::GET, "/fine").status(), 200);
    assert_eq!(call(&app, Method::GET, "/missing").status(), 404);
}

#[test]
fn test_policy_deserializes_partially() {
    let policy: ErrorStatusPolicy = serde_yaml::from_str("panic: 503\n").unwrap();
    assert_eq!(policy.panic, Some(503));
    assert_eq!(policy.handler_error, None);
    assert_eq!(
        ErrorStatusPolicy::internal_server_error().status_for(Outcome::HandlerError),
        Some(500)
    );
}

#[test]
fn test_panic_message_variants() {
    let boxed: Box<dyn std::any::Any + Send> = Box::new("x");
    assert_eq!(panic_message(boxed.as_ref()), "x");
    let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("y"));
    assert_eq!(panic_message(boxed.as_ref()), "y");
    let boxed: Box<dyn std::any::Any + Send> = Box::new(1_i32);
    assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
}
