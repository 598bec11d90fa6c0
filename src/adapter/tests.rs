use super::*;
use crate::server::{Outcome, Request, ResponseSink};
use crate::typed::Example;
use http::Method;
use serde::{Serialize, Serializer};
use std::io::Write;

#[derive(Serialize, Default, Debug, PartialEq)]
struct Pair {
    left: u64,
    right: String,
}

impl Example for Pair {
    fn example(_method: &str, url: &str, _func_name: &str) -> Option<Self> {
        Some(Pair {
            left: u64::MAX,
            right: url.to_string(),
        })
    }
}

#[derive(Default)]
struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot encode Unencodable"))
    }
}

impl Example for Unencodable {}

fn ok_pair(_: &mut ResponseSink, _: &Request) -> Result<Pair, String> {
    Ok(Pair {
        left: 1,
        right: "r".into(),
    })
}

fn failing(_: &mut ResponseSink, _: &Request) -> Result<Pair, String> {
    Err("stuff went wrong: 2354".into())
}

fn scribbler(sink: &mut ResponseSink, _: &Request) -> Result<Pair, String> {
    write!(sink, "partial garbage").map_err(|e| e.to_string())?;
    Err("late failure".into())
}

fn unencodable(_: &mut ResponseSink, _: &Request) -> Result<Unencodable, String> {
    Ok(Unencodable)
}

fn run<H: crate::typed::Handler>(handler: H) -> ResponseSink {
    let mut sink = ResponseSink::new();
    Adapter::new(handler).call(&mut sink, &Request::new(Method::GET, "/"));
    sink
}

#[test]
fn test_success_encodes_value() {
    let sink = run(ok_pair);
    assert_eq!(sink.header("content-type"), Some("application/json"));
    assert_eq!(sink.status(), 200);
    assert_eq!(sink.outcome(), Outcome::Success);
    let value: serde_json::Value = sink.body_json().unwrap();
    assert_eq!(value, serde_json::json!({"left": 1, "right": "r"}));
    assert!(value.get("Error").is_none());
    assert!(sink.body().ends_with(b"}\n"));
}

#[test]
fn test_error_becomes_envelope_and_keeps_status() {
    let sink = run(failing);
    assert_eq!(sink.status(), 200);
    assert_eq!(sink.outcome(), Outcome::HandlerError);
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope, ErrorEnvelope::new("stuff went wrong: 2354"));
    assert_eq!(sink.body(), b"{\"Error\":\"stuff went wrong: 2354\"}\n");
}

#[test]
fn test_handler_writes_are_discarded() {
    let sink = run(scribbler);
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "late failure");
}

#[test]
fn test_encoding_failure_falls_back_to_envelope() {
    let sink = run(unencodable);
    assert_eq!(sink.outcome(), Outcome::EncodingError);
    let envelope: ErrorEnvelope = sink.body_json().unwrap();
    assert_eq!(envelope.error, "cannot encode Unencodable");
}

#[test]
fn test_closures_with_status() {
    let sink = run(|sink: &mut ResponseSink, _: &Request| -> Result<u32, String> {
        sink.set_status(201);
        Ok(7)
    });
    assert_eq!(sink.status(), 201);
    assert_eq!(sink.body(), b"7\n");
}

#[test]
fn test_sample_response_uses_example() {
    let adapter = Adapter::new(ok_pair);
    let sample = adapter.sample_response("GET", "/pairs", "ok_pair").unwrap();
    assert_eq!(sample["right"], "/pairs");
    assert_eq!(sample["left"].to_string(), u64::MAX.to_string());
    assert!(adapter.response_type().ends_with("Pair"));
    assert!(AdaptedHandler::identity(&adapter).ends_with("::ok_pair"));
}

#[test]
fn test_sample_response_propagates_encoding_error() {
    let adapter = Adapter::new(unencodable);
    assert!(adapter.sample_response("GET", "/", "unencodable").is_err());
}
