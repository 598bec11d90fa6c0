use super::*;
use serde_json::json;

fn endpoint(method: &str, url: &str, func: &str, doc: &str, response: serde_json::Value) -> Endpoint {
    Endpoint {
        method: method.into(),
        url: url.into(),
        package: "shop::api".into(),
        func: func.into(),
        doc: doc.into(),
        response,
    }
}

fn sample() -> Documentation {
    let mut docs = Documentation::new();
    docs.insert(
        "URLS".into(),
        RouteGroup {
            endpoints: vec![
                endpoint("GET", "/lol", "return_boop", "Returns a **boop**.", json!({"Name": "boop"})),
                endpoint("POST", "/lol", "post", "", serde_json::Value::Null),
            ],
            doc: "The <em>main</em> table".into(),
        },
    );
    docs.insert("ADMIN".into(), RouteGroup::default());
    docs
}

#[test]
fn test_json_shape() {
    let mut out = Vec::new();
    to_writer(&sample(), &mut out, false).unwrap();
    assert!(out.ends_with(b"\n"));
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let group = &value["URLS"];
    assert_eq!(group["Doc"], "The <em>main</em> table");
    let first = &group["Endpoints"][0];
    assert_eq!(first["Method"], "GET");
    assert_eq!(first["URL"], "/lol");
    assert_eq!(first["Package"], "shop::api");
    assert_eq!(first["Func"], "return_boop");
    assert_eq!(first["Response"]["Name"], "boop");
    assert!(group["Endpoints"][1]["Response"].is_null());
}

#[test]
fn test_groups_sorted_by_name() {
    let mut out = Vec::new();
    to_writer(&sample(), &mut out, true).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.find("\"ADMIN\"").unwrap() < text.find("\"URLS\"").unwrap());
}

#[test]
fn test_json_round_trips_into_model() {
    let mut out = Vec::new();
    to_writer(&sample(), &mut out, false).unwrap();
    let back: Documentation = serde_json::from_slice(&out).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn test_html_contents_and_sections() {
    let html = render_html(&sample(), "API").unwrap();
    assert!(html.contains("<title>API</title>"));
    assert!(html.contains("<h1>URLS</h1>"));
    // Doc text is inserted as-is
    assert!(html.contains("The <em>main</em> table"));
    assert!(html.contains("Returns a **boop**."));
    assert!(html.contains("href=\"#URLS-return_boop\""));
    assert!(html.contains("id=\"URLS-return_boop\""));
    assert!(html.contains("<code>GET "));
    // Only the endpoint with a response gets a Response block
    assert_eq!(html.matches("<p>Response:</p>").count(), 1);
    // Endpoint order follows declaration order
    assert!(html.find("id=\"URLS-return_boop\"").unwrap() < html.find("id=\"URLS-post\"").unwrap());
}

#[test]
fn test_html_anchors_are_unique() {
    let mut docs = Documentation::new();
    docs.insert(
        "T".into(),
        RouteGroup {
            endpoints: vec![
                endpoint("GET", "/a", "same", "", serde_json::Value::Null),
                endpoint("PUT", "/a", "same", "", serde_json::Value::Null),
            ],
            doc: String::new(),
        },
    );
    let html = render_html(&docs, "x").unwrap();
    assert!(html.contains("id=\"T-same\""));
    assert!(html.contains("id=\"T-same-2\""));
}

#[test]
fn test_qualified_func() {
    let e = endpoint("GET", "/", "f", "", serde_json::Value::Null);
    assert_eq!(e.qualified_func(), "shop::api::f");
    let bare = Endpoint {
        package: String::new(),
        ..e
    };
    assert_eq!(bare.qualified_func(), "f");
}
