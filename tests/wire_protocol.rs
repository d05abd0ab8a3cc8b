//! WebDriver wire client tests against a stub HTTP server.

use std::io::Read;
use stitchshot::{BrowserFamily, Driver, Error, WebDriverSession};
use tiny_http::{Header, Response, Server};

fn json_header() -> Header {
    "Content-Type: application/json; charset=utf-8"
        .parse::<Header>()
        .unwrap()
}

/// Start a stub server; the handler runs once per incoming request.
fn spawn_server<F>(handler: F) -> String
where
    F: Fn(tiny_http::Request) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            handler(request);
        }
    });
    format!("http://{}", addr)
}

#[test]
fn execute_script_round_trips_the_value() {
    let base = spawn_server(|request| {
        assert_eq!(request.url(), "/session/s1/execute/sync");
        let response =
            Response::from_string(r#"{"value": 42}"#).with_header(json_header());
        let _ = request.respond(response);
    });

    let mut session = WebDriverSession::attach(&base, "s1", BrowserFamily::Firefox).unwrap();
    let value = session.execute_script("return 2 + 40;").unwrap();
    assert_eq!(value, serde_json::json!(42));
}

#[test]
fn execute_script_posts_the_script_body() {
    let base = spawn_server(|mut request| {
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["script"], "return window.innerHeight;");
        assert!(parsed["args"].as_array().unwrap().is_empty());

        let response =
            Response::from_string(r#"{"value": 768}"#).with_header(json_header());
        let _ = request.respond(response);
    });

    let mut session = WebDriverSession::attach(&base, "s1", BrowserFamily::Firefox).unwrap();
    let value = session.execute_script("return window.innerHeight;").unwrap();
    assert_eq!(value.as_f64(), Some(768.0));
}

#[test]
fn screenshot_payload_is_base64_decoded() {
    let base = spawn_server(|request| {
        assert_eq!(request.url(), "/session/s1/screenshot");
        // "PNGDATA" in base64
        let response = Response::from_string(r#"{"value": "UE5HREFUQQ=="}"#)
            .with_header(json_header());
        let _ = request.respond(response);
    });

    let mut session = WebDriverSession::attach(&base, "s1", BrowserFamily::Firefox).unwrap();
    let bytes = session.capture_viewport().unwrap();
    assert_eq!(bytes, b"PNGDATA");
}

#[test]
fn script_errors_surface_the_driver_message() {
    let base = spawn_server(|request| {
        let response = Response::from_string(
            r#"{"value": {"error": "javascript error", "message": "boom at line 1"}}"#,
        )
        .with_header(json_header())
        .with_status_code(500);
        let _ = request.respond(response);
    });

    let mut session = WebDriverSession::attach(&base, "s1", BrowserFamily::Firefox).unwrap();
    let err = session.execute_script("throw new Error('boom')").unwrap_err();
    match err {
        Error::Script(message) => assert!(message.contains("boom")),
        other => panic!("expected a script error, got {:?}", other),
    }
}

#[test]
fn missing_value_field_is_a_protocol_error() {
    let base = spawn_server(|request| {
        let response =
            Response::from_string(r#"{"weird": true}"#).with_header(json_header());
        let _ = request.respond(response);
    });

    let mut session = WebDriverSession::attach(&base, "s1", BrowserFamily::Firefox).unwrap();
    let err = session.capture_viewport().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[test]
fn connect_parses_session_and_capabilities() {
    let base = spawn_server(|request| match request.url() {
        "/session" => {
            let body = r#"{"value": {"sessionId": "s9", "capabilities": {"browserName": "firefox", "moz:geckodriverVersion": "0.33.0"}}}"#;
            let _ = request.respond(Response::from_string(body).with_header(json_header()));
        }
        "/session/s9" => {
            let _ = request
                .respond(Response::from_string(r#"{"value": null}"#).with_header(json_header()));
        }
        other => panic!("unexpected request to {}", other),
    });

    let session = WebDriverSession::connect(&base, "firefox").unwrap();
    assert_eq!(session.family(), BrowserFamily::Firefox);
    assert_eq!(session.driver_version(), Some("0.33.0".to_string()));

    let endpoint = session.endpoint().unwrap();
    assert_eq!(endpoint.session_id, "s9");

    session.close().unwrap();
}

#[test]
fn unreachable_server_is_a_connectivity_error() {
    // Port 1 is essentially never listening.
    let mut session =
        WebDriverSession::attach("http://127.0.0.1:1", "s1", BrowserFamily::Firefox).unwrap();
    let err = session.execute_script("return 1;").unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)));
}
