//! Verify build/parse behavior against JSON test vectors in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses
//! and expected normalized results. Comparing parsed JSON (not raw strings)
//! avoids false negatives from field ordering.

use std::cell::RefCell;

use logbook_core::{
    notify, AdminPanel, ApiClient, ApiError, ApiResponse, HttpMethod, HttpRequest, HttpResponse,
    LogbookClient, Navigator, NewVisitor, Transport, Visitor,
};

const BASE_URL: &str = "http://localhost:8000";

fn client() -> LogbookClient {
    LogbookClient::new(BASE_URL)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: vec![(
            "content-type".to_string(),
            sim["content_type"].as_str().unwrap().to_string(),
        )],
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let raw = include_str!("../../test-vectors/list.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let req = c.build_list_visitors();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");

        let parsed = c.parse_list_visitors(&simulated(case));
        let expected: ApiResponse<Vec<Visitor>> =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let raw = include_str!("../../test-vectors/create.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: NewVisitor = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        let req = c.build_create_visitor(&input).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        let parsed = c.parse_visitor(&simulated(case));
        let expected: ApiResponse<Visitor> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");

        if let Some(notes) = case.get("expected_notifications") {
            let texts: Vec<String> = notify::failure(&parsed, "Failed to register visitor")
                .into_iter()
                .map(|n| n.text)
                .collect();
            let expected: Vec<String> = serde_json::from_value(notes.clone()).unwrap();
            assert_eq!(texts, expected, "{name}: notifications");
        }
    }
}

// ---------------------------------------------------------------------------
// Admin panel, through the session-aware client
// ---------------------------------------------------------------------------

/// Answers the CSRF priming request, then replays one canned response.
struct OneShot {
    response: RefCell<Option<HttpResponse>>,
}

impl Transport for OneShot {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if request.url.ends_with("/sanctum/csrf-cookie") {
            return Ok(HttpResponse {
                status: 204,
                headers: vec![("set-cookie".to_string(), "XSRF-TOKEN=t; path=/".to_string())],
                body: String::new(),
            });
        }
        self.response
            .borrow_mut()
            .take()
            .ok_or_else(|| ApiError::Transport("no response scripted".to_string()))
    }
}

#[derive(Default)]
struct Recorder(RefCell<Vec<String>>);

impl Navigator for Recorder {
    fn navigate(&self, location: &str) {
        self.0.borrow_mut().push(location.to_string());
    }
}

#[test]
fn admin_panel_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let transport = OneShot {
            response: RefCell::new(Some(simulated(case))),
        };
        let api = ApiClient::with_navigator(client(), transport, Recorder::default());

        let parsed = api.get_admin_panel();
        let expected: ApiResponse<AdminPanel> =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");

        let navigations: Vec<String> = serde_json::from_value(case["expected_navigation"].clone()).unwrap();
        assert_eq!(*api.navigator().0.borrow(), navigations, "{name}: navigation");
    }
}
