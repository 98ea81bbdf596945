//! Stateless HTTP request builder and response parser for the logbook API.
//!
//! # Design
//! `LogbookClient` holds only the base URL and API prefix. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that normalizes an `HttpResponse`. Session cookies and
//! the CSRF header are layered on by `ApiClient`.

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::{normalize, normalize_empty, ApiResponse};
use crate::types::{Admin, AdminPanel, Credentials, NewVisitor, Visitor, VisitorId};

pub const DEFAULT_API_PREFIX: &str = "/api";
pub const CSRF_COOKIE_PATH: &str = "/sanctum/csrf-cookie";

#[derive(Debug, Clone)]
pub struct LogbookClient {
    base_url: String,
    api_prefix: String,
}

impl LogbookClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_prefix(base_url, DEFAULT_API_PREFIX)
    }

    pub fn with_prefix(base_url: &str, api_prefix: &str) -> Self {
        let prefix = api_prefix.trim_matches('/');
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: if prefix.is_empty() { String::new() } else { format!("/{prefix}") },
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: self.api_url(path),
            headers: json_headers(),
            body: None,
        }
    }

    fn request_with_body<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let mut req = self.request(method, path);
        req.body = Some(serde_json::to_string(body)?);
        Ok(req)
    }

    /// The priming request that makes the backend set the `XSRF-TOKEN` cookie.
    pub fn build_csrf_cookie(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{}", self.base_url, CSRF_COOKIE_PATH),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub fn build_list_visitors(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/visitor")
    }

    pub fn build_create_visitor(&self, input: &NewVisitor) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, "/visitor", input)
    }

    pub fn build_get_visitor(&self, id: VisitorId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/visitor/{id}/edit"))
    }

    pub fn build_update_visitor(&self, id: VisitorId, input: &NewVisitor) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Patch, &format!("/visitor/{id}"), input)
    }

    pub fn build_delete_visitor(&self, id: VisitorId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/visitor/{id}"))
    }

    /// Sign-out carries an empty JSON object as its body.
    pub fn build_timeout_visitor(&self, id: VisitorId) -> HttpRequest {
        let mut req = self.request(HttpMethod::Patch, &format!("/visitor/{id}/timeout"));
        req.body = Some("{}".to_string());
        req
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, "/auth/adminLogin", credentials)
    }

    pub fn build_logout(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/auth/adminLogout")
    }

    pub fn build_admin_panel(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin")
    }

    pub fn parse_list_visitors(&self, response: &HttpResponse) -> ApiResponse<Vec<Visitor>> {
        normalize(response)
    }

    pub fn parse_visitor(&self, response: &HttpResponse) -> ApiResponse<Visitor> {
        normalize(response)
    }

    pub fn parse_empty(&self, response: &HttpResponse) -> ApiResponse<()> {
        normalize_empty(response)
    }

    pub fn parse_login(&self, response: &HttpResponse) -> ApiResponse<Admin> {
        normalize(response)
    }

    pub fn parse_admin_panel(&self, response: &HttpResponse) -> ApiResponse<AdminPanel> {
        normalize(response)
    }
}

/// Headers every API request carries, minus the per-session CSRF token.
fn json_headers() -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("accept".to_string(), "application/json".to_string()),
        ("x-requested-with".to_string(), "XMLHttpRequest".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sex;

    fn client() -> LogbookClient {
        LogbookClient::new("http://localhost:8000")
    }

    fn new_visitor() -> NewVisitor {
        NewVisitor {
            firstname: "Grace".to_string(),
            middlename: None,
            lastname: "Hopper".to_string(),
            age: 45,
            sex: Sex::Female,
            contact_number: "555-0199".to_string(),
            purpose_of_visit: "Compiler review".to_string(),
        }
    }

    #[test]
    fn build_list_visitors_produces_correct_request() {
        let req = client().build_list_visitors();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/visitor");
        assert!(req.body.is_none());
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("x-requested-with"), Some("XMLHttpRequest"));
    }

    #[test]
    fn csrf_cookie_lives_outside_the_api_prefix() {
        let req = client().build_csrf_cookie();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/sanctum/csrf-cookie");
    }

    #[test]
    fn build_create_visitor_serializes_payload() {
        let req = client().build_create_visitor(&new_visitor()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["firstname"], "Grace");
        assert_eq!(body["age"], 45);
        assert_eq!(body["sex"], "Female");
    }

    #[test]
    fn build_get_visitor_targets_edit_route() {
        let req = client().build_get_visitor(12);
        assert_eq!(req.url, "http://localhost:8000/api/visitor/12/edit");
    }

    #[test]
    fn build_update_visitor_uses_patch() {
        let req = client().build_update_visitor(12, &new_visitor()).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:8000/api/visitor/12");
        assert!(req.body.is_some());
    }

    #[test]
    fn build_timeout_visitor_sends_empty_object() {
        let req = client().build_timeout_visitor(3);
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:8000/api/visitor/3/timeout");
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn build_delete_visitor_has_no_body() {
        let req = client().build_delete_visitor(3);
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_login_and_logout() {
        let creds = Credentials {
            email: "admin@example.com".to_string(),
            password: "secret".to_string(),
        };
        let req = client().build_login(&creds).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/auth/adminLogin");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"email": "admin@example.com", "password": "secret"}));

        let req = client().build_logout();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/auth/adminLogout");
    }

    #[test]
    fn trailing_slash_and_custom_prefix() {
        let client = LogbookClient::with_prefix("http://localhost:8000/", "v2/");
        assert_eq!(client.build_admin_panel().url, "http://localhost:8000/v2/admin");
        let bare = LogbookClient::with_prefix("http://localhost:8000", "");
        assert_eq!(bare.build_admin_panel().url, "http://localhost:8000/admin");
    }

    #[test]
    fn parse_empty_ignores_success_body() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: r#"{"message":"Logged out"}"#.to_string(),
        };
        let resp = client().parse_empty(&response);
        assert!(resp.success);
        assert!(resp.data.is_none());
    }

    #[test]
    fn parse_visitor_not_found() {
        let response = HttpResponse {
            status: 404,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: r#"{"message":"Visitor not found."}"#.to_string(),
        };
        let resp = client().parse_visitor(&response);
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Visitor not found."));
    }
}
