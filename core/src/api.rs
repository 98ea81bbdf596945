//! Session-aware API client.
//!
//! # Design
//! `ApiClient` wraps the stateless `LogbookClient` with the two pieces of
//! per-session state the backend needs: a cookie jar and a flag recording
//! whether the CSRF cookie has been primed. The actual round-trip goes
//! through a host-supplied `Transport`, so the client itself stays free of
//! any particular HTTP library.
//!
//! Priming is checked and set with plain atomic loads and stores. Two calls
//! racing on a fresh client may both prime; the priming request is
//! idempotent so that is harmless.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::client::LogbookClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::response::{ApiResponse, FieldErrors};
use crate::session::CookieJar;
use crate::types::{Admin, AdminPanel, Credentials, NewVisitor, Visitor, VisitorId};

pub const DEFAULT_LOGIN_LOCATION: &str = "/adminLogin";

/// Executes plain-data HTTP requests.
///
/// Implementations must return non-2xx statuses as `Ok` responses; `Err` is
/// reserved for "no response at all".
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Receives the hard redirect issued when the admin dashboard reports an
/// unauthenticated session.
pub trait Navigator {
    fn navigate(&self, location: &str);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        info!(location, "navigation requested");
    }
}

pub struct ApiClient<T, N = LogNavigator> {
    endpoints: LogbookClient,
    transport: T,
    navigator: N,
    login_location: String,
    csrf_primed: AtomicBool,
    cookies: Mutex<CookieJar>,
}

impl<T: Transport> ApiClient<T, LogNavigator> {
    pub fn new(endpoints: LogbookClient, transport: T) -> Self {
        Self::with_navigator(endpoints, transport, LogNavigator)
    }
}

impl<T: Transport, N: Navigator> ApiClient<T, N> {
    pub fn with_navigator(endpoints: LogbookClient, transport: T, navigator: N) -> Self {
        Self {
            endpoints,
            transport,
            navigator,
            login_location: DEFAULT_LOGIN_LOCATION.to_string(),
            csrf_primed: AtomicBool::new(false),
            cookies: Mutex::new(CookieJar::new()),
        }
    }

    pub fn login_location(mut self, location: impl Into<String>) -> Self {
        self.login_location = location.into();
        self
    }

    /// Start from cookies saved by an earlier session.
    pub fn cookies(self, jar: CookieJar) -> Self {
        *lock(&self.cookies) = jar;
        self
    }

    pub fn cookie_jar(&self) -> CookieJar {
        lock(&self.cookies).clone()
    }

    pub fn clear_cookies(&self) {
        lock(&self.cookies).clear();
    }

    pub fn is_csrf_primed(&self) -> bool {
        self.csrf_primed.load(Ordering::Acquire)
    }

    pub fn endpoints(&self) -> &LogbookClient {
        &self.endpoints
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Fetch the CSRF cookie unless this client already did.
    ///
    /// A non-2xx answer still counts as primed; only a transport failure
    /// leaves the flag unset so the next call tries again.
    fn ensure_csrf(&self) -> Result<(), ApiError> {
        if self.csrf_primed.load(Ordering::Acquire) {
            return Ok(());
        }
        debug!(base_url = self.endpoints.base_url(), "priming CSRF cookie");
        let mut request = self.endpoints.build_csrf_cookie();
        if let Some(cookie) = lock(&self.cookies).header_value() {
            request.set_header("cookie", cookie);
        }
        let response = self.transport.execute(&request)?;
        lock(&self.cookies).absorb(&response);
        self.csrf_primed.store(true, Ordering::Release);
        Ok(())
    }

    /// Prime, decorate, execute and absorb cookies. `None` means no response.
    fn send(&self, mut request: HttpRequest) -> Option<HttpResponse> {
        if let Err(e) = self.ensure_csrf() {
            warn!(error = %e, "CSRF priming failed");
            return None;
        }
        lock(&self.cookies).decorate(&mut request);
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        match self.transport.execute(&request) {
            Ok(response) => {
                lock(&self.cookies).absorb(&response);
                debug!(status = response.status, url = %request.url, "received response");
                Some(response)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "request failed without a response");
                None
            }
        }
    }

    fn call<R>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&LogbookClient, &HttpResponse) -> ApiResponse<R>,
    ) -> ApiResponse<R> {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "could not build request");
                return ApiResponse::failure(e.to_string(), FieldErrors::new());
            }
        };
        match self.send(request) {
            Some(response) => parse(&self.endpoints, &response),
            None => ApiResponse::network_error(),
        }
    }

    pub fn get_visitors(&self) -> ApiResponse<Vec<Visitor>> {
        self.call(Ok(self.endpoints.build_list_visitors()), LogbookClient::parse_list_visitors)
    }

    pub fn create_visitor(&self, input: &NewVisitor) -> ApiResponse<Visitor> {
        self.call(self.endpoints.build_create_visitor(input), LogbookClient::parse_visitor)
    }

    pub fn get_visitor(&self, id: VisitorId) -> ApiResponse<Visitor> {
        self.call(Ok(self.endpoints.build_get_visitor(id)), LogbookClient::parse_visitor)
    }

    pub fn update_visitor(&self, id: VisitorId, input: &NewVisitor) -> ApiResponse<Visitor> {
        self.call(self.endpoints.build_update_visitor(id, input), LogbookClient::parse_visitor)
    }

    pub fn delete_visitor(&self, id: VisitorId) -> ApiResponse<()> {
        self.call(Ok(self.endpoints.build_delete_visitor(id)), LogbookClient::parse_empty)
    }

    pub fn timeout_visitor(&self, id: VisitorId) -> ApiResponse<Visitor> {
        self.call(Ok(self.endpoints.build_timeout_visitor(id)), LogbookClient::parse_visitor)
    }

    pub fn login(&self, credentials: &Credentials) -> ApiResponse<Admin> {
        self.call(self.endpoints.build_login(credentials), LogbookClient::parse_login)
    }

    pub fn logout(&self) -> ApiResponse<()> {
        self.call(Ok(self.endpoints.build_logout()), LogbookClient::parse_empty)
    }

    /// Fetch the dashboard. An unauthenticated session also redirects to the
    /// login location before the failure is handed back.
    pub fn get_admin_panel(&self) -> ApiResponse<AdminPanel> {
        let resp = self.call(Ok(self.endpoints.build_admin_panel()), LogbookClient::parse_admin_panel);
        if resp.is_unauthenticated() {
            info!(location = %self.login_location, "dashboard requires login, redirecting");
            self.navigator.navigate(&self.login_location);
        }
        resp
    }
}

/// The jar holds plain data, so a poisoned lock is still usable.
fn lock(jar: &Mutex<CookieJar>) -> MutexGuard<'_, CookieJar> {
    jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::http::HttpMethod;
    use crate::types::Sex;

    /// Replays canned responses and records every request it sees.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn push(&self, response: Result<HttpResponse, ApiError>) {
            self.responses.borrow_mut().push_back(response);
        }

        fn csrf_hits(&self) -> usize {
            self.seen
                .borrow()
                .iter()
                .filter(|r| r.url.ends_with("/sanctum/csrf-cookie"))
                .count()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            self.responses.borrow_mut().pop_front().unwrap_or_else(|| Ok(json(200, "[]")))
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        visits: RefCell<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, location: &str) {
            self.visits.borrow_mut().push(location.to_string());
        }
    }

    fn json(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    fn csrf_response() -> HttpResponse {
        HttpResponse {
            status: 204,
            headers: vec![
                ("set-cookie".to_string(), "XSRF-TOKEN=tok%3D; path=/".to_string()),
                ("set-cookie".to_string(), "logbook_session=s1; path=/; httponly".to_string()),
            ],
            body: String::new(),
        }
    }

    fn endpoints() -> LogbookClient {
        LogbookClient::new("http://localhost:8000")
    }

    #[test]
    fn csrf_priming_happens_once() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        let client = ApiClient::new(endpoints(), &transport);

        for _ in 0..5 {
            assert!(client.get_visitors().success);
        }
        client.logout();
        client.get_admin_panel();

        assert_eq!(transport.csrf_hits(), 1);
        assert!(client.is_csrf_primed());
    }

    #[test]
    fn requests_carry_token_and_cookies() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        let client = ApiClient::new(endpoints(), &transport);

        client.get_visitors();

        let seen = transport.seen.borrow();
        let req = &seen[1];
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.header("x-xsrf-token"), Some("tok="));
        assert_eq!(req.header("cookie"), Some("XSRF-TOKEN=tok%3D; logbook_session=s1"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("x-requested-with"), Some("XMLHttpRequest"));
    }

    #[test]
    fn rotated_cookies_are_picked_up() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        let mut rotated = json(200, "[]");
        rotated.headers.push(("set-cookie".to_string(), "XSRF-TOKEN=fresh; path=/".to_string()));
        transport.push(Ok(rotated));
        let client = ApiClient::new(endpoints(), &transport);

        client.get_visitors();
        client.get_visitors();

        let seen = transport.seen.borrow();
        assert_eq!(seen[2].header("x-xsrf-token"), Some("fresh"));
    }

    #[test]
    fn transport_failure_is_a_network_error() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Err(ApiError::Transport("connection refused".to_string())));
        let client = ApiClient::new(endpoints(), &transport);

        let resp = client.get_visitors();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Network error occurred"));
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn failed_priming_is_retried_on_next_call() {
        let transport = ScriptedTransport::default();
        transport.push(Err(ApiError::Transport("down".to_string())));
        let client = ApiClient::new(endpoints(), &transport);

        let resp = client.get_visitors();
        assert_eq!(resp.message.as_deref(), Some("Network error occurred"));
        assert!(!client.is_csrf_primed());

        transport.push(Ok(csrf_response()));
        assert!(client.get_visitors().success);
        assert_eq!(transport.csrf_hits(), 2);
    }

    #[test]
    fn priming_failure_status_still_counts() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(json(500, "{}")));
        let client = ApiClient::new(endpoints(), &transport);

        client.get_visitors();
        client.get_visitors();
        assert_eq!(transport.csrf_hits(), 1);
    }

    #[test]
    fn unauthenticated_dashboard_navigates_once() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Ok(json(401, r#"{"message":"Unauthenticated."}"#)));
        let navigator = RecordingNavigator::default();
        let client = ApiClient::with_navigator(endpoints(), &transport, navigator);

        let resp = client.get_admin_panel();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Unauthenticated."));
        assert_eq!(*client.navigator().visits.borrow(), vec!["/adminLogin".to_string()]);
    }

    #[test]
    fn other_dashboard_failures_do_not_navigate() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Ok(json(500, r#"{"message":"Server Error"}"#)));
        let client = ApiClient::with_navigator(endpoints(), &transport, RecordingNavigator::default())
            .login_location("/login");

        let resp = client.get_admin_panel();
        assert!(!resp.success);
        assert!(client.navigator().visits.borrow().is_empty());
    }

    #[test]
    fn unauthenticated_elsewhere_does_not_navigate() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Ok(json(401, r#"{"message":"Unauthenticated."}"#)));
        let client = ApiClient::with_navigator(endpoints(), &transport, RecordingNavigator::default());

        let resp = client.delete_visitor(4);
        assert!(resp.is_unauthenticated());
        assert!(client.navigator().visits.borrow().is_empty());
    }

    #[test]
    fn saved_cookies_are_sent_with_priming() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        }));
        let mut jar = CookieJar::new();
        jar.insert("logbook_session", "saved");
        jar.insert("XSRF-TOKEN", "old");
        let client = ApiClient::new(endpoints(), &transport).cookies(jar);

        client.get_visitors();

        let seen = transport.seen.borrow();
        assert_eq!(seen[0].header("cookie"), Some("XSRF-TOKEN=old; logbook_session=saved"));
        assert_eq!(seen[1].header("x-xsrf-token"), Some("old"));
    }

    #[test]
    fn list_returns_backend_array_unchanged() {
        let body = r#"[
            {"id":1,"firstname":"Ada","lastname":"Lovelace","age":36,"sex":"Female",
             "contact_number":"1","purpose_of_visit":"Demo",
             "created_at":"2024-05-01T08:30:00Z","updated_at":"2024-05-01T08:30:00Z","time_out":null},
            {"id":2,"firstname":"Alan","middlename":"M","lastname":"Turing","age":41,"sex":"Male",
             "contact_number":"2","purpose_of_visit":"Talk",
             "created_at":"2024-05-01T09:00:00Z","updated_at":"2024-05-01T10:00:00Z",
             "time_out":"2024-05-01T10:00:00Z"}
        ]"#;
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Ok(json(200, body)));
        let client = ApiClient::new(endpoints(), &transport);

        let resp = client.get_visitors();
        let expected: Vec<Visitor> = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data, Some(expected));
    }

    #[test]
    fn list_accepts_sex_from_the_relationship() {
        let body = r#"[
            {"id":1,"firstname":"Ada","lastname":"Lovelace","age":36,"sex_id":2,
             "sexes":[{"id":2,"sex":"Female"}],
             "contact_number":"1","purpose_of_visit":"Demo",
             "created_at":"2024-05-01T08:30:00Z","updated_at":"2024-05-01T08:30:00Z","time_out":null},
            {"id":2,"firstname":"Alan","lastname":"Turing","age":41,"sex":"Male",
             "contact_number":"2","purpose_of_visit":"Talk",
             "created_at":"2024-05-01T09:00:00Z","updated_at":"2024-05-01T09:00:00Z"}
        ]"#;
        let transport = ScriptedTransport::default();
        transport.push(Ok(csrf_response()));
        transport.push(Ok(json(200, body)));
        let client = ApiClient::new(endpoints(), &transport);

        let resp = client.get_visitors();

        assert!(resp.success, "{:?}", resp.message);
        let visitors = resp.data.unwrap();
        assert_eq!(visitors[0].sex(), Some(Sex::Female));
        assert_eq!(visitors[0].sex_id, Some(2));
        assert_eq!(visitors[1].sex(), Some(Sex::Male));
    }
}
