//! In-memory stand-in for the visitor logbook backend.
//!
//! Reproduces the parts of the real backend's contract the client depends
//! on: cookie sessions, the CSRF cookie handshake (mutating requests without
//! a matching `X-XSRF-TOKEN` get 419), admin authentication (401
//! `Unauthenticated.`), and 422 validation envelopes of the form
//! `{ "message": ..., "errors": { field: [..] } }`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "logbook_session";
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Visitor {
    pub id: u64,
    pub firstname: String,
    pub middlename: Option<String>,
    pub lastname: String,
    pub age: u32,
    pub sex: String,
    pub contact_number: String,
    pub purpose_of_visit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Admin {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visitor form as posted. Every field is optional so that missing fields
/// produce validation errors instead of extractor rejections.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct VisitorInput {
    pub firstname: Option<String>,
    pub middlename: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub contact_number: Option<String>,
    pub purpose_of_visit: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

struct AdminAccount {
    admin: Admin,
    password: String,
}

struct Session {
    csrf_token: String,
    admin_id: Option<u64>,
}

impl Session {
    fn new(admin_id: Option<u64>) -> Self {
        Self {
            // The trailing `=` makes the cookie need URL-decoding, as real tokens do.
            csrf_token: format!("{}=", Uuid::new_v4().simple()),
            admin_id,
        }
    }
}

#[derive(Default)]
struct Store {
    visitors: BTreeMap<u64, Visitor>,
    next_visitor_id: u64,
    admins: Vec<AdminAccount>,
    sessions: HashMap<String, Session>,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    csrf_primes: Arc<AtomicUsize>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Empty visitor log with one administrator using the default credentials.
    pub fn new() -> Self {
        Self::empty().with_admin("Administrator", DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD)
    }

    /// No visitors, no administrators.
    pub fn empty() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store {
                next_visitor_id: 1,
                ..Store::default()
            })),
            csrf_primes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_admin(self, name: &str, email: &str, password: &str) -> Self {
        if let Ok(mut store) = self.store.try_write() {
            let now = Utc::now();
            let id = store.admins.len() as u64 + 1;
            store.admins.push(AdminAccount {
                admin: Admin {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    created_at: now,
                    updated_at: now,
                },
                password: password.to_string(),
            });
        }
        self
    }

    /// Number of `GET /sanctum/csrf-cookie` requests served.
    pub fn csrf_primes(&self) -> usize {
        self.csrf_primes.load(Ordering::SeqCst)
    }
}

pub fn app() -> Router {
    router(AppState::new())
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/visitor", get(list_visitors).post(create_visitor))
        .route("/visitor/{id}", patch(update_visitor).delete(delete_visitor))
        .route("/visitor/{id}/edit", get(edit_visitor))
        .route("/visitor/{id}/timeout", patch(timeout_visitor))
        .route("/auth/adminLogin", post(login))
        .route("/auth/adminLogout", post(logout))
        .route("/admin", get(admin_panel))
        .layer(middleware::from_fn_with_state(state.clone(), verify_csrf));

    Router::new()
        .route("/sanctum/csrf-cookie", get(csrf_cookie))
        .nest("/api", api)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new()).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure rendered as the backend's JSON error envelope.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
    errors: BTreeMap<String, Vec<String>>,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    }

    fn visitor_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Visitor not found.")
    }

    fn csrf_mismatch() -> Self {
        let status = StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN);
        Self::new(status, "CSRF token mismatch.")
    }

    /// 422 whose message is the first error, suffixed with the remaining count.
    fn validation(errors: BTreeMap<String, Vec<String>>) -> Self {
        let all: Vec<&String> = errors.values().flatten().collect();
        let message = match all.len() {
            0 => "The given data was invalid.".to_string(),
            1 => all[0].clone(),
            2 => format!("{} (and 1 more error)", all[0]),
            n => format!("{} (and {} more errors)", all[0], n - 1),
        };
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message,
            errors,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = if self.errors.is_empty() {
            serde_json::json!({ "message": self.message })
        } else {
            serde_json::json!({ "message": self.message, "errors": self.errors })
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| Cookie::split_parse_encoded(v))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE)
}

/// The XSRF cookie stays readable by scripts; the session cookie does not.
fn set_session_cookies(response: &mut Response, id: &str, token: &str) {
    let xsrf = Cookie::build((XSRF_COOKIE, token))
        .path("/")
        .same_site(SameSite::Lax)
        .build();
    let session = Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    for cookie in [xsrf, session] {
        if let Ok(value) = HeaderValue::from_str(&cookie.encoded().to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Replace the caller's session with a fresh one and return its cookies' values.
fn rotate_session(store: &mut Store, headers: &HeaderMap, admin_id: Option<u64>) -> (String, String) {
    if let Some(old) = session_id(headers) {
        store.sessions.remove(&old);
    }
    let id = Uuid::new_v4().to_string();
    let session = Session::new(admin_id);
    let token = session.csrf_token.clone();
    store.sessions.insert(id.clone(), session);
    (id, token)
}

fn authenticated_admin(store: &Store, headers: &HeaderMap) -> Result<u64, ApiFailure> {
    session_id(headers)
        .and_then(|id| store.sessions.get(&id))
        .and_then(|session| session.admin_id)
        .ok_or_else(ApiFailure::unauthenticated)
}

async fn verify_csrf(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(request).await;
    }
    let token = request
        .headers()
        .get("x-xsrf-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let valid = match session_id(request.headers()) {
        Some(id) => state
            .store
            .read()
            .await
            .sessions
            .get(&id)
            .map(|session| !token.is_empty() && session.csrf_token == token)
            .unwrap_or(false),
        None => false,
    };
    if !valid {
        debug!(method = %request.method(), uri = %request.uri(), "rejecting request with bad CSRF token");
        return ApiFailure::csrf_mismatch().into_response();
    }
    next.run(request).await
}

async fn csrf_cookie(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.csrf_primes.fetch_add(1, Ordering::SeqCst);
    let mut store = state.store.write().await;

    let existing = session_id(&headers)
        .and_then(|id| store.sessions.get(&id).map(|s| (id.clone(), s.csrf_token.clone())));
    let (id, token) = match existing {
        Some(found) => found,
        None => rotate_session(&mut store, &headers, None),
    };

    let mut response = StatusCode::NO_CONTENT.into_response();
    set_session_cookies(&mut response, &id, &token);
    response
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct Rules(BTreeMap<String, Vec<String>>);

impl Rules {
    fn fail(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    fn required<'a>(&mut self, field: &str, value: &'a Option<String>) -> Option<&'a str> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.fail(field, format!("The {field} field is required."));
                None
            }
        }
    }

    fn max(&mut self, field: &str, value: Option<&str>, max: usize) {
        if value.map(|v| v.chars().count() > max).unwrap_or(false) {
            self.fail(field, format!("The {field} field must not be greater than {max} characters."));
        }
    }
}

#[derive(Debug)]
struct ValidVisitor {
    firstname: String,
    middlename: Option<String>,
    lastname: String,
    age: u32,
    sex: String,
    contact_number: String,
    purpose_of_visit: String,
}

fn validate_visitor(input: &VisitorInput) -> Result<ValidVisitor, ApiFailure> {
    let mut rules = Rules(BTreeMap::new());

    let firstname = rules.required("firstname", &input.firstname);
    rules.max("firstname", firstname, 255);
    let middlename = input.middlename.as_deref().filter(|m| !m.is_empty());
    rules.max("middlename", middlename, 255);
    let lastname = rules.required("lastname", &input.lastname);
    rules.max("lastname", lastname, 255);

    let age = match input.age {
        None => {
            rules.fail("age", "The age field is required.".to_string());
            None
        }
        Some(age) if age < 1 => {
            rules.fail("age", "The age field must be at least 1.".to_string());
            None
        }
        Some(age) if age > 150 => {
            rules.fail("age", "The age field must not be greater than 150.".to_string());
            None
        }
        Some(age) => u32::try_from(age).ok(),
    };

    let sex = match rules.required("sex", &input.sex) {
        Some(s @ ("Male" | "Female")) => Some(s),
        Some(_) => {
            rules.fail("sex", "The selected sex is invalid.".to_string());
            None
        }
        None => None,
    };

    let contact_number = rules.required("contact_number", &input.contact_number);
    rules.max("contact_number", contact_number, 50);
    let purpose = rules.required("purpose_of_visit", &input.purpose_of_visit);
    rules.max("purpose_of_visit", purpose, 500);

    match (firstname, lastname, age, sex, contact_number, purpose) {
        (Some(f), Some(l), Some(a), Some(s), Some(c), Some(p)) if rules.0.is_empty() => Ok(ValidVisitor {
            firstname: f.to_string(),
            middlename: middlename.map(str::to_string),
            lastname: l.to_string(),
            age: a,
            sex: s.to_string(),
            contact_number: c.to_string(),
            purpose_of_visit: p.to_string(),
        }),
        _ => Err(ApiFailure::validation(rules.0)),
    }
}

// ---------------------------------------------------------------------------
// Visitor routes
// ---------------------------------------------------------------------------

async fn list_visitors(State(state): State<AppState>) -> Json<Vec<Visitor>> {
    let store = state.store.read().await;
    Json(store.visitors.values().cloned().collect())
}

async fn create_visitor(
    State(state): State<AppState>,
    Json(input): Json<VisitorInput>,
) -> Result<(StatusCode, Json<Visitor>), ApiFailure> {
    let valid = validate_visitor(&input)?;
    let mut store = state.store.write().await;
    let id = store.next_visitor_id;
    store.next_visitor_id += 1;
    let now = Utc::now();
    let visitor = Visitor {
        id,
        firstname: valid.firstname,
        middlename: valid.middlename,
        lastname: valid.lastname,
        age: valid.age,
        sex: valid.sex,
        contact_number: valid.contact_number,
        purpose_of_visit: valid.purpose_of_visit,
        created_at: now,
        updated_at: now,
        time_out: None,
    };
    store.visitors.insert(id, visitor.clone());
    info!(visitor_id = id, "visitor registered");
    Ok((StatusCode::CREATED, Json(visitor)))
}

async fn edit_visitor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Visitor>, ApiFailure> {
    let store = state.store.read().await;
    store.visitors.get(&id).cloned().map(Json).ok_or_else(ApiFailure::visitor_not_found)
}

async fn update_visitor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<VisitorInput>,
) -> Result<Json<Visitor>, ApiFailure> {
    let mut store = state.store.write().await;
    let visitor = store.visitors.get_mut(&id).ok_or_else(ApiFailure::visitor_not_found)?;
    let valid = validate_visitor(&input)?;
    visitor.firstname = valid.firstname;
    visitor.middlename = valid.middlename;
    visitor.lastname = valid.lastname;
    visitor.age = valid.age;
    visitor.sex = valid.sex;
    visitor.contact_number = valid.contact_number;
    visitor.purpose_of_visit = valid.purpose_of_visit;
    visitor.updated_at = Utc::now();
    info!(visitor_id = id, "visitor updated");
    Ok(Json(visitor.clone()))
}

async fn delete_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = state.store.write().await;
    let admin = authenticated_admin(&store, &headers)?;
    store.visitors.remove(&id).ok_or_else(ApiFailure::visitor_not_found)?;
    info!(visitor_id = id, admin_id = admin, "visitor deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn timeout_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Visitor>, ApiFailure> {
    let mut store = state.store.write().await;
    let admin = authenticated_admin(&store, &headers)?;
    let visitor = store.visitors.get_mut(&id).ok_or_else(ApiFailure::visitor_not_found)?;
    if visitor.time_out.is_some() {
        return Err(ApiFailure::new(StatusCode::UNPROCESSABLE_ENTITY, "Visitor already signed out."));
    }
    let now = Utc::now();
    visitor.time_out = Some(now);
    visitor.updated_at = now;
    info!(visitor_id = id, admin_id = admin, "visitor signed out");
    Ok(Json(visitor.clone()))
}

// ---------------------------------------------------------------------------
// Admin routes
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginInput>,
) -> Result<Response, ApiFailure> {
    let mut rules = Rules(BTreeMap::new());
    let email = rules.required("email", &input.email).map(str::to_string);
    let password = rules.required("password", &input.password).map(str::to_string);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiFailure::validation(rules.0));
    };

    let mut store = state.store.write().await;
    let admin = store
        .admins
        .iter()
        .find(|account| {
            (account.admin.email.eq_ignore_ascii_case(&email) || account.admin.name == email)
                && account.password == password
        })
        .map(|account| account.admin.clone())
        .ok_or_else(|| ApiFailure::new(StatusCode::UNAUTHORIZED, "Invalid credentials."))?;

    let (id, token) = rotate_session(&mut store, &headers, Some(admin.id));
    info!(admin_id = admin.id, "admin logged in");
    let mut response = Json(admin).into_response();
    set_session_cookies(&mut response, &id, &token);
    Ok(response)
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiFailure> {
    let mut store = state.store.write().await;
    let admin = authenticated_admin(&store, &headers)?;
    let (id, token) = rotate_session(&mut store, &headers, None);
    info!(admin_id = admin, "admin logged out");
    let mut response = StatusCode::NO_CONTENT.into_response();
    set_session_cookies(&mut response, &id, &token);
    Ok(response)
}

#[derive(Serialize)]
struct Dashboard {
    admins: Vec<Admin>,
    visitors: Vec<Visitor>,
}

async fn admin_panel(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiFailure> {
    let store = state.store.read().await;
    authenticated_admin(&store, &headers)?;
    let dashboard = Dashboard {
        admins: store.admins.iter().map(|a| a.admin.clone()).collect(),
        visitors: store.visitors.values().cloned().collect(),
    };
    Ok(Json(dashboard).into_response())
}
