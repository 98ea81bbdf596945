//! API client core for the visitor logbook service.
//!
//! # Overview
//! Builds `HttpRequest` values and normalizes `HttpResponse` values for every
//! backend endpoint, and layers the backend's cookie session and CSRF
//! handshake on top through `ApiClient`. The host supplies the actual HTTP
//! transport.
//!
//! # Design
//! - `LogbookClient` is stateless: `build_*` produces a request, `parse_*`
//!   turns a response into an `ApiResponse`.
//! - `ApiClient` owns the cookie jar and the once-per-client CSRF priming
//!   flag, and redirects through a `Navigator` when the admin dashboard
//!   reports an unauthenticated session.
//! - Filtering, form validation and notification building are plain
//!   functions over the DTOs so every front end shares them.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod error;
pub mod filter;
pub mod http;
pub mod notify;
pub mod response;
pub mod session;
pub mod types;
pub mod validation;

pub use api::{ApiClient, LogNavigator, Navigator, Transport};
pub use client::LogbookClient;
pub use error::{ApiError, FilterError, SexError};
pub use filter::{StatusFilter, VisitorFilter, VisitorStats};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notify::{Level, Notification};
pub use response::{ApiResponse, FieldErrors};
pub use session::CookieJar;
pub use types::{Admin, AdminPanel, Credentials, NewVisitor, Sex, SexRecord, Visitor, VisitorId};
pub use validation::VisitorDraft;
