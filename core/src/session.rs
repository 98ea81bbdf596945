//! Cookie jar carrying the backend session and its CSRF token.
//!
//! Only name/value pairs are tracked. Domain and path attributes are ignored
//! because the jar only ever talks to one backend. A cookie that is already
//! expired (`Max-Age` of zero or less, or an `Expires` in the past) or has an
//! empty value removes the stored one. Values are kept percent-encoded as the
//! server sent them.

use std::collections::BTreeMap;

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::http::{HttpRequest, HttpResponse};

pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "x-xsrf-token";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Apply one `Set-Cookie` header value.
    pub fn store(&mut self, set_cookie: &str) {
        let cookie = match Cookie::parse(set_cookie) {
            Ok(cookie) => cookie,
            Err(err) => {
                trace!(%err, "ignoring malformed cookie");
                return;
            }
        };
        let name = cookie.name();
        let value = cookie.value().trim_matches('"');

        // Max-Age wins over Expires when both are present.
        let expired = match cookie.max_age() {
            Some(age) => age.whole_seconds() <= 0,
            None => cookie
                .expires_datetime()
                .is_some_and(|at| at <= OffsetDateTime::now_utc()),
        };

        if expired || value.is_empty() {
            trace!(cookie = name, "dropping cookie");
            self.cookies.remove(name);
        } else {
            trace!(cookie = name, "storing cookie");
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    /// Absorb every `Set-Cookie` header of a response.
    pub fn absorb(&mut self, response: &HttpResponse) {
        for value in response.header_values("set-cookie") {
            self.store(value);
        }
    }

    /// The CSRF token, URL-decoded the way the backend encoded it.
    pub fn xsrf_token(&self) -> Option<String> {
        let raw = self.get(XSRF_COOKIE)?;
        match urlencoding::decode(raw) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(_) => Some(raw.to_string()),
        }
    }

    /// Value for a `Cookie` request header, or `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| Cookie::new(name.as_str(), value.as_str()).stripped().to_string())
            .collect();
        Some(pairs.join("; "))
    }

    /// Attach session cookies and the CSRF header to an outgoing request.
    ///
    /// The CSRF header is always present, empty when no token is known yet.
    pub fn decorate(&self, request: &mut HttpRequest) {
        if let Some(cookie) = self.header_value() {
            request.set_header("cookie", cookie);
        }
        request.set_header(XSRF_HEADER, self.xsrf_token().unwrap_or_default());
    }
}
