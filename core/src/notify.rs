//! User-facing notifications derived from API results.

use std::fmt;

use crate::response::{ApiResponse, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One notification per field/message pair, in field order.
pub fn field_errors(errors: &FieldErrors) -> Vec<Notification> {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| Notification::error(format!("{field}: {message}")))
        })
        .collect()
}

/// The failure message (or `fallback` when the response has none) followed
/// by every field error. Successful responses yield nothing.
pub fn failure<T>(response: &ApiResponse<T>, fallback: &str) -> Vec<Notification> {
    if response.success {
        return Vec::new();
    }
    let headline = response.message.as_deref().filter(|m| !m.is_empty()).unwrap_or(fallback);
    let mut out = vec![Notification::error(headline)];
    out.extend(field_errors(&response.errors));
    out
}
