//! Normalized result record returned by every API operation.
//!
//! # Design
//! Every outcome, including "no response at all", collapses into the same
//! three-part shape: a success flag, an optional payload, and on failure an
//! optional message plus per-field validation errors. Callers never need to
//! match on transport or status details.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::HttpResponse;

/// Field name to validation messages, ordered by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server";
/// Message the backend sends when the session is not authenticated.
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthenticated.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            message: None,
            errors: FieldErrors::new(),
        }
    }

    pub fn failure(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors,
        }
    }

    pub fn network_error() -> Self {
        Self::failure(NETWORK_ERROR_MESSAGE, FieldErrors::new())
    }

    pub fn is_unauthenticated(&self) -> bool {
        !self.success && self.message.as_deref() == Some(UNAUTHENTICATED_MESSAGE)
    }

    /// Keep the failure details, drop any payload type.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
            errors: self.errors,
        }
    }
}

/// Normalize a response whose success payload is JSON of type `T`.
///
/// 204 and non-JSON bodies yield no payload. A JSON success body that does
/// not decode as `T` is reported as a failure.
pub fn normalize<T: DeserializeOwned>(response: &HttpResponse) -> ApiResponse<T> {
    if !response.is_success() {
        return failure_from(response);
    }
    if response.status == 204 || !response.is_json() || response.body.trim().is_empty() {
        return ApiResponse::ok(None);
    }
    match serde_json::from_str::<T>(&response.body) {
        Ok(data) => ApiResponse::ok(Some(data)),
        Err(e) => {
            warn!(status = response.status, error = %e, "response body did not match expected shape");
            ApiResponse::failure(UNEXPECTED_RESPONSE_MESSAGE, FieldErrors::new())
        }
    }
}

/// Normalize a response whose success payload is irrelevant.
pub fn normalize_empty(response: &HttpResponse) -> ApiResponse<()> {
    if response.is_success() {
        ApiResponse::ok(None)
    } else {
        failure_from(response)
    }
}

fn failure_from<T>(response: &HttpResponse) -> ApiResponse<T> {
    let envelope = if response.is_json() && response.status != 204 {
        serde_json::from_str::<serde_json::Value>(&response.body).ok()
    } else {
        None
    };

    let message = envelope
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string();

    let errors = envelope
        .as_ref()
        .and_then(|body| body.get("errors"))
        .and_then(|e| serde_json::from_value::<FieldErrors>(e.clone()).ok())
        .unwrap_or_default();

    ApiResponse::failure(message, errors)
}
