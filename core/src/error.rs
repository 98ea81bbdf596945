//! Error types for the logbook API client.
//!
//! # Design
//! Backend failures never surface as `Err`: they are normalized into an
//! `ApiResponse` with `success == false`. `ApiError` covers the cases where no
//! response exists to normalize, either because the request could not be
//! built or because the transport gave up.

use thiserror::Error;

/// Errors produced while building or executing a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport produced no response (connection refused, DNS, TLS...).
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Unknown status filter name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status filter `{0}` (expected all, active or signed-out)")]
pub struct FilterError(pub String);

/// Unknown sex value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sex `{0}` (expected Male or Female)")]
pub struct SexError(pub String);
