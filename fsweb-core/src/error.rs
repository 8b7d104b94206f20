//! Domain-specific error types for the surface-fitting client.
//!
//! All fallible operations return `Result<T, FsError>`.
//! "Not found" is not an error: fits return `Ok(None)` for it.

use thiserror::Error;

/// The canonical error type for fit requests and their supporting I/O.
#[derive(Debug, Error)]
pub enum FsError {
    // ── Request Errors ───────────────────────────────────────────
    /// The request could not be sent or the exchange failed.
    #[error("request error: {0}")]
    Request(String),

    /// The exchange finished without any response.
    #[error("no response received")]
    NoResponse,

    /// The service answered with a status other than 200.
    #[error("unexpected status code: {0}")]
    StatusCode(u16),

    /// The response carried an unexpected content type.
    #[error("invalid content type: {0:?}")]
    InvalidContentType(String),

    /// The response had no body.
    #[error("missing response body")]
    NoResponseBody,

    // ── Protocol Errors ──────────────────────────────────────────
    /// The response body failed magic/version or length validation.
    #[error("invalid response body")]
    InvalidResponseBody,

    /// The response result code is outside 0-5.
    #[error("unknown result code: {0}")]
    UnknownResultCode(i32),

    /// A request header field or point buffer description is inconsistent.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    // ── Session Errors ───────────────────────────────────────────
    /// A fit was triggered while another one is still running.
    #[error("a fit request is already running")]
    Busy,

    /// Search parameters failed validation.
    #[error("invalid search parameters: {0}")]
    InvalidParams(&'static str),

    // ── I/O and Configuration ────────────────────────────────────
    /// A point file line could not be parsed.
    #[error("invalid point file at line {line}")]
    InvalidPointFile { line: usize },

    /// File-system I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be encoded or decoded.
    #[error("config error: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl From<String> for FsError {
    fn from(s: String) -> Self {
        FsError::Other(s)
    }
}

impl From<&str> for FsError {
    fn from(s: &str) -> Self {
        FsError::Other(s.to_string())
    }
}

impl From<toml::de::Error> for FsError {
    fn from(e: toml::de::Error) -> Self {
        FsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for FsError {
    fn from(e: toml::ser::Error) -> Self {
        FsError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for FsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FsError::NoResponse
        } else if e.is_body() || e.is_decode() {
            FsError::NoResponseBody
        } else {
            FsError::Request(e.to_string())
        }
    }
}
