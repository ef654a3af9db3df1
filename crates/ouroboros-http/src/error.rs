//! HTTP error types and handling

use ouroboros_formatting::{FormattingError, FormattingErrorCategory};
use thiserror::Error;

/// HTTP-specific errors
#[derive(Error, Debug)]
pub enum HttpError {
    /// Response could not be interpreted or had an unexpected status
    #[error("Response error: {0}")]
    ResponseError(String),

    /// Body serialization or typed read failed
    #[error("Formatting error: {0}")]
    Formatting(#[from] FormattingError),

    /// Transport error from reqwest
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorCategory {
    /// Connection-related errors (DNS, TCP, TLS)
    Connection,
    /// Timeout errors
    Timeout,
    /// Invalid request construction
    Request,
    /// Response parsing or status errors
    Response,
    /// Redirect errors
    Redirect,
    /// No formatter for the body's type and media type
    Negotiation,
    /// Operation cancelled by the caller
    Cancelled,
    /// Unknown/other errors
    Unknown,
}

impl HttpError {
    /// Categorize the error for reporting
    pub fn category(&self) -> HttpErrorCategory {
        match self {
            HttpError::ResponseError(_) => HttpErrorCategory::Response,
            HttpError::Reqwest(e) => {
                if e.is_connect() {
                    HttpErrorCategory::Connection
                } else if e.is_timeout() {
                    HttpErrorCategory::Timeout
                } else if e.is_redirect() {
                    HttpErrorCategory::Redirect
                } else if e.is_request() {
                    HttpErrorCategory::Request
                } else {
                    HttpErrorCategory::Unknown
                }
            }
            HttpError::Formatting(e) => match e.category() {
                FormattingErrorCategory::Negotiation => HttpErrorCategory::Negotiation,
                FormattingErrorCategory::Cancellation => HttpErrorCategory::Cancelled,
                FormattingErrorCategory::Configuration => HttpErrorCategory::Request,
                FormattingErrorCategory::Io => HttpErrorCategory::Response,
            },
        }
    }

    /// Sanitize error message (remove sensitive info like credentials, internal IPs)
    pub fn sanitized_message(&self) -> String {
        let msg = self.to_string();
        sanitize_error_message(&msg)
    }
}

/// Sanitize error messages by removing sensitive information
fn sanitize_error_message(msg: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static URL_CREDS_RE: OnceLock<Regex> = OnceLock::new();
    static INTERNAL_IP_RE: OnceLock<Regex> = OnceLock::new();
    static AUTH_HEADER_RE: OnceLock<Regex> = OnceLock::new();

    let url_creds_re = URL_CREDS_RE
        .get_or_init(|| Regex::new(r"https?://[^@:]+:[^@]+@").expect("valid regex"));
    let internal_ip_re = INTERNAL_IP_RE.get_or_init(|| {
        Regex::new(r"\b(10\.|172\.(1[6-9]|2[0-9]|3[01])\.|192\.168\.)\d+\.\d+\b")
            .expect("valid regex")
    });
    let auth_header_re = AUTH_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)(authorization:\s*bearer|bearer|api[_-]?key|token)\s*[:=]?\s*\S+")
            .expect("valid regex")
    });

    let sanitized = url_creds_re.replace_all(msg, "https://[REDACTED]@");
    let sanitized = internal_ip_re.replace_all(&sanitized, "[INTERNAL_IP]");
    let sanitized = auth_header_re.replace_all(&sanitized, "$1: [REDACTED]");

    sanitized.to_string()
}
