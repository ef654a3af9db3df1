//! Formatting error types and handling

use crate::media_type::MediaType;
use thiserror::Error;

/// Errors raised while negotiating, reading or writing typed content
#[derive(Error, Debug)]
pub enum FormattingError {
    /// An argument failed validation (configuration error)
    #[error("{message} (Parameter '{param}')")]
    Argument {
        /// Name of the offending parameter
        param: &'static str,
        /// Human readable reason
        message: String,
    },

    /// A numeric argument was below its allowed minimum
    #[error("Value must be greater than or equal to {min}. (Parameter '{param}', actual value {value})")]
    ArgumentOutOfRange {
        param: &'static str,
        value: i64,
        min: i64,
    },

    /// The operation is not valid for the current configuration
    #[error("{0}")]
    InvalidOperation(String),

    /// The formatter does not implement the requested direction
    #[error("{0}")]
    NotSupported(String),

    /// No formatter can read the requested type from the given media type
    #[error(
        "No MediaTypeFormatter is available to read an object of type '{type_name}' from content with media type '{essence}'.",
        essence = .media_type.essence()
    )]
    UnsupportedMediaType {
        type_name: String,
        media_type: MediaType,
    },

    /// A value could not be converted to the requested type
    #[error("Unable to cast object of type '{actual}' to type '{expected}'.")]
    InvalidCast { expected: String, actual: String },

    /// The operation was cancelled through its cancellation token
    #[error("The operation was canceled.")]
    Cancelled,

    /// A blocking formatter failed (error or panic) inside the buffered adapter
    #[error("Formatter error: {0}")]
    Formatter(String),

    /// Stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for formatting operations
pub type FormattingResult<T> = Result<T, FormattingError>;

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormattingErrorCategory {
    /// Fail-fast setup errors, never retried
    Configuration,
    /// No formatter matched the type and media type
    Negotiation,
    /// Errors raised by a formatter or its stream
    Io,
    /// Cooperative cancellation
    Cancellation,
}

impl FormattingError {
    pub(crate) fn argument(param: &'static str, message: impl Into<String>) -> Self {
        FormattingError::Argument {
            param,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported_media_type(type_name: &str, media_type: &MediaType) -> Self {
        FormattingError::UnsupportedMediaType {
            type_name: type_name.to_string(),
            media_type: media_type.clone(),
        }
    }

    /// Categorize the error for reporting
    pub fn category(&self) -> FormattingErrorCategory {
        match self {
            FormattingError::Argument { .. }
            | FormattingError::ArgumentOutOfRange { .. }
            | FormattingError::InvalidOperation(_)
            | FormattingError::NotSupported(_) => FormattingErrorCategory::Configuration,
            FormattingError::UnsupportedMediaType { .. } => FormattingErrorCategory::Negotiation,
            FormattingError::InvalidCast { .. }
            | FormattingError::Formatter(_)
            | FormattingError::Io(_) => FormattingErrorCategory::Io,
            FormattingError::Cancelled => FormattingErrorCategory::Cancellation,
        }
    }

    /// Name of the parameter that caused an argument error
    pub fn param_name(&self) -> Option<&'static str> {
        match self {
            FormattingError::Argument { param, .. }
            | FormattingError::ArgumentOutOfRange { param, .. } => Some(*param),
            _ => None,
        }
    }

    /// The media type carried by an unsupported media type error
    pub fn media_type(&self) -> Option<&MediaType> {
        match self {
            FormattingError::UnsupportedMediaType { media_type, .. } => Some(media_type),
            _ => None,
        }
    }

    /// True for cancellation outcomes
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FormattingError::Cancelled)
    }
}
