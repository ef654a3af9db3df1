//! Formatting engine configuration

use crate::buffered::DEFAULT_BUFFER_SIZE;
use crate::error::{FormattingError, FormattingResult};
use crate::media_type::MediaType;
use std::env;

const ENV_BUFFER_SIZE: &str = "OUROBOROS_FORMATTING_BUFFER_SIZE";
const ENV_DEFAULT_MEDIA_TYPE: &str = "OUROBOROS_FORMATTING_DEFAULT_MEDIA_TYPE";

/// Configuration shared by the content reader and buffered formatters
#[derive(Debug, Clone, PartialEq)]
pub struct FormattingConfig {
    /// Buffer size for blocking formatters, in bytes
    pub buffer_size: usize,

    /// Media type assumed when content carries no `Content-Type`
    pub default_media_type: MediaType,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            default_media_type: MediaType::octet_stream(),
        }
    }
}

impl FormattingConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for unset variables
    pub fn from_env() -> FormattingResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FormattingResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BUFFER_SIZE) {
            let size = raw.trim().parse::<i64>().map_err(|_| {
                FormattingError::argument(
                    "buffer_size",
                    format!("{} must be an integer, got '{}'", ENV_BUFFER_SIZE, raw),
                )
            })?;
            config.buffer_size = usize::try_from(size).map_err(|_| {
                FormattingError::ArgumentOutOfRange {
                    param: "buffer_size",
                    value: size,
                    min: 0,
                }
            })?;
        }

        if let Some(raw) = lookup(ENV_DEFAULT_MEDIA_TYPE) {
            config.default_media_type = MediaType::parse(&raw)?;
        }

        Ok(config)
    }

    /// Set the buffer size for blocking formatters
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the media type assumed for content without a `Content-Type`
    pub fn default_media_type(mut self, media_type: MediaType) -> Self {
        self.default_media_type = media_type;
        self
    }
}
