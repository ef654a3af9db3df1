//! Reading typed values out of HTTP content

use crate::collection::MediaTypeFormatterCollection;
use crate::config::FormattingConfig;
use crate::content::HttpContent;
use crate::error::{FormattingError, FormattingResult};
use crate::formatter::default_value_for_type;
use crate::logger::FormatterLogger;
use crate::media_type::MediaType;
use crate::types::{TypeDescriptor, Typed, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolves a formatter for a body through the registry and deserializes it
#[derive(Clone)]
pub struct ContentReader {
    formatters: Arc<MediaTypeFormatterCollection>,
    logger: Option<Arc<dyn FormatterLogger>>,
    default_media_type: MediaType,
}

impl ContentReader {
    pub fn new(formatters: Arc<MediaTypeFormatterCollection>) -> Self {
        Self::with_config(formatters, &FormattingConfig::default())
    }

    pub fn with_config(formatters: Arc<MediaTypeFormatterCollection>, config: &FormattingConfig) -> Self {
        Self {
            formatters,
            logger: None,
            default_media_type: config.default_media_type.clone(),
        }
    }

    /// Pass `logger` to formatters for model-level errors
    pub fn with_logger(mut self, logger: Arc<dyn FormatterLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn formatters(&self) -> &Arc<MediaTypeFormatterCollection> {
        &self.formatters
    }

    /// Read `content` as a value of `ty`.
    ///
    /// Typed content already holding an instance of `ty` is returned as is.
    /// Otherwise the first formatter able to read `ty` from the content's
    /// media type is used. Empty content with no matching formatter yields
    /// the type's default value.
    pub async fn read_as_value(
        &self,
        content: &dyn HttpContent,
        ty: &TypeDescriptor,
        cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        if let Some(value) = content
            .as_object_content()
            .and_then(|object| object.value())
            .filter(|value| ty.is_instance(value))
        {
            return Ok(Some(value.clone()));
        }

        let media_type = content
            .headers()
            .content_type
            .as_ref()
            .unwrap_or(&self.default_media_type);

        let Some(formatter) = self.formatters.find_reader(ty, media_type) else {
            if content.content_length() == Some(0) {
                tracing::debug!(ty = %ty, media_type = %media_type, "Empty body, using default value");
                return Ok(default_value_for_type(ty));
            }
            return Err(FormattingError::unsupported_media_type(ty.name(), media_type));
        };

        if cancel.is_cancelled() {
            return Err(FormattingError::Cancelled);
        }

        // Formatters see the computed length when the header is absent
        let headers = match (content.headers().content_length, content.content_length()) {
            (None, Some(length)) => {
                let mut headers = content.headers().clone();
                headers.content_length = Some(length);
                Cow::Owned(headers)
            }
            _ => Cow::Borrowed(content.headers()),
        };

        let read = async {
            let mut stream = content.read_as_stream(cancel).await?;
            formatter
                .read_from_stream(ty, &mut *stream, &headers, self.logger.as_deref(), cancel)
                .await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FormattingError::Cancelled),
            result = read => result,
        }
    }

    /// Read `content` as a `T`
    pub async fn read_as<T: Typed>(
        &self,
        content: &dyn HttpContent,
        cancel: &CancellationToken,
    ) -> FormattingResult<T> {
        let value = self
            .read_as_value(content, &T::type_descriptor(), cancel)
            .await?;
        T::from_value(value)
    }
}

impl std::fmt::Debug for ContentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentReader")
            .field("formatters", &self.formatters)
            .field("has_logger", &self.logger.is_some())
            .field("default_media_type", &self.default_media_type)
            .finish()
    }
}
