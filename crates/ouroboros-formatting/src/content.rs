//! HTTP entity bodies: typed object content and raw bytes

use crate::error::{FormattingError, FormattingResult};
use crate::formatter::MediaTypeFormatter;
use crate::headers::ContentHeaders;
use crate::media_type::MediaType;
use crate::types::{TypeDescriptor, Typed, Value};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Connection details handed to formatters while writing
#[derive(Debug, Clone, Default)]
pub struct TransportContext {
    /// Target URL of the request, when known
    pub remote_url: Option<String>,
    /// Whether the connection is TLS protected
    pub secure: bool,
}

// ============================================================================
// HttpContent
// ============================================================================

/// An HTTP entity body together with its content headers
#[async_trait]
pub trait HttpContent: Send + Sync {
    fn headers(&self) -> &ContentHeaders;

    fn headers_mut(&mut self) -> &mut ContentHeaders;

    /// Write the body into `stream` without closing it
    async fn serialize_to_stream(
        &self,
        stream: &mut (dyn AsyncWrite + Unpin + Send),
        transport: Option<&TransportContext>,
        cancel: &CancellationToken,
    ) -> FormattingResult<()>;

    /// Body length if it is known without serializing
    fn try_compute_length(&self) -> Option<u64>;

    /// `Content-Length` header, else the computed length
    fn content_length(&self) -> Option<u64> {
        self.headers()
            .content_length
            .or_else(|| self.try_compute_length())
    }

    /// Body as a readable stream
    async fn read_as_stream(
        &self,
        cancel: &CancellationToken,
    ) -> FormattingResult<Box<dyn AsyncRead + Unpin + Send>> {
        let mut buffer = Vec::new();
        self.serialize_to_stream(&mut buffer, None, cancel).await?;
        Ok(Box::new(Cursor::new(buffer)))
    }

    /// Downcast hook for the typed-content fast path
    fn as_object_content(&self) -> Option<&ObjectContent> {
        None
    }
}

// ============================================================================
// ObjectContent
// ============================================================================

/// A typed value paired with the formatter that will serialize it.
///
/// The declared type, the value and the formatter are kept consistent: the
/// formatter must be able to write the declared type, a non-nullable type
/// rejects `None`, and a present value must be assignable to the type.
pub struct ObjectContent {
    object_type: TypeDescriptor,
    value: Option<Value>,
    formatter: Arc<dyn MediaTypeFormatter>,
    headers: ContentHeaders,
}

impl ObjectContent {
    /// Create typed content. `media_type`, when given, becomes the
    /// `Content-Type`; otherwise the formatter picks its default.
    pub fn new(
        object_type: TypeDescriptor,
        value: Option<Value>,
        formatter: Arc<dyn MediaTypeFormatter>,
        media_type: Option<MediaType>,
    ) -> FormattingResult<Self> {
        if !formatter.can_write_type(&object_type) {
            return Err(FormattingError::InvalidOperation(format!(
                "The configured formatter '{}' cannot write an object of type '{}'.",
                formatter.name(),
                object_type.name()
            )));
        }

        let mut content = Self {
            object_type,
            value: None,
            formatter,
            headers: ContentHeaders::new(),
        };
        content.set_value(value)?;
        content.formatter.set_default_content_headers(
            &content.object_type,
            &mut content.headers,
            media_type.as_ref(),
        );
        Ok(content)
    }

    /// Like [`ObjectContent::new`] with the media type given as a string
    pub fn with_media_type_str(
        object_type: TypeDescriptor,
        value: Option<Value>,
        formatter: Arc<dyn MediaTypeFormatter>,
        media_type: Option<&str>,
    ) -> FormattingResult<Self> {
        let media_type = media_type.map(MediaType::parse).transpose()?;
        Self::new(object_type, value, formatter, media_type)
    }

    /// Typed content whose declared type is `T`
    pub fn from_typed<T: Typed>(
        value: T,
        formatter: Arc<dyn MediaTypeFormatter>,
        media_type: Option<MediaType>,
    ) -> FormattingResult<Self> {
        Self::new(T::type_descriptor(), value.into_value(), formatter, media_type)
    }

    pub fn object_type(&self) -> &TypeDescriptor {
        &self.object_type
    }

    pub fn formatter(&self) -> &Arc<dyn MediaTypeFormatter> {
        &self.formatter
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Replace the value, applying the same checks as construction
    pub fn set_value(&mut self, value: Option<Value>) -> FormattingResult<()> {
        match &value {
            None if !self.object_type.is_nullable() => {
                return Err(FormattingError::InvalidOperation(format!(
                    "The 'ObjectContent' type cannot accept a null value for the value type '{}'.",
                    self.object_type.name()
                )));
            }
            Some(value) if !self.object_type.is_instance(value) => {
                return Err(FormattingError::argument(
                    "value",
                    format!(
                        "An object of type '{}' cannot be used with a type parameter of '{}'.",
                        value.type_name(),
                        self.object_type.name()
                    ),
                ));
            }
            _ => {}
        }
        self.value = value;
        Ok(())
    }

    /// The value converted back to `T`
    pub fn typed_value<T: Typed>(&self) -> FormattingResult<T> {
        T::from_value(self.value.clone())
    }
}

impl fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContent")
            .field("object_type", &self.object_type)
            .field("value", &self.value)
            .field("formatter", &self.formatter.name())
            .field("headers", &self.headers)
            .finish()
    }
}

#[async_trait]
impl HttpContent for ObjectContent {
    fn headers(&self) -> &ContentHeaders {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut ContentHeaders {
        &mut self.headers
    }

    async fn serialize_to_stream(
        &self,
        stream: &mut (dyn AsyncWrite + Unpin + Send),
        transport: Option<&TransportContext>,
        cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        self.formatter
            .write_to_stream(
                &self.object_type,
                self.value.as_ref(),
                stream,
                &self.headers,
                transport,
                cancel,
            )
            .await
    }

    fn try_compute_length(&self) -> Option<u64> {
        None
    }

    fn as_object_content(&self) -> Option<&ObjectContent> {
        Some(self)
    }
}

// ============================================================================
// BytesContent
// ============================================================================

/// An in-memory body
#[derive(Debug, Clone, Default)]
pub struct BytesContent {
    body: Bytes,
    headers: ContentHeaders,
}

impl BytesContent {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            headers: ContentHeaders::new(),
        }
    }

    /// UTF-8 text with `text/plain; charset=utf-8`
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text.into()).with_content_type(MediaType::text().param("charset", "utf-8"))
    }

    pub fn with_content_type(mut self, media_type: MediaType) -> Self {
        self.headers.content_type = Some(media_type);
        self
    }

    pub fn with_headers(mut self, headers: ContentHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

#[async_trait]
impl HttpContent for BytesContent {
    fn headers(&self) -> &ContentHeaders {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut ContentHeaders {
        &mut self.headers
    }

    async fn serialize_to_stream(
        &self,
        stream: &mut (dyn AsyncWrite + Unpin + Send),
        _transport: Option<&TransportContext>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        stream.write_all(&self.body).await?;
        stream.flush().await?;
        Ok(())
    }

    fn try_compute_length(&self) -> Option<u64> {
        Some(self.body.len() as u64)
    }

    async fn read_as_stream(
        &self,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Box<dyn AsyncRead + Unpin + Send>> {
        Ok(Box::new(Cursor::new(self.body.clone())))
    }
}
