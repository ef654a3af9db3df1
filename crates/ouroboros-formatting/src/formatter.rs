//! The formatter contract
//!
//! A formatter declares which types it can read and write, which media types
//! and encodings it supports, and performs the actual (de)serialization
//! against an async stream. Formatters must never close the stream they are
//! handed; streams are passed as `&mut` borrows so they cannot be dropped,
//! and wrapping them in [`NonClosingStream`](crate::stream::NonClosingStream)
//! keeps `shutdown` from reaching the caller's stream.

use crate::content::TransportContext;
use crate::encoding::Encoding;
use crate::error::{FormattingError, FormattingResult};
use crate::headers::ContentHeaders;
use crate::logger::FormatterLogger;
use crate::media_type::MediaType;
use crate::types::{TypeDescriptor, Value};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Supported Media Types
// ============================================================================

/// Ordered list of concrete media types; media ranges are rejected
#[derive(Debug, Clone, Default)]
pub struct SupportedMediaTypes {
    items: Vec<MediaType>,
}

impl SupportedMediaTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a media type
    pub fn push(&mut self, item: MediaType) -> FormattingResult<()> {
        validate_media_type(&item)?;
        self.items.push(item);
        Ok(())
    }

    /// Insert a media type at `index`; `index` may equal the length
    pub fn insert(&mut self, index: usize, item: MediaType) -> FormattingResult<()> {
        validate_media_type(&item)?;
        if index > self.items.len() {
            return Err(FormattingError::argument(
                "index",
                format!("Index {} is out of range.", index),
            ));
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Replace the entry at `index`, returning the previous one
    pub fn set(&mut self, index: usize, item: MediaType) -> FormattingResult<MediaType> {
        validate_media_type(&item)?;
        let slot = self.items.get_mut(index).ok_or_else(|| {
            FormattingError::argument("index", format!("Index {} is out of range.", index))
        })?;
        Ok(std::mem::replace(slot, item))
    }

    pub fn remove(&mut self, index: usize) -> Option<MediaType> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn first(&self) -> Option<&MediaType> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&MediaType> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaType> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a SupportedMediaTypes {
    type Item = &'a MediaType;
    type IntoIter = std::slice::Iter<'a, MediaType>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn validate_media_type(item: &MediaType) -> FormattingResult<()> {
    if item.is_range() {
        return Err(FormattingError::argument(
            "item",
            format!(
                "The 'MediaType' of '{}' cannot be used as a supported media type because it is a media range.",
                item.essence()
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// Formatter Settings
// ============================================================================

/// Media types and encodings a formatter advertises.
///
/// Settings are configured while the formatter is still owned; once it is
/// shared through an `Arc` they are read-only.
#[derive(Debug, Clone, Default)]
pub struct FormatterSettings {
    supported_media_types: SupportedMediaTypes,
    supported_encodings: Vec<Encoding>,
}

impl FormatterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SupportedMediaTypes::push`]
    pub fn with_media_type(mut self, media_type: MediaType) -> FormattingResult<Self> {
        self.supported_media_types.push(media_type)?;
        Ok(self)
    }

    /// Add an encoding unless it is already present
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        if !self.supported_encodings.contains(&encoding) {
            self.supported_encodings.push(encoding);
        }
        self
    }

    pub fn supported_media_types(&self) -> &SupportedMediaTypes {
        &self.supported_media_types
    }

    pub fn supported_media_types_mut(&mut self) -> &mut SupportedMediaTypes {
        &mut self.supported_media_types
    }

    pub fn supported_encodings(&self) -> &[Encoding] {
        &self.supported_encodings
    }

    pub fn supported_encodings_mut(&mut self) -> &mut Vec<Encoding> {
        &mut self.supported_encodings
    }
}

// ============================================================================
// MediaTypeFormatter
// ============================================================================

/// Serializes and deserializes typed values for a set of media types
#[async_trait]
pub trait MediaTypeFormatter: Send + Sync {
    /// Formatter name used in error messages
    fn name(&self) -> &str;

    /// Supported media types and encodings
    fn settings(&self) -> &FormatterSettings;

    /// Whether this formatter can deserialize values of `ty`
    fn can_read_type(&self, ty: &TypeDescriptor) -> bool;

    /// Whether this formatter can serialize values of `ty`
    fn can_write_type(&self, ty: &TypeDescriptor) -> bool;

    fn supported_media_types(&self) -> &SupportedMediaTypes {
        self.settings().supported_media_types()
    }

    fn supported_encodings(&self) -> &[Encoding] {
        self.settings().supported_encodings()
    }

    /// Deserialize a value of `ty` from `stream`. Must not close the stream.
    async fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        _stream: &mut (dyn AsyncRead + Unpin + Send),
        _headers: &ContentHeaders,
        _logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        Err(FormattingError::NotSupported(format!(
            "The media type formatter of type '{}' does not support reading because it does not implement the read_from_stream method.",
            self.name()
        )))
    }

    /// Serialize `value` as `ty` into `stream`. Must not close the stream.
    async fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        _value: Option<&Value>,
        _stream: &mut (dyn AsyncWrite + Unpin + Send),
        _headers: &ContentHeaders,
        _transport: Option<&TransportContext>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        Err(FormattingError::NotSupported(format!(
            "The media type formatter of type '{}' does not support writing because it does not implement the write_to_stream method.",
            self.name()
        )))
    }

    /// Pick the encoding for a body: the supported encoding named by the
    /// `charset` parameter, else the first supported encoding.
    fn select_character_encoding(
        &self,
        headers: Option<&ContentHeaders>,
    ) -> FormattingResult<Encoding> {
        let encodings = self.supported_encodings();

        let requested = headers
            .and_then(|headers| headers.content_type.as_ref())
            .and_then(MediaType::charset)
            .and_then(|charset| encodings.iter().find(|enc| enc.matches_charset(charset)));

        requested.or_else(|| encodings.first()).cloned().ok_or_else(|| {
            FormattingError::InvalidOperation(format!(
                "No encoding found for media type formatter '{}'. There must be at least one supported encoding registered in order for the media type formatter to read or write content.",
                self.name()
            ))
        })
    }

    /// Fill in `Content-Type` for content written by this formatter.
    ///
    /// An explicit `media_type` wins; otherwise an unset content type falls
    /// back to the first supported media type. A content type without a
    /// charset then gets the first supported encoding.
    fn set_default_content_headers(
        &self,
        _ty: &TypeDescriptor,
        headers: &mut ContentHeaders,
        media_type: Option<&MediaType>,
    ) {
        if let Some(media_type) = media_type {
            headers.content_type = Some(media_type.clone());
        }

        if headers.content_type.is_none() {
            headers.content_type = self.supported_media_types().first().cloned();
        }

        if let Some(content_type) = headers.content_type.as_mut() {
            if content_type.parameter("charset").is_none() {
                if let Some(encoding) = self.supported_encodings().first() {
                    content_type.set_charset(Some(encoding.web_name()));
                }
            }
        }
    }
}

/// Default value for `ty`: `T::default()` for value types, `None` otherwise
pub fn default_value_for_type(ty: &TypeDescriptor) -> Option<Value> {
    ty.default_value()
}
