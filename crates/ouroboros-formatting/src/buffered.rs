//! Adapter exposing a blocking formatter through the async contract
//!
//! [`Buffered`] wraps a [`BufferedMediaTypeFormatter`] and is the only place
//! in the engine where a runtime worker thread may block. On a multi-thread
//! runtime the blocking formatter runs under `block_in_place`, talking to the
//! async stream through a [`SyncIoBridge`]. A current-thread runtime cannot
//! block in place, so the body is staged in memory instead.

use crate::config::FormattingConfig;
use crate::content::TransportContext;
use crate::error::{FormattingError, FormattingResult};
use crate::formatter::{default_value_for_type, FormatterSettings, MediaTypeFormatter};
use crate::headers::ContentHeaders;
use crate::logger::FormatterLogger;
use crate::stream::NonClosingStream;
use crate::types::{TypeDescriptor, Value};
use async_trait::async_trait;
use std::any::Any;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;

/// Default buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// A formatter written against blocking `Read`/`Write`
pub trait BufferedMediaTypeFormatter: Send + Sync {
    fn name(&self) -> &str;

    fn settings(&self) -> &FormatterSettings;

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool;

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool;

    /// Serialize `value` into a buffered `stream`
    fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        _value: Option<&Value>,
        _stream: &mut dyn Write,
        _headers: &ContentHeaders,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        Err(FormattingError::NotSupported(format!(
            "The media type formatter of type '{}' does not support writing synchronously because it does not implement the write_to_stream method.",
            self.name()
        )))
    }

    /// Deserialize a value of `ty` from a buffered `stream`
    fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        _stream: &mut dyn Read,
        _headers: &ContentHeaders,
        _logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        Err(FormattingError::NotSupported(format!(
            "The media type formatter of type '{}' does not support reading synchronously because it does not implement the read_from_stream method.",
            self.name()
        )))
    }
}

/// Async [`MediaTypeFormatter`] backed by a blocking formatter
#[derive(Debug)]
pub struct Buffered<F> {
    inner: F,
    buffer_size: usize,
}

impl<F: BufferedMediaTypeFormatter> Buffered<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Take the buffer size from `config`
    pub fn with_config(inner: F, config: &FormattingConfig) -> Self {
        Self::new(inner).with_buffer_size(config.buffer_size)
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Set the buffer size; negative sizes are rejected
    pub fn set_buffer_size(&mut self, value: i64) -> FormattingResult<()> {
        self.buffer_size = usize::try_from(value).map_err(|_| FormattingError::ArgumentOutOfRange {
            param: "value",
            value,
            min: 0,
        })?;
        Ok(())
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    /// A zero-capacity `BufReader` reports EOF from `fill_buf`
    fn read_capacity(&self) -> usize {
        self.buffer_size.max(1)
    }

    /// Run the blocking formatter, turning a panic into a formatter error
    fn guarded<R>(&self, f: impl FnOnce() -> FormattingResult<R>) -> FormattingResult<R> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(formatter = %self.inner.name(), "Blocking formatter panicked: {}", message);
                Err(FormattingError::Formatter(format!(
                    "formatter '{}' panicked: {}",
                    self.inner.name(),
                    message
                )))
            }
        }
    }

    fn write_buffered<W: Write>(
        &self,
        destination: W,
        ty: &TypeDescriptor,
        value: Option<&Value>,
        headers: &ContentHeaders,
        cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        let mut writer = BufWriter::with_capacity(self.buffer_size, destination);
        let result = self.guarded(|| {
            self.inner
                .write_to_stream(ty, value, &mut writer, headers, cancel)
        });
        // Flush whatever was buffered, even when the formatter failed
        let flushed = writer.flush();
        result?;
        flushed?;
        Ok(())
    }

    fn read_buffered<R: Read>(
        &self,
        source: R,
        ty: &TypeDescriptor,
        headers: &ContentHeaders,
        logger: Option<&dyn FormatterLogger>,
        cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        let mut reader = BufReader::with_capacity(self.read_capacity(), source);
        self.guarded(|| {
            self.inner
                .read_from_stream(ty, &mut reader, headers, logger, cancel)
        })
    }
}

/// Handle of the current runtime when it can block in place
fn multi_thread_handle() -> Option<Handle> {
    Handle::try_current()
        .ok()
        .filter(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[async_trait]
impl<F: BufferedMediaTypeFormatter> MediaTypeFormatter for Buffered<F> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn settings(&self) -> &FormatterSettings {
        self.inner.settings()
    }

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool {
        self.inner.can_read_type(ty)
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        self.inner.can_write_type(ty)
    }

    async fn read_from_stream(
        &self,
        ty: &TypeDescriptor,
        stream: &mut (dyn AsyncRead + Unpin + Send),
        headers: &ContentHeaders,
        logger: Option<&dyn FormatterLogger>,
        cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        if headers.content_length == Some(0) {
            tracing::debug!(formatter = %self.name(), ty = %ty, "Empty body, using default value");
            return Ok(default_value_for_type(ty));
        }

        match multi_thread_handle() {
            Some(handle) => tokio::task::block_in_place(|| {
                let bridge = SyncIoBridge::new_with_handle(NonClosingStream::new(stream), handle);
                self.read_buffered(bridge, ty, headers, logger, cancel)
            }),
            None => {
                tracing::debug!(formatter = %self.name(), "No multi-thread runtime, staging request body in memory");
                let mut staged = Vec::new();
                stream.read_to_end(&mut staged).await?;
                self.read_buffered(Cursor::new(staged), ty, headers, logger, cancel)
            }
        }
    }

    async fn write_to_stream(
        &self,
        ty: &TypeDescriptor,
        value: Option<&Value>,
        stream: &mut (dyn AsyncWrite + Unpin + Send),
        headers: &ContentHeaders,
        _transport: Option<&TransportContext>,
        cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        match multi_thread_handle() {
            Some(handle) => tokio::task::block_in_place(|| {
                let bridge = SyncIoBridge::new_with_handle(NonClosingStream::new(stream), handle);
                self.write_buffered(bridge, ty, value, headers, cancel)
            }),
            None => {
                tracing::debug!(formatter = %self.name(), "No multi-thread runtime, staging response body in memory");
                let mut staged = Vec::new();
                self.write_buffered(&mut staged, ty, value, headers, cancel)?;
                let mut destination = NonClosingStream::new(stream);
                destination.write_all(&staged).await?;
                destination.flush().await?;
                Ok(())
            }
        }
    }
}
