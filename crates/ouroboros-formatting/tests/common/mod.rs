//! Shared fixtures: serde_json backed formatters and instrumented streams

#![allow(dead_code)]

use ouroboros_formatting::{
    async_trait, BufferedMediaTypeFormatter, CancellationToken, ContentHeaders, Encoding,
    FormatterLogger, FormatterSettings, FormattingError, FormattingResult, MediaType,
    MediaTypeFormatter, TransportContext, TypeDescriptor, Value,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

// ============================================================================
// Test Model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: u32,
    pub name: String,
}

impl Widget {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

ouroboros_formatting::impl_typed!(reference: Widget);

pub fn json_settings() -> FormatterSettings {
    FormatterSettings::new()
        .with_media_type(MediaType::json())
        .expect("application/json is not a range")
        .with_encoding(Encoding::UTF8)
        .with_encoding(Encoding::UTF16)
}

fn handles<T: 'static>(ty: &TypeDescriptor) -> bool {
    ty.type_id() == TypeId::of::<T>()
}

// ============================================================================
// Async JSON Formatter
// ============================================================================

/// serde_json formatter for a single type `T`
pub struct JsonFormatter<T> {
    settings: FormatterSettings,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFormatter<T> {
    pub fn new() -> Self {
        Self {
            settings: json_settings(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> MediaTypeFormatter for JsonFormatter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "JsonFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool {
        handles::<T>(ty)
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        handles::<T>(ty)
    }

    async fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        stream: &mut (dyn AsyncRead + Unpin + Send),
        _headers: &ContentHeaders,
        logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut body = Vec::new();
        stream.read_to_end(&mut body).await?;

        match serde_json::from_slice::<T>(&body) {
            Ok(value) => Ok(Some(Value::new(value))),
            Err(err) => match logger {
                Some(logger) => {
                    logger.log_exception("$", &err);
                    Ok(None)
                }
                None => Err(FormattingError::Formatter(err.to_string())),
            },
        }
    }

    async fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        value: Option<&Value>,
        stream: &mut (dyn AsyncWrite + Unpin + Send),
        _headers: &ContentHeaders,
        _transport: Option<&TransportContext>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let body = match value.and_then(|value| value.downcast_ref::<T>()) {
            Some(value) => serde_json::to_vec(value).map_err(|err| FormattingError::Formatter(err.to_string()))?,
            None => b"null".to_vec(),
        };
        stream.write_all(&body).await?;
        Ok(())
    }
}

// ============================================================================
// Blocking JSON Formatter
// ============================================================================

/// Blocking serde_json formatter, meant to be wrapped in `Buffered`
pub struct BlockingJsonFormatter<T> {
    settings: FormatterSettings,
    pub reads: AtomicUsize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BlockingJsonFormatter<T> {
    pub fn new() -> Self {
        Self {
            settings: json_settings(),
            reads: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }
}

impl<T> BufferedMediaTypeFormatter for BlockingJsonFormatter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "BlockingJsonFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool {
        handles::<T>(ty)
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        handles::<T>(ty)
    }

    fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        value: Option<&Value>,
        stream: &mut dyn Write,
        _headers: &ContentHeaders,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        let value = value.and_then(|value| value.downcast_ref::<T>());
        serde_json::to_writer(stream, &value).map_err(|err| FormattingError::Formatter(err.to_string()))
    }

    fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        stream: &mut dyn Read,
        _headers: &ContentHeaders,
        _logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value: T = serde_json::from_reader(stream).map_err(|err| FormattingError::Formatter(err.to_string()))?;
        Ok(Some(Value::new(value)))
    }
}

// ============================================================================
// Misbehaving Formatters
// ============================================================================

/// How a `FaultyFormatter` fails its write
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Write a prefix, then return an error
    ErrorAfterPartialWrite,
    /// Panic inside the blocking writer
    Panic,
}

/// Blocking formatter for `String` that always fails to write
pub struct FaultyFormatter {
    settings: FormatterSettings,
    fault: Fault,
}

impl FaultyFormatter {
    pub fn new(fault: Fault) -> Self {
        let settings = FormatterSettings::new()
            .with_media_type(MediaType::text())
            .expect("text/plain is not a range")
            .with_encoding(Encoding::UTF8);
        Self { settings, fault }
    }
}

impl BufferedMediaTypeFormatter for FaultyFormatter {
    fn name(&self) -> &str {
        "FaultyFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, _ty: &TypeDescriptor) -> bool {
        false
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        handles::<String>(ty)
    }

    fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        _value: Option<&Value>,
        stream: &mut dyn Write,
        _headers: &ContentHeaders,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        match self.fault {
            Fault::ErrorAfterPartialWrite => {
                stream.write_all(b"partial")?;
                Err(FormattingError::Formatter("disk on fire".to_string()))
            }
            Fault::Panic => panic!("formatter exploded"),
        }
    }
}

/// Async formatter whose read never completes unless cancelled
pub struct PendingFormatter {
    settings: FormatterSettings,
}

impl PendingFormatter {
    pub fn new() -> Self {
        Self {
            settings: json_settings(),
        }
    }
}

#[async_trait]
impl MediaTypeFormatter for PendingFormatter {
    fn name(&self) -> &str {
        "PendingFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, _ty: &TypeDescriptor) -> bool {
        true
    }

    fn can_write_type(&self, _ty: &TypeDescriptor) -> bool {
        false
    }

    async fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        _stream: &mut (dyn AsyncRead + Unpin + Send),
        _headers: &ContentHeaders,
        _logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        std::future::pending::<()>().await;
        Ok(None)
    }
}

// ============================================================================
// Instrumented Streams
// ============================================================================

/// Async sink recording writes, flushes and shutdowns
#[derive(Debug, Default)]
pub struct TrackingWriter {
    pub written: Vec<u8>,
    pub flushes: usize,
    pub shut_down: bool,
}

impl AsyncWrite for TrackingWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.shut_down {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed")));
        }
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down = true;
        Poll::Ready(Ok(()))
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
