//! Shared fixtures: a serde_json formatter and a wiremock-backed client

#![allow(dead_code)]

use ouroboros_formatting::{
    async_trait, BufferedMediaTypeFormatter, CancellationToken, ContentHeaders, Encoding,
    FormatterLogger, FormatterSettings, FormattingError, FormattingResult, MediaType,
    MediaTypeFormatter, MediaTypeFormatterCollection, TransportContext, TypeDescriptor, Typed,
    Value,
};
use ouroboros_http::{HttpClient, HttpClientConfig};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use wiremock::MockServer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub item: String,
    pub quantity: u32,
}

impl Order {
    pub fn new(id: u64, item: &str, quantity: u32) -> Self {
        Self {
            id,
            item: item.to_string(),
            quantity,
        }
    }
}

ouroboros_formatting::impl_typed!(reference: Order);

fn json_settings() -> FormatterSettings {
    FormatterSettings::new()
        .with_media_type(MediaType::json())
        .expect("application/json is not a range")
        .with_encoding(Encoding::UTF8)
}

fn is_order(ty: &TypeDescriptor) -> bool {
    ty.type_id() == Order::type_descriptor().type_id()
}

/// serde_json formatter for `Order`, recording the transport it was given
pub struct OrderJsonFormatter {
    settings: FormatterSettings,
    pub transports: Mutex<Vec<TransportContext>>,
}

impl OrderJsonFormatter {
    pub fn new() -> Self {
        Self {
            settings: json_settings(),
            transports: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaTypeFormatter for OrderJsonFormatter {
    fn name(&self) -> &str {
        "OrderJsonFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool {
        is_order(ty)
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        is_order(ty)
    }

    async fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        stream: &mut (dyn AsyncRead + Unpin + Send),
        _headers: &ContentHeaders,
        logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        let mut body = Vec::new();
        stream.read_to_end(&mut body).await?;
        match serde_json::from_slice::<Order>(&body) {
            Ok(order) => Ok(Some(Value::new(order))),
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
        transport: Option<&TransportContext>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        if let Some(transport) = transport {
            self.transports.lock().push(transport.clone());
        }
        let order = value.and_then(|value| value.downcast_ref::<Order>());
        let body = serde_json::to_vec(&order).map_err(|err| FormattingError::Formatter(err.to_string()))?;
        stream.write_all(&body).await?;
        Ok(())
    }
}

/// Blocking serde_json formatter for `Order`, wrapped in `Buffered` by tests
pub struct BlockingOrderFormatter {
    settings: FormatterSettings,
}

impl BlockingOrderFormatter {
    pub fn new() -> Self {
        Self {
            settings: json_settings(),
        }
    }
}

impl BufferedMediaTypeFormatter for BlockingOrderFormatter {
    fn name(&self) -> &str {
        "BlockingOrderFormatter"
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn can_read_type(&self, ty: &TypeDescriptor) -> bool {
        is_order(ty)
    }

    fn can_write_type(&self, ty: &TypeDescriptor) -> bool {
        is_order(ty)
    }

    fn write_to_stream(
        &self,
        _ty: &TypeDescriptor,
        value: Option<&Value>,
        stream: &mut dyn Write,
        _headers: &ContentHeaders,
        _cancel: &CancellationToken,
    ) -> FormattingResult<()> {
        let order = value.and_then(|value| value.downcast_ref::<Order>());
        serde_json::to_writer(stream, &order).map_err(|err| FormattingError::Formatter(err.to_string()))
    }

    fn read_from_stream(
        &self,
        _ty: &TypeDescriptor,
        stream: &mut dyn Read,
        _headers: &ContentHeaders,
        _logger: Option<&dyn FormatterLogger>,
        _cancel: &CancellationToken,
    ) -> FormattingResult<Option<Value>> {
        let order: Order =
            serde_json::from_reader(stream).map_err(|err| FormattingError::Formatter(err.to_string()))?;
        Ok(Some(Value::new(order)))
    }
}

/// Client pointed at `server`, reading through `formatters`
pub fn client_for(server: &MockServer, formatters: &[Arc<dyn MediaTypeFormatter>]) -> HttpClient {
    let formatters: MediaTypeFormatterCollection = formatters.iter().cloned().collect();
    HttpClient::new(HttpClientConfig::new().base_url(server.uri()), Arc::new(formatters))
        .expect("client builds")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
