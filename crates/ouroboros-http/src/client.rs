//! HTTP client with connection pooling and typed bodies

use crate::config::HttpClientConfig;
use crate::error::{HttpError, HttpResult};
use crate::request::{HttpMethod, RequestBody, RequestBuilder};
use crate::response::{from_reqwest, HttpResponse};
use ouroboros_formatting::{
    CancellationToken, ContentReader, FormatterLogger, FormattingError, HttpContent, MediaType,
    MediaTypeFormatter, MediaTypeFormatterCollection, ObjectContent, TransportContext, Typed,
};
use std::sync::Arc;
use std::time::Instant;

/// Async HTTP client that writes and reads typed bodies through formatters
///
/// # Example
///
/// ```ignore
/// use ouroboros_http::{HttpClient, HttpClientConfig};
///
/// let client = HttpClient::new(
///     HttpClientConfig::new().base_url("https://api.example.com"),
///     Arc::new(formatters),
/// )?;
///
/// let user: User = client.get_as("/users/1", &CancellationToken::new()).await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    config: HttpClientConfig,
    reader: ContentReader,
}

impl HttpClient {
    /// Create a client reading responses through `formatters`
    pub fn new(
        config: HttpClientConfig,
        formatters: Arc<MediaTypeFormatterCollection>,
    ) -> HttpResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent);

        if let Some(read_timeout) = config.read_timeout {
            builder = builder.read_timeout(read_timeout);
        }

        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        builder = builder.gzip(config.gzip).brotli(config.brotli);

        // Danger: Accept invalid certificates (testing only)
        if config.danger_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;
        let reader = ContentReader::with_config(formatters, &config.formatting);

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client,
                config,
                reader,
            }),
        })
    }

    /// Pass `logger` to formatters when reading responses
    pub fn with_logger(self, logger: Arc<dyn FormatterLogger>) -> Self {
        let inner = HttpClientInner {
            client: self.inner.client.clone(),
            config: self.inner.config.clone(),
            reader: self.inner.reader.clone().with_logger(logger),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> Option<&str> {
        self.inner.config.base_url.as_deref()
    }

    pub fn formatters(&self) -> &Arc<MediaTypeFormatterCollection> {
        self.inner.reader.formatters()
    }

    /// Create a request builder for more complex requests
    pub fn request(&self, method: HttpMethod, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Send a request
    pub async fn send(&self, request: RequestBuilder) -> HttpResult<HttpResponse> {
        self.execute(request, &CancellationToken::new()).await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> HttpResult<HttpResponse> {
        if cancel.is_cancelled() {
            return Err(FormattingError::Cancelled.into());
        }

        let url = request.full_url(self.inner.config.base_url.as_deref());
        let mut builder = self.inner.client.request(request.method.into(), &url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.query_params.is_empty() {
            builder = builder.query(&request.query_params);
        }

        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Bytes(data) => builder.body(data),
            RequestBody::Text(data) => builder.body(data),
            RequestBody::Content(content) => {
                let transport = TransportContext {
                    secure: url.starts_with("https://"),
                    remote_url: Some(url.clone()),
                };
                let body = serialize_content(&content, &transport, cancel).await?;
                builder
                    .headers(content.headers().to_header_map())
                    .body(body)
            }
        };

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(method = %request.method, url = %url, "Sending request");
        let start = Instant::now();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FormattingError::Cancelled.into()),
            response = builder.send() => response?,
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        let response = from_reqwest(response, latency_ms).await?;
        tracing::debug!(
            status = response.status_code,
            latency_ms = response.latency_ms,
            url = %response.url,
            "Received response"
        );
        Ok(response)
    }

    /// Send a GET request
    pub async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        self.send(RequestBuilder::new(HttpMethod::Get, url)).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, url: &str) -> HttpResult<HttpResponse> {
        self.send(RequestBuilder::new(HttpMethod::Delete, url)).await
    }

    /// POST `value` serialized by `formatter`. `media_type`, when given,
    /// becomes the `Content-Type`.
    pub async fn post_as<T: Typed>(
        &self,
        url: &str,
        value: T,
        formatter: Arc<dyn MediaTypeFormatter>,
        media_type: Option<MediaType>,
        cancel: &CancellationToken,
    ) -> HttpResult<HttpResponse> {
        let content = ObjectContent::from_typed(value, formatter, media_type)?;
        self.execute(RequestBuilder::new(HttpMethod::Post, url).content(content), cancel)
            .await
    }

    /// PUT `value` serialized by `formatter`
    pub async fn put_as<T: Typed>(
        &self,
        url: &str,
        value: T,
        formatter: Arc<dyn MediaTypeFormatter>,
        media_type: Option<MediaType>,
        cancel: &CancellationToken,
    ) -> HttpResult<HttpResponse> {
        let content = ObjectContent::from_typed(value, formatter, media_type)?;
        self.execute(RequestBuilder::new(HttpMethod::Put, url).content(content), cancel)
            .await
    }

    /// Read the response body as a `T` through the client's formatters.
    ///
    /// The status code is not checked.
    pub async fn read_as<T: Typed>(
        &self,
        response: &HttpResponse,
        cancel: &CancellationToken,
    ) -> HttpResult<T> {
        let content = response.content()?;
        Ok(self.inner.reader.read_as::<T>(&content, cancel).await?)
    }

    /// GET `url` and read the body as a `T`; non-2xx statuses are errors
    pub async fn get_as<T: Typed>(&self, url: &str, cancel: &CancellationToken) -> HttpResult<T> {
        let response = self
            .execute(RequestBuilder::new(HttpMethod::Get, url), cancel)
            .await?;
        if !response.is_success() {
            return Err(HttpError::ResponseError(format!(
                "Unexpected status {} from {}",
                response.status_code, response.url
            )));
        }
        self.read_as(&response, cancel).await
    }
}

async fn serialize_content(
    content: &ObjectContent,
    transport: &TransportContext,
    cancel: &CancellationToken,
) -> HttpResult<Vec<u8>> {
    let mut body = Vec::new();
    content
        .serialize_to_stream(&mut body, Some(transport), cancel)
        .await?;
    tracing::debug!(
        formatter = %content.formatter().name(),
        ty = %content.object_type(),
        bytes = body.len(),
        "Serialized request body"
    );
    Ok(body)
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.config.base_url)
            .field("timeout", &self.inner.config.timeout)
            .field("reader", &self.inner.reader)
            .finish()
    }
}
