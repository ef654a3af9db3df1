//! HTTP request types and builders

use bytes::Bytes;
use ouroboros_formatting::ObjectContent;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(format!("Invalid HTTP method: {}", s)),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Request body types
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// Raw bytes
    Bytes(Bytes),
    /// Raw text
    Text(String),
    /// Typed value serialized by its formatter when the request is sent
    Content(ObjectContent),
}

/// Request builder for constructing HTTP requests
#[derive(Debug)]
pub struct RequestBuilder {
    /// HTTP method
    pub method: HttpMethod,
    /// Request URL (relative path if base_url is set)
    pub url: String,
    /// Request headers, in insertion order
    pub headers: Vec<(String, String)>,
    /// Query parameters, in insertion order
    pub query_params: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
    /// Request timeout (overrides client timeout)
    pub timeout: Option<Duration>,
}

impl RequestBuilder {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: RequestBody::None,
            timeout: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Set raw bytes body
    pub fn bytes(mut self, data: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(data.into());
        self
    }

    /// Set raw text body
    pub fn text(mut self, data: impl Into<String>) -> Self {
        self.body = RequestBody::Text(data.into());
        self.headers
            .push(("Content-Type".to_string(), "text/plain; charset=utf-8".to_string()));
        self
    }

    /// Set a typed body; its content headers are sent with the request
    pub fn content(mut self, content: ObjectContent) -> Self {
        self.body = RequestBody::Content(content);
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout from seconds
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Some(Duration::from_secs_f64(secs));
        self
    }

    /// Join the request URL onto `base_url` unless it is already absolute
    pub(crate) fn full_url(&self, base_url: Option<&str>) -> String {
        match base_url {
            Some(base)
                if !(self.url.starts_with("http://") || self.url.starts_with("https://")) =>
            {
                let base = base.trim_end_matches('/');
                if self.url.starts_with('/') {
                    format!("{}{}", base, self.url)
                } else {
                    format!("{}/{}", base, self.url)
                }
            }
            _ => self.url.clone(),
        }
    }
}
