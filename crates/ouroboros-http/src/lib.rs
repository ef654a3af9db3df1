//! ouroboros-http: typed async HTTP client
//!
//! Sends values through `MediaTypeFormatter`s and reads typed values back
//! out of responses with the formatting engine's `ContentReader`.
//!
//! # Architecture
//!
//! - `HttpClient`: connection-pooled client on `reqwest`
//! - `RequestBuilder`: request with headers, query and a raw or typed body
//! - `HttpResponse`: buffered response with latency measurement

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use config::HttpClientConfig;
pub use error::{HttpError, HttpErrorCategory, HttpResult};
pub use request::{HttpMethod, RequestBody, RequestBuilder};
pub use response::{HttpResponse, HttpResponseBuilder};
