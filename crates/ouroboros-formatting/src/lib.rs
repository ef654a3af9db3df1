//! ouroboros-formatting: typed content negotiation
//!
//! Chooses, at runtime, which formatter serializes a value of a given type
//! for a given wire media type, and reads typed values back out of bodies.
//!
//! # Architecture
//!
//! - `MediaType`: parsing and the subset test used for every match
//! - `MediaTypeFormatter`: the async formatter contract
//! - `MediaTypeFormatterCollection`: ordered registry, first match wins
//! - `Buffered`: adapter for formatters written against blocking I/O
//! - `ObjectContent`: a typed value paired with its formatter and headers
//! - `ContentReader`: formatter resolution and dispatch for reads
//!
//! No codec ships with this crate; formatters are supplied by the caller.

pub mod buffered;
pub mod collection;
pub mod config;
pub mod content;
pub mod encoding;
pub mod error;
pub mod formatter;
pub mod headers;
pub mod logger;
pub mod media_type;
pub mod reader;
pub mod stream;
pub mod types;

pub use buffered::{Buffered, BufferedMediaTypeFormatter, DEFAULT_BUFFER_SIZE};
pub use collection::MediaTypeFormatterCollection;
pub use config::FormattingConfig;
pub use content::{BytesContent, HttpContent, ObjectContent, TransportContext};
pub use encoding::Encoding;
pub use error::{FormattingError, FormattingErrorCategory, FormattingResult};
pub use formatter::{default_value_for_type, FormatterSettings, MediaTypeFormatter, SupportedMediaTypes};
pub use headers::ContentHeaders;
pub use logger::{CollectingFormatterLogger, FormatterLogger, TracingFormatterLogger};
pub use media_type::{MediaType, MediaTypeRange};
pub use reader::ContentReader;
pub use stream::NonClosingStream;
pub use types::{TypeDescriptor, Typed, Value};

// Re-exported so formatter implementations do not need a direct dependency
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
