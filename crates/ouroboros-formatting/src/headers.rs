//! Content headers carried alongside a body

use crate::error::FormattingResult;
use crate::media_type::MediaType;
use http::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};

/// `Content-Type`, `Content-Length` and any other entity headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentHeaders {
    pub content_type: Option<MediaType>,
    pub content_length: Option<u64>,
    /// Remaining headers, excluding `Content-Type` and `Content-Length`
    pub other: HeaderMap,
}

impl ContentHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers with only a content type
    pub fn with_content_type(media_type: MediaType) -> Self {
        Self {
            content_type: Some(media_type),
            ..Self::default()
        }
    }

    /// Split an `http::HeaderMap` into typed content headers.
    ///
    /// A `Content-Type` that fails to parse is an argument error; an
    /// unparseable `Content-Length` is ignored.
    pub fn from_header_map(headers: &HeaderMap) -> FormattingResult<Self> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(MediaType::parse)
            .transpose()?;

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let mut other = headers.clone();
        other.remove(CONTENT_TYPE);
        other.remove(CONTENT_LENGTH);

        Ok(Self {
            content_type,
            content_length,
            other,
        })
    }

    /// Render back into an `http::HeaderMap`
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = self.other.clone();
        if let Some(content_type) = &self.content_type {
            if let Ok(value) = HeaderValue::from_str(&content_type.to_string()) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
        if let Some(length) = self.content_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_map_splits_entity_headers() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        map.insert(CONTENT_LENGTH, HeaderValue::from_static("12"));
        map.insert("x-trace", HeaderValue::from_static("abc"));

        let headers = ContentHeaders::from_header_map(&map).unwrap();
        assert_eq!(headers.content_type.as_ref().unwrap().essence(), "application/json");
        assert_eq!(headers.content_length, Some(12));
        assert_eq!(headers.other.len(), 1);

        let rendered = headers.to_header_map();
        assert_eq!(rendered.get(CONTENT_TYPE).unwrap(), "application/json; charset=utf-8");
        assert_eq!(rendered.get(CONTENT_LENGTH).unwrap(), "12");
        assert_eq!(rendered.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn test_from_header_map_rejects_bad_content_type() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("not a media type"));
        let err = ContentHeaders::from_header_map(&map).unwrap_err();
        assert_eq!(err.param_name(), Some("mediaType"));
    }
}
