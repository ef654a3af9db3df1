//! Character encodings advertised by formatters

use std::borrow::Cow;
use std::fmt;

/// A character encoding identified by its canonical web name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Encoding {
    web_name: Cow<'static, str>,
}

impl Encoding {
    pub const UTF8: Encoding = Encoding::from_static("utf-8");
    pub const UTF16: Encoding = Encoding::from_static("utf-16");
    pub const UTF16_BE: Encoding = Encoding::from_static("utf-16BE");
    pub const UTF32: Encoding = Encoding::from_static("utf-32");
    pub const ASCII: Encoding = Encoding::from_static("us-ascii");
    pub const LATIN1: Encoding = Encoding::from_static("iso-8859-1");

    /// Encoding with a compile-time name
    pub const fn from_static(web_name: &'static str) -> Self {
        Self {
            web_name: Cow::Borrowed(web_name),
        }
    }

    /// Encoding with a runtime name
    pub fn new(web_name: impl Into<String>) -> Self {
        Self {
            web_name: Cow::Owned(web_name.into()),
        }
    }

    /// Canonical name used for the `charset` parameter
    pub fn web_name(&self) -> &str {
        &self.web_name
    }

    /// Case-insensitive comparison against a `charset` value
    pub fn matches_charset(&self, charset: &str) -> bool {
        self.web_name.eq_ignore_ascii_case(charset.trim())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.web_name)
    }
}
