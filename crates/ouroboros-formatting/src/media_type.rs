//! Media type parsing and subset matching
//!
//! A formatter advertises concrete media types; a request may name a media
//! range. Matching always asks whether the formatter's declared type is a
//! subset of the requested one, never the reverse.

use crate::error::{FormattingError, FormattingResult};
use std::fmt;
use std::str::FromStr;

const MEDIA_RANGE_ASTERISK: &str = "*";
const CHARSET: &str = "charset";

// ============================================================================
// Media Type
// ============================================================================

/// Parsed `Content-Type` value: `type/subtype` plus ordered parameters
#[derive(Debug, Clone)]
pub struct MediaType {
    /// Main type (e.g., "application", "text", "*")
    pub r#type: String,
    /// Subtype (e.g., "json", "html", "*")
    pub subtype: String,
    /// Parameters in header order; quoted values keep their quotes
    pub params: Vec<(String, String)>,
}

/// Whether a media type names a single type or a range of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTypeRange {
    /// A concrete `type/subtype`
    None,
    /// `type/*`
    SubtypeMediaRange,
    /// `*/*`
    AllMediaRange,
}

impl MediaType {
    /// Parse a media type string such as `application/json; charset=utf-8`
    pub fn parse(s: &str) -> FormattingResult<Self> {
        let invalid =
            || FormattingError::argument("mediaType", format!("The format of value '{}' is invalid.", s));

        let mut segments = split_unquoted(s, ';').into_iter();
        let essence = segments.next().map(str::trim).unwrap_or_default();
        let (r#type, subtype) = essence.split_once('/').ok_or_else(invalid)?;
        let (r#type, subtype) = (r#type.trim(), subtype.trim());
        if !is_token(r#type) || !is_token(subtype) {
            return Err(invalid());
        }

        let mut media_type = Self::new(r#type.to_ascii_lowercase(), subtype.to_ascii_lowercase());

        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = segment.split_once('=').ok_or_else(invalid)?;
            let (name, value) = (name.trim(), value.trim());
            if !is_token(name) || !(is_token(value) || is_quoted_string(value)) {
                return Err(invalid());
            }
            media_type.params.push((name.to_string(), value.to_string()));
        }

        Ok(media_type)
    }

    /// Create a specific media type without parameters
    pub fn new(r#type: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            subtype: subtype.into(),
            params: Vec::new(),
        }
    }

    pub fn json() -> Self {
        Self::new("application", "json")
    }

    pub fn xml() -> Self {
        Self::new("application", "xml")
    }

    pub fn text() -> Self {
        Self::new("text", "plain")
    }

    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    pub fn any() -> Self {
        Self::new("*", "*")
    }

    /// Add parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// `type/subtype` without parameters
    pub fn essence(&self) -> String {
        format!("{}/{}", self.r#type, self.subtype)
    }

    /// Look up a parameter value by case-insensitive name, quotes removed
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| unquote(value))
    }

    /// The `charset` parameter, if present and non-blank
    pub fn charset(&self) -> Option<&str> {
        self.parameter(CHARSET).filter(|charset| !charset.trim().is_empty())
    }

    /// Replace (or remove) the `charset` parameter
    pub fn set_charset(&mut self, charset: Option<&str>) {
        self.params.retain(|(key, _)| !key.eq_ignore_ascii_case(CHARSET));
        if let Some(charset) = charset {
            self.params.push((CHARSET.to_string(), charset.to_string()));
        }
    }

    /// Classify this media type as a concrete type or a range
    pub fn range(&self) -> MediaTypeRange {
        if self.subtype != MEDIA_RANGE_ASTERISK {
            MediaTypeRange::None
        } else if self.r#type == MEDIA_RANGE_ASTERISK {
            MediaTypeRange::AllMediaRange
        } else {
            MediaTypeRange::SubtypeMediaRange
        }
    }

    /// Check if this is `*/*` or `type/*`
    pub fn is_range(&self) -> bool {
        self.range() != MediaTypeRange::None
    }

    /// Determine whether `self` is a subset of `target`, reporting the range
    /// kind of `target`.
    ///
    /// `self` matches when its type and subtype equal the target's (or the
    /// target is a suitable range) and every parameter of `self` is present
    /// with an equal value on `target`. The target may carry additional
    /// parameters.
    pub fn subset_of(&self, target: Option<&MediaType>) -> (bool, MediaTypeRange) {
        let Some(target) = target else {
            return (false, MediaTypeRange::None);
        };

        let range = target.range();

        if !self.r#type.eq_ignore_ascii_case(&target.r#type) {
            if range != MediaTypeRange::AllMediaRange {
                return (false, range);
            }
        } else if !self.subtype.eq_ignore_ascii_case(&target.subtype)
            && range == MediaTypeRange::None
        {
            return (false, range);
        }

        let params_present = self
            .params
            .iter()
            .all(|param| target.params.iter().any(|other| param_eq(param, other)));

        (params_present, range)
    }

    /// Boolean form of [`MediaType::subset_of`]
    pub fn is_subset_of(&self, target: &MediaType) -> bool {
        self.subset_of(Some(target)).0
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.r#type.eq_ignore_ascii_case(&other.r#type)
            && self.subtype.eq_ignore_ascii_case(&other.subtype)
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .all(|param| other.params.iter().any(|theirs| param_eq(param, theirs)))
    }
}

impl Eq for MediaType {}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.r#type, self.subtype)?;
        for (key, value) in &self.params {
            write!(f, "; {}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = FormattingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parameter names compare case-insensitively. Token values do too, while
/// quoted-string values must match exactly.
fn param_eq(a: &(String, String), b: &(String, String)) -> bool {
    if !a.0.eq_ignore_ascii_case(&b.0) {
        return false;
    }
    if is_quoted_string(&a.1) || is_quoted_string(&b.1) {
        a.1 == b.1
    } else {
        a.1.eq_ignore_ascii_case(&b.1)
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

fn is_quoted_string(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

fn unquote(s: &str) -> &str {
    if is_quoted_string(s) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Split on `delimiter` outside of quoted strings
fn split_unquoted(s: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

// ============================================================================
// Tests
// ============================================================================
