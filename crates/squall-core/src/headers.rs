//! HTTP header model
//!
//! Case-insensitive multi-map (keys stored lowercase, value order
//! preserved) plus typed decoders for the composite headers the core
//! negotiates on: Range, Content-Range, comma token lists, Content-Type.

use crate::error::{Error, Result, SyntaxSource};
use smallvec::SmallVec;

/// Case-insensitive header multi-map
///
/// Keys are folded to lowercase on insertion. A key maps to one or more
/// values; insertion order of values for the same key is preserved.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: SmallVec<[(String, SmallVec<[String; 1]>); 16]>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any existing values for the same key
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, values)) => values.push(value.into()),
            None => {
                let mut values = SmallVec::new();
                values.push(value.into());
                self.entries.push((name, values));
            }
        }
    }

    /// Replace all values for a key with a single value
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, values)) => {
                values.clear();
                values.push(value.into());
            }
            None => {
                let mut values = SmallVec::new();
                values.push(value.into());
                self.entries.push((name, values));
            }
        }
    }

    /// First value for a key (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, 0)
    }

    /// Value at `index` for a key
    pub fn get_at(&self, name: &str, index: usize) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .and_then(|(_, values)| values.get(index))
            .map(|v| v.as_str())
    }

    /// All values for a key, in insertion order
    pub fn get_all(&self, name: &str) -> &[String] {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.entries.iter().any(|(k, _)| *k == name)
    }

    pub fn remove(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.entries.retain(|(k, _)| *k != name);
    }

    /// Iterate `(key, value)` pairs; multi-valued keys yield one pair per value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ===== Typed views =====

/// One element of a Range header: `from-to` with either side optional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// Decoded Content-Range header: `bytes start-end/(size|*)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` when the total size was `*`
    pub size: Option<u64>,
}

/// Decoded Content-Type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// `type/subtype`, lowercased
    pub essence: String,
    pub charset: Option<String>,
    pub boundary: Option<String>,
}

fn header_value_error() -> Error {
    Error::syntax(SyntaxSource::HeaderValue)
}

/// Parse a Range header value. Only the `bytes` unit is recognized.
///
/// Grammar: `bytes=from-to[,from-to]*`; either side of a range may be
/// empty, both empty is malformed.
pub fn parse_range(value: &str) -> Result<Vec<ByteRange>> {
    let (unit, spec) = value.split_once('=').ok_or_else(header_value_error)?;
    if unit.trim() != "bytes" {
        return Err(header_value_error());
    }

    let mut ranges = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        let (from, to) = part.split_once('-').ok_or_else(header_value_error)?;
        let from = parse_opt_u64(from)?;
        let to = parse_opt_u64(to)?;
        if from.is_none() && to.is_none() {
            return Err(header_value_error());
        }
        ranges.push(ByteRange { from, to });
    }

    if ranges.is_empty() {
        return Err(header_value_error());
    }
    Ok(ranges)
}

fn parse_opt_u64(s: &str) -> Result<Option<u64>> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse().map(Some).map_err(|_| header_value_error())
}

/// Parse a Content-Range header value. Only the `bytes` unit is recognized.
pub fn parse_content_range(value: &str) -> Result<ContentRange> {
    let (unit, spec) = value.trim().split_once(' ').ok_or_else(header_value_error)?;
    if unit != "bytes" {
        return Err(header_value_error());
    }

    let (range, size) = spec.split_once('/').ok_or_else(header_value_error)?;
    let (start, end) = range.split_once('-').ok_or_else(header_value_error)?;

    let start = start.parse().map_err(|_| header_value_error())?;
    let end = end.parse().map_err(|_| header_value_error())?;
    let size = if size == "*" {
        None
    } else {
        Some(size.parse().map_err(|_| header_value_error())?)
    };

    Ok(ContentRange { start, end, size })
}

/// Split a comma-separated token header (Content-Encoding,
/// Transfer-Encoding, Accept-Encoding, Connection): each element is
/// trimmed and lowercased.
pub fn parse_token_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a Content-Type header value.
///
/// At most two `; key=value` parameters; only `charset` and `boundary`
/// are recognized, anything else is malformed.
pub fn parse_content_type(value: &str) -> Result<MediaType> {
    let mut parts = value.split(';');
    let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    if essence.is_empty() || !essence.contains('/') {
        return Err(header_value_error());
    }

    let mut media = MediaType {
        essence,
        charset: None,
        boundary: None,
    };

    let mut count = 0;
    for param in parts {
        count += 1;
        if count > 2 {
            return Err(header_value_error());
        }
        let (key, val) = param.split_once('=').ok_or_else(header_value_error)?;
        let val = val.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "charset" => media.charset = Some(val),
            "boundary" => media.boundary = Some(val),
            _ => return Err(header_value_error()),
        }
    }

    Ok(media)
}

impl HeaderMap {
    /// Typed Range view; `Ok(None)` when the header is absent
    pub fn range(&self) -> Result<Option<Vec<ByteRange>>> {
        self.get("range").map(parse_range).transpose()
    }

    /// Typed Content-Range view
    pub fn content_range(&self) -> Result<Option<ContentRange>> {
        self.get("content-range").map(parse_content_range).transpose()
    }

    /// Typed Content-Type view
    pub fn content_type(&self) -> Result<Option<MediaType>> {
        self.get("content-type").map(parse_content_type).transpose()
    }

    /// Content-Encoding tokens, trimmed and lowercased
    pub fn content_encoding(&self) -> Vec<String> {
        self.get("content-encoding").map(parse_token_list).unwrap_or_default()
    }

    /// Transfer-Encoding tokens, trimmed and lowercased
    pub fn transfer_encoding(&self) -> Vec<String> {
        self.get("transfer-encoding").map(parse_token_list).unwrap_or_default()
    }

    /// Accept-Encoding tokens, trimmed and lowercased
    pub fn accept_encoding(&self) -> Vec<String> {
        self.get("accept-encoding").map(parse_token_list).unwrap_or_default()
    }

    /// Connection tokens, trimmed and lowercased
    pub fn connection(&self) -> Vec<String> {
        self.get("connection").map(parse_token_list).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_multi_value() {
        let mut headers = HeaderMap::new();
        headers.add("X-Tag", "a");
        headers.add("x-tag", "b");
        headers.add("X-TAG", "c");

        assert_eq!(headers.get("x-Tag"), Some("a"));
        assert_eq!(headers.get_at("x-tag", 1), Some("b"));
        assert_eq!(headers.get_all("X-Tag"), &["a", "b", "c"]);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_set_replaces() {
        let mut headers = HeaderMap::new();
        headers.add("accept", "text/html");
        headers.add("accept", "text/plain");
        headers.set("Accept", "*/*");

        assert_eq!(headers.get_all("accept"), &["*/*"]);
    }

    #[test]
    fn test_iter_order() {
        let mut headers = HeaderMap::new();
        headers.add("host", "x");
        headers.add("x-a", "1");
        headers.add("x-a", "2");

        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("host", "x"), ("x-a", "1"), ("x-a", "2")]);
    }

    #[test]
    fn test_parse_range() {
        let ranges = parse_range("bytes=0-499,500-999").unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange { from: Some(0), to: Some(499) },
                ByteRange { from: Some(500), to: Some(999) },
            ]
        );

        // Open ends
        let ranges = parse_range("bytes=500-").unwrap();
        assert_eq!(ranges[0], ByteRange { from: Some(500), to: None });
        let ranges = parse_range("bytes=-200").unwrap();
        assert_eq!(ranges[0], ByteRange { from: None, to: Some(200) });

        assert!(parse_range("chunks=0-1").is_err());
        assert!(parse_range("bytes=-").is_err());
        assert!(parse_range("bytes=").is_err());
    }

    #[test]
    fn test_parse_content_range() {
        let cr = parse_content_range("bytes 0-499/1234").unwrap();
        assert_eq!(cr, ContentRange { start: 0, end: 499, size: Some(1234) });

        let cr = parse_content_range("bytes 5-9/*").unwrap();
        assert_eq!(cr.size, None);

        assert!(parse_content_range("items 0-1/2").is_err());
        assert!(parse_content_range("bytes 0-x/2").is_err());
    }

    #[test]
    fn test_parse_token_list() {
        assert_eq!(
            parse_token_list(" GZip , deflate ,br"),
            vec!["gzip", "deflate", "br"]
        );
    }

    #[test]
    fn test_parse_content_type() {
        let mt = parse_content_type("Text/HTML; charset=utf-8").unwrap();
        assert_eq!(mt.essence, "text/html");
        assert_eq!(mt.charset.as_deref(), Some("utf-8"));
        assert_eq!(mt.boundary, None);

        let mt = parse_content_type("multipart/form-data; boundary=xyz; charset=utf-8").unwrap();
        assert_eq!(mt.boundary.as_deref(), Some("xyz"));

        // Unknown parameter key is malformed
        assert!(parse_content_type("text/plain; version=1").is_err());
        // More than two parameters is malformed
        assert!(parse_content_type("a/b; charset=x; boundary=y; charset=z").is_err());
        assert!(parse_content_type("plain").is_err());
    }
}
