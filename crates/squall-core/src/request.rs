//! HTTP request model

use crate::error::{Error, Result};
use crate::headers::HeaderMap;
use crate::uri::Uri;
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::collections::HashMap;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Head,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Parse from the request-line token. Case-sensitive per the wire
    /// grammar.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "POST" => Ok(Method::Post),
            "HEAD" => Ok(Method::Head),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "PATCH" => Ok(Method::Patch),
            _ => Err(Error::syntax(crate::error::SyntaxSource::RequestLine)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body sink
///
/// The parser only relies on `update` (consume bytes, report how many)
/// and `saturated`; `Buffered` accumulates up to an expected size.
#[derive(Debug)]
pub enum Body {
    /// No body expected
    None,
    /// Accumulate exactly `expected` bytes
    Buffered { expected: usize, data: BytesMut },
}

impl Body {
    pub fn buffered(expected: usize) -> Self {
        Body::Buffered {
            expected,
            data: BytesMut::with_capacity(expected.min(64 * 1024)),
        }
    }

    /// Consume from `chunk`, returning the number of bytes taken
    pub fn update(&mut self, chunk: &[u8]) -> usize {
        match self {
            Body::None => 0,
            Body::Buffered { expected, data } => {
                let want = (*expected - data.len()).min(chunk.len());
                data.extend_from_slice(&chunk[..want]);
                want
            }
        }
    }

    /// True once the body needs no further bytes
    pub fn saturated(&self) -> bool {
        match self {
            Body::None => true,
            Body::Buffered { expected, data } => data.len() == *expected,
        }
    }

    /// Buffered content, if any
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Body::None => None,
            Body::Buffered { data, .. } => Some(data),
        }
    }

    /// Take the buffered content out of the body
    pub fn into_bytes(self) -> Bytes {
        match self {
            Body::None => Bytes::new(),
            Body::Buffered { data, .. } => data.freeze(),
        }
    }
}

/// Per-request key/value bag for middleware-published artifacts
///
/// String keys by middleware convention; values are downcast on read.
#[derive(Default)]
pub struct Bag {
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Bag {
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn remove<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        self.entries
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// An HTTP request
///
/// Created once per connection, mutated by the parser as bytes arrive,
/// and reset between pipelined requests.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    /// Raw request-target as received
    pub target: String,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    /// Middleware-published artifacts (parsed cookies, JSON bodies, ...)
    pub bag: Bag,
}

impl Request {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            target: String::new(),
            uri: Uri::default(),
            headers: HeaderMap::new(),
            body: None,
            bag: Bag::default(),
        }
    }

    /// Path portion of the parsed target
    pub fn path(&self) -> &str {
        &self.uri.path
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Parsed Content-Length, if present and numeric
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|v| v.trim().parse().ok())
    }

    /// Reset all fields to defaults; used between pipelined requests
    pub fn reset(&mut self) {
        self.method = Method::Get;
        self.target.clear();
        self.uri.reset();
        self.headers.clear();
        self.body = None;
        self.bag.clear();
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("GET").unwrap(), Method::Get);
        assert_eq!(Method::parse("PATCH").unwrap(), Method::Patch);
        // Lowercase is not a wire method
        assert!(Method::parse("get").is_err());
        assert!(Method::parse("BREW").is_err());
    }

    #[test]
    fn test_buffered_body_saturation() {
        let mut body = Body::buffered(5);
        assert!(!body.saturated());

        assert_eq!(body.update(b"he"), 2);
        assert_eq!(body.update(b"llo, world"), 3);
        assert!(body.saturated());
        // Saturated body consumes nothing further.
        assert_eq!(body.update(b"extra"), 0);
        assert_eq!(body.bytes(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_empty_body_is_immediately_saturated() {
        let body = Body::buffered(0);
        assert!(body.saturated());
    }

    #[test]
    fn test_bag_typed_roundtrip() {
        let mut bag = Bag::default();
        bag.insert("count", 3usize);
        bag.insert("name", "alice".to_string());

        assert_eq!(bag.get::<usize>("count"), Some(&3));
        assert_eq!(bag.get::<String>("name").map(|s| s.as_str()), Some("alice"));
        // Wrong type reads as absent
        assert_eq!(bag.get::<u32>("count"), None);
        assert_eq!(bag.remove::<usize>("count"), Some(3));
        assert!(!bag.contains("count"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut req = Request::new();
        req.method = Method::Post;
        req.target = "/x?a=1".into();
        req.headers.add("host", "example");
        req.body = Some(Body::buffered(3));
        req.bag.insert("k", 1u8);

        req.reset();
        assert_eq!(req.method, Method::Get);
        assert!(req.target.is_empty());
        assert_eq!(req.path(), "/");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
        assert!(!req.bag.contains("k"));
    }
}
