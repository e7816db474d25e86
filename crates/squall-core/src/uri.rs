//! Request-target parsing
//!
//! Accepts only origin-form targets (`/path?query#fragment`). Query values
//! are percent-decoded; keys are left untouched.

use crate::error::{Error, Result, SyntaxSource};

/// Ordered query map with unique keys
///
/// Duplicate keys overwrite: `?a=1&a=2` reads back as `a=2`, at the
/// position of the first insertion. This mirrors the documented behavior
/// even though HTTP semantics are looser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    pairs: Vec<(String, String)>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair; an existing key keeps its position but takes the
    /// new value (last write wins).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.pairs.push((key, value.into())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterate pairs in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

/// Parsed origin-form request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    /// Non-empty, always starts with `/`
    pub path: String,
    pub query: QueryMap,
    pub fragment: Option<String>,
}

impl Default for Uri {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            query: QueryMap::new(),
            fragment: None,
        }
    }
}

impl Uri {
    /// Parse an origin-form request target.
    ///
    /// Fragments rarely appear on the wire but are parsed for
    /// completeness.
    pub fn parse(target: &str) -> Result<Self> {
        if !target.starts_with('/') {
            return Err(Error::syntax(SyntaxSource::RequestLine));
        }

        let (rest, fragment) = match target.split_once('#') {
            Some((rest, frag)) => (rest, Some(frag.to_string())),
            None => (target, None),
        };

        let (path, query_str) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        if path.is_empty() {
            return Err(Error::syntax(SyntaxSource::RequestLine));
        }

        let mut query = QueryMap::new();
        if let Some(query_str) = query_str {
            for pair in query_str.split('&') {
                // Each pair carries exactly one separator; literal `=` in
                // a value must arrive percent-encoded.
                if pair.matches('=').count() != 1 {
                    return Err(Error::syntax(SyntaxSource::RequestLine));
                }
                let (key, value) = pair.split_once('=').ok_or(Error::syntax(SyntaxSource::RequestLine))?;
                if key.is_empty() {
                    return Err(Error::syntax(SyntaxSource::RequestLine));
                }
                query.insert(key, percent_decode(value));
            }
        }

        Ok(Self {
            path: path.to_string(),
            query,
            fragment,
        })
    }

    pub fn reset(&mut self) {
        self.path.clear();
        self.path.push('/');
        self.query.clear();
        self.fragment = None;
    }
}

/// Percent-decode a string; `+` decodes to space.
///
/// Invalid escapes pass through verbatim rather than failing.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if let Some(hex) = s.get(i + 1..i + 3) {
                    if let Ok(byte) = u8::from_str_radix(hex, 16) {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                }
                out.push(b'%');
                i += 1;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode everything outside the URL-safe set
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let uri = Uri::parse("/hello/world").unwrap();
        assert_eq!(uri.path, "/hello/world");
        assert!(uri.query.is_empty());
        assert_eq!(uri.fragment, None);
    }

    #[test]
    fn test_query_decoding() {
        let uri = Uri::parse("/search?q=rust%20lang&page=2").unwrap();
        assert_eq!(uri.query.get("q"), Some("rust lang"));
        assert_eq!(uri.query.get("page"), Some("2"));
    }

    #[test]
    fn test_duplicate_query_key_overwrites() {
        let uri = Uri::parse("/x?a=1&b=9&a=2").unwrap();
        assert_eq!(uri.query.get("a"), Some("2"));
        // First insertion keeps its position.
        let keys: Vec<_> = uri.query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_fragment() {
        let uri = Uri::parse("/doc?x=1#section-2").unwrap();
        assert_eq!(uri.path, "/doc");
        assert_eq!(uri.query.get("x"), Some("1"));
        assert_eq!(uri.fragment.as_deref(), Some("section-2"));
    }

    #[test]
    fn test_malformed_pairs() {
        assert!(Uri::parse("/x?novalue").is_err());
        assert!(Uri::parse("/x?=1").is_err());
        assert!(Uri::parse("relative/path").is_err());
    }

    #[test]
    fn test_pair_with_extra_equals_is_malformed() {
        assert!(Uri::parse("/x?expr=a=b").is_err());
        // Percent-encoded separators are fine.
        let uri = Uri::parse("/x?expr=a%3Db").unwrap();
        assert_eq!(uri.query.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_percent_roundtrip() {
        assert_eq!(percent_decode("a%2Fb+c"), "a/b c");
        assert_eq!(percent_encode("a/b c"), "a%2Fb%20c");
        // Invalid escape passes through
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
