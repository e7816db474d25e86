//! Route pattern compilation and matching
//!
//! A pattern is split into segments: literals, `:name` parameters, and an
//! optional trailing `*` wildcard. Each pattern compiles to a single
//! anchored regex with named capture groups; the wildcard captures into
//! the reserved `__remainder__` group.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;

const REMAINDER_GROUP: &str = "__remainder__";

/// Result of a successful pattern match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Captured named parameters
    pub params: HashMap<String, String>,
    /// Suffix consumed by a trailing wildcard, when the pattern has one
    pub remainder: Option<String>,
}

impl PathMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    param_names: Vec<String>,
    has_wildcard: bool,
}

/// Collapse runs of `/` and strip a single leading and trailing slash.
///
/// `////foo///bar/` → `foo/bar`; the root path normalizes to the empty
/// string.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = true; // strips the leading slash
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.ends_with('/') {
        out.pop();
    }
    out
}

fn valid_param_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// Fails with an invariant violation on empty or invalid parameter
    /// names, duplicate names, a reserved `__name__` parameter, or a
    /// wildcard that is not the final segment.
    pub fn compile(pattern: &str) -> Result<Self> {
        let normalized = normalize(pattern);
        let segments: Vec<&str> = if normalized.is_empty() {
            Vec::new()
        } else {
            normalized.split('/').collect()
        };

        let mut regex_src = String::from("^");
        let mut param_names: Vec<String> = Vec::new();
        let mut has_wildcard = false;

        for (i, segment) in segments.iter().enumerate() {
            if *segment == "*" {
                if i != segments.len() - 1 {
                    return Err(Error::invariant(format!(
                        "wildcard must be the final segment in pattern {pattern:?}"
                    )));
                }
                has_wildcard = true;
                if i == 0 {
                    regex_src.push_str(&format!("(?P<{REMAINDER_GROUP}>.*)"));
                } else {
                    regex_src.push_str(&format!("(?:/(?P<{REMAINDER_GROUP}>.*))?"));
                }
            } else if let Some(name) = segment.strip_prefix(':') {
                if !valid_param_name(name) {
                    return Err(Error::invariant(format!(
                        "invalid parameter name {name:?} in pattern {pattern:?}"
                    )));
                }
                if name.starts_with("__") && name.ends_with("__") {
                    return Err(Error::invariant(format!(
                        "parameter name {name:?} uses the reserved __name__ namespace"
                    )));
                }
                if param_names.iter().any(|n| n == name) {
                    return Err(Error::invariant(format!(
                        "duplicate parameter name {name:?} in pattern {pattern:?}"
                    )));
                }
                if i > 0 {
                    regex_src.push('/');
                }
                // Group names are positional: parameter names may contain
                // dashes, which regex group names cannot.
                regex_src.push_str(&format!("(?P<p{}>[^/]+)", param_names.len()));
                param_names.push(name.to_string());
            } else {
                if i > 0 {
                    regex_src.push('/');
                }
                regex_src.push_str(&regex::escape(segment));
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src)
            .map_err(|e| Error::invariant(format!("pattern {pattern:?} failed to compile: {e}")))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            param_names,
            has_wildcard,
        })
    }

    /// Match an input path, normalized the same way as the pattern.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let normalized = normalize(path);
        let captures = self.regex.captures(&normalized)?;

        let mut params = HashMap::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(m) = captures.name(&format!("p{i}")) {
                params.insert(name.clone(), m.as_str().to_string());
            }
        }

        let remainder = if self.has_wildcard {
            Some(
                captures
                    .name(REMAINDER_GROUP)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        Some(PathMatch { params, remainder })
    }

    /// The pattern text this matcher was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_wildcard(&self) -> bool {
        self.has_wildcard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let p = PathPattern::compile("/users/list").unwrap();
        assert!(p.matches("/users/list").is_some());
        assert!(p.matches("/users").is_none());
        assert!(p.matches("/users/list/extra").is_none());
    }

    #[test]
    fn test_named_params() {
        let p = PathPattern::compile("/users/:id/posts/:post-id").unwrap();
        let m = p.matches("/users/42/posts/7").unwrap();
        assert_eq!(m.param("id"), Some("42"));
        assert_eq!(m.param("post-id"), Some("7"));
        assert_eq!(m.remainder, None);
    }

    #[test]
    fn test_wildcard_remainder() {
        let p = PathPattern::compile("/files/*").unwrap();
        let m = p.matches("/files/docs/readme.md").unwrap();
        assert_eq!(m.remainder.as_deref(), Some("docs/readme.md"));

        // A bare prefix still matches with an empty remainder.
        let m = p.matches("/files").unwrap();
        assert_eq!(m.remainder.as_deref(), Some(""));
    }

    #[test]
    fn test_root_wildcard_matches_everything() {
        let p = PathPattern::compile("*").unwrap();
        assert_eq!(
            p.matches("/a/b/c").unwrap().remainder.as_deref(),
            Some("a/b/c")
        );
        assert_eq!(p.matches("/").unwrap().remainder.as_deref(), Some(""));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize("////foo///"), "foo");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("/a//b"), "a/b");

        let p = PathPattern::compile("/foo/bar").unwrap();
        assert!(p.matches("//foo///bar/").is_some());
    }

    #[test]
    fn test_match_is_idempotent_under_normalization() {
        let p = PathPattern::compile("/a/:x/*").unwrap();
        let raw = "//a///1/rest//of/it";
        let cleaned = format!("/{}", normalize(raw));
        assert_eq!(p.matches(raw), p.matches(&cleaned));
    }

    #[test]
    fn test_compile_errors() {
        assert!(PathPattern::compile("/a/:").is_err());
        assert!(PathPattern::compile("/a/:bad!name").is_err());
        assert!(PathPattern::compile("/a/:__x__").is_err());
        assert!(PathPattern::compile("/a/:id/b/:id").is_err());
        assert!(PathPattern::compile("/a/*/b").is_err());
    }

    #[test]
    fn test_literal_with_regex_metacharacters() {
        let p = PathPattern::compile("/v1.0/items").unwrap();
        assert!(p.matches("/v1.0/items").is_some());
        assert!(p.matches("/v1x0/items").is_none());
    }
}
