//! Error types for squall-core

use thiserror::Error;

/// Result type alias for squall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of request decoding produced a syntax error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxSource {
    RequestLine,
    RequestHeaders,
    RequestBody,
    HeaderValue,
}

impl std::fmt::Display for SyntaxSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyntaxSource::RequestLine => "request line",
            SyntaxSource::RequestHeaders => "request headers",
            SyntaxSource::RequestBody => "request body",
            SyntaxSource::HeaderValue => "header value",
        };
        f.write_str(s)
    }
}

/// Error types for the squall HTTP server core
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input on the wire
    #[error("syntax error in {0}")]
    Syntax(SyntaxSource),

    /// The request line carried a version other than HTTP/1.1
    #[error("HTTP version not supported: {0}")]
    VersionNotSupported(String),

    /// Transport-level failure
    #[error("network error: {0}")]
    Networking(#[from] std::io::Error),

    /// Programmer error: wrong state transition, duplicate route parameter,
    /// unknown status code without a reason phrase
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// TLS setup error
    #[cfg(feature = "tls")]
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Shorthand for syntax errors
    pub fn syntax(source: SyntaxSource) -> Self {
        Error::Syntax(source)
    }

    /// Shorthand for invariant violations
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// True for errors that can still be answered with an HTTP error page
    pub fn is_respondable(&self) -> bool {
        matches!(self, Error::Syntax(_) | Error::VersionNotSupported(_))
    }
}
