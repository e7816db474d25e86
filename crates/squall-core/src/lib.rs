//! squall-core: HTTP/1.1 server core
//!
//! A per-connection request/response engine: an incremental request
//! parser with pipelining, a composable router with nested sub-routers
//! and short-circuiting middleware chains, and a streaming response
//! writer with pluggable transform stages and automatic
//! transfer-encoding selection.
//!
//! ## Features
//! - `compress` - gzip/brotli/deflate body transforms
//! - `tls` - TLS listeners via rustls

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod connection;
pub mod error;
pub mod headers;
pub mod matcher;
pub mod middleware;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod status;
pub mod transform;
pub mod uri;
pub mod util;

#[cfg(feature = "tls")]
pub mod tls;

// Re-exports
pub use connection::Connection;
pub use error::{Error, Result, SyntaxSource};
pub use headers::{ByteRange, ContentRange, HeaderMap, MediaType};
pub use matcher::{PathMatch, PathPattern};
pub use parser::{ParserEvent, ParserState, RequestParser};
pub use request::{Bag, Body, Method, Request};
pub use response::{ConnPref, Response, ResponseState, ResponseWriter, TemplateEngine};
pub use router::{handler_fn, Endpoint, Handler, HandlerFn, HandlerFuture, Router};
pub use server::{Server, ServerConfig};
pub use transform::BodyTransform;
pub use uri::{QueryMap, Uri};

// Middleware re-exports
pub use middleware::{Cache, Compress, Cookie, CookieJar, Cookies};

// Utility re-exports
pub use util::{FifoQueue, Scheduler, TtlCache};

#[cfg(feature = "tls")]
pub use tls::{load_certs, load_private_key, TlsConfig};
