//! Built-in middleware
//!
//! Middleware are ordinary routing callbacks, usually registered with
//! [`Router::middleware`](crate::router::Router::middleware): they run in
//! chain order, publish artifacts through the request bag or response
//! transforms, and return `false` to short-circuit.

pub mod cache;
pub mod compress;
pub mod cookie;

pub use cache::{Cache, CachedResponse};
pub use compress::{Compress, CompressionLevel, Encoding};
pub use cookie::{Cookie, CookieJar, Cookies, SameSite};
