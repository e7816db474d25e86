//! Compression middleware
//!
//! Negotiates Accept-Encoding and pushes a streaming body transform plus
//! the matching Content-Encoding token. Supports gzip, brotli, and
//! deflate; priority br > gzip > deflate.

use crate::error::Result;
use crate::matcher::PathMatch;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Handler, HandlerFuture};
use crate::transform::BodyTransform;

/// Compression encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Brotli,
    Deflate,
    Identity,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Brotli => "br",
            Encoding::Deflate => "deflate",
            Encoding::Identity => "identity",
        }
    }

    /// Pick an encoding from Accept-Encoding tokens
    pub fn negotiate(tokens: &[String]) -> Self {
        if tokens.iter().any(|t| t == "br") {
            Encoding::Brotli
        } else if tokens.iter().any(|t| t == "gzip") {
            Encoding::Gzip
        } else if tokens.iter().any(|t| t == "deflate") {
            Encoding::Deflate
        } else {
            Encoding::Identity
        }
    }
}

/// Compression level
#[derive(Debug, Clone, Copy)]
pub enum CompressionLevel {
    Fast,
    Default,
    Best,
}

impl CompressionLevel {
    #[cfg_attr(not(feature = "compress"), allow(dead_code))]
    fn gzip_level(&self) -> u32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 6,
            CompressionLevel::Best => 9,
        }
    }

    #[cfg_attr(not(feature = "compress"), allow(dead_code))]
    fn brotli_level(&self) -> i32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 4,
            CompressionLevel::Best => 11,
        }
    }
}

/// Compress middleware
pub struct Compress {
    level: CompressionLevel,
}

impl Compress {
    pub fn new() -> Self {
        Self {
            level: CompressionLevel::Default,
        }
    }

    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for Compress {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Compress {
    fn call<'a>(
        &'a self,
        _matched: &'a PathMatch,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let tokens = req.headers.accept_encoding();
            let encoding = Encoding::negotiate(&tokens);
            if encoding != Encoding::Identity {
                res.add_content_encoding(encoding.as_str());
                res.push_body_transform(new_transform(encoding, self.level))?;
            }
            Ok(true)
        })
    }
}

#[cfg(feature = "compress")]
fn new_transform(encoding: Encoding, level: CompressionLevel) -> Box<dyn BodyTransform> {
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;

    match encoding {
        Encoding::Gzip => Box::new(GzipTransform {
            encoder: Some(GzEncoder::new(Vec::new(), Compression::new(level.gzip_level()))),
        }),
        Encoding::Deflate => Box::new(DeflateTransform {
            encoder: Some(DeflateEncoder::new(
                Vec::new(),
                Compression::new(level.gzip_level()),
            )),
        }),
        Encoding::Brotli => Box::new(BrotliTransform {
            input: Vec::new(),
            quality: level.brotli_level(),
        }),
        Encoding::Identity => Box::new(IdentityTransform),
    }
}

#[cfg(not(feature = "compress"))]
fn new_transform(_encoding: Encoding, _level: CompressionLevel) -> Box<dyn BodyTransform> {
    Box::new(IdentityTransform)
}

struct IdentityTransform;

impl BodyTransform for IdentityTransform {
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        Ok(chunk.to_vec())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[cfg(feature = "compress")]
struct GzipTransform {
    encoder: Option<flate2::write::GzEncoder<Vec<u8>>>,
}

#[cfg(feature = "compress")]
impl BodyTransform for GzipTransform {
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        use std::io::Write;
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(Vec::new());
        };
        encoder.write_all(chunk)?;
        Ok(std::mem::take(encoder.get_mut()))
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        match self.encoder.take() {
            Some(encoder) => Ok(encoder.finish()?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(feature = "compress")]
struct DeflateTransform {
    encoder: Option<flate2::write::DeflateEncoder<Vec<u8>>>,
}

#[cfg(feature = "compress")]
impl BodyTransform for DeflateTransform {
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        use std::io::Write;
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(Vec::new());
        };
        encoder.write_all(chunk)?;
        Ok(std::mem::take(encoder.get_mut()))
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        match self.encoder.take() {
            Some(encoder) => Ok(encoder.finish()?),
            None => Ok(Vec::new()),
        }
    }
}

/// Brotli has no cheap incremental flush, so input accumulates and the
/// whole stream is encoded at finish.
#[cfg(feature = "compress")]
struct BrotliTransform {
    input: Vec<u8>,
    quality: i32,
}

#[cfg(feature = "compress")]
impl BodyTransform for BrotliTransform {
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.input.extend_from_slice(chunk);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let params = brotli::enc::BrotliEncoderParams {
            quality: self.quality,
            ..Default::default()
        };
        let mut output = Vec::new();
        brotli::enc::BrotliCompress(
            &mut std::io::Cursor::new(std::mem::take(&mut self.input)),
            &mut output,
            &params,
        )?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_priority() {
        let tokens = |s: &str| crate::headers::parse_token_list(s);

        assert_eq!(
            Encoding::negotiate(&tokens("gzip, deflate, br")),
            Encoding::Brotli
        );
        assert_eq!(Encoding::negotiate(&tokens("gzip, deflate")), Encoding::Gzip);
        assert_eq!(Encoding::negotiate(&tokens("deflate")), Encoding::Deflate);
        assert_eq!(Encoding::negotiate(&tokens("")), Encoding::Identity);
        assert_eq!(Encoding::negotiate(&tokens("zstd")), Encoding::Identity);
    }

    #[cfg(feature = "compress")]
    #[test]
    fn test_gzip_transform_roundtrip() {
        use std::io::Read;

        let mut t = new_transform(Encoding::Gzip, CompressionLevel::Default);
        let mut wire = t.transform(b"hello ").unwrap();
        wire.extend(t.transform(b"world").unwrap());
        wire.extend(t.finish().unwrap());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(&wire[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[cfg(feature = "compress")]
    #[tokio::test]
    async fn test_compressed_response_over_connection() {
        use crate::connection::Connection;
        use crate::router::{handler_fn, Router};
        use std::io::Read;
        use std::net::SocketAddr;
        use std::sync::Arc;
        use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

        fn items<'a>(
            _m: &'a PathMatch,
            _req: &'a mut Request,
            res: &'a mut Response,
        ) -> HandlerFuture<'a> {
            Box::pin(async move {
                res.json(&vec![1, 2, 3]).await?;
                Ok(true)
            })
        }

        let mut router = Router::new();
        router.middleware(Compress::new()).unwrap();
        router.get("/api/v1/items", handler_fn(items)).unwrap();

        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let (client, server) = duplex(256 * 1024);
        let task = tokio::spawn(Connection::new(Arc::new(router), peer).run(server));

        let (mut cr, mut cw) = tokio::io::split(client);
        cw.write_all(
            b"GET /api/v1/items?limit=10 HTTP/1.1\r\nHost: x\r\nAccept-Encoding: gzip\r\n\r\n",
        )
        .await
        .unwrap();
        cw.shutdown().await.unwrap();
        drop(cw);

        let mut wire = Vec::new();
        cr.read_to_end(&mut wire).await.unwrap();
        task.await.unwrap();

        let text = String::from_utf8_lossy(&wire);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Transfer-Encoding: chunked\r\n"));
        assert!(text.contains("Content-Encoding: gzip\r\n"));

        // Reassemble the chunked body, then decompress it.
        let header_end = find_subsequence(&wire, b"\r\n\r\n").unwrap() + 4;
        let body = dechunk(&wire[header_end..]);
        let mut decoded = String::new();
        flate2::read::GzDecoder::new(&body[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "[1,2,3]");
    }

    #[cfg(feature = "compress")]
    fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// Minimal chunked-transfer decoder for test assertions
    #[cfg(feature = "compress")]
    fn dechunk(mut input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let line_end = find_subsequence(input, b"\r\n").expect("chunk size line");
            let size = usize::from_str_radix(
                std::str::from_utf8(&input[..line_end]).unwrap(),
                16,
            )
            .unwrap();
            input = &input[line_end + 2..];
            if size == 0 {
                break;
            }
            out.extend_from_slice(&input[..size]);
            input = &input[size + 2..];
        }
        out
    }
}
