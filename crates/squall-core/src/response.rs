//! Streaming response writer
//!
//! Emits a well-formed HTTP/1.1 response while letting middleware
//! register body transforms and header observers before the payload is
//! known. Transfer encoding is chosen lazily when the body phase starts:
//! chunked when the body size is unknown or any body transform is
//! attached, fixed-length otherwise.

use crate::error::{Error, Result};
use crate::status::canonical_phrase;
use crate::transform::{apply, finish_all, BodyTransform};
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Boxed transport write half
pub type ResponseWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Response lifecycle; advances monotonically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponseState {
    WritingStatus,
    WritingHeaders,
    WritingBody,
    Finished,
}

/// Connection preference echoed in the Connection header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnPref {
    KeepAlive,
    Close,
}

impl ConnPref {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnPref::KeepAlive => "keep-alive",
            ConnPref::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WireEncoding {
    Fixed { remaining: u64 },
    Chunked,
}

type StatusTap = Box<dyn FnMut(u16) + Send>;
type HeaderTap = Box<dyn FnMut(&str, &str) + Send>;

/// Streaming HTTP response
pub struct Response {
    writer: ResponseWriter,
    state: ResponseState,
    server_ident: String,
    status_code: Option<u16>,
    queued_headers: Vec<(String, String)>,
    emitted_names: Vec<String>,
    body_transforms: Vec<Box<dyn BodyTransform>>,
    raw_transforms: Vec<Box<dyn BodyTransform>>,
    body_size: Option<u64>,
    connection: ConnPref,
    transfer_encodings: Vec<String>,
    content_encodings: Vec<String>,
    exclude_body: bool,
    encoding: Option<WireEncoding>,
    status_taps: Vec<StatusTap>,
    header_taps: Vec<HeaderTap>,
}

fn default_server_ident() -> String {
    format!(
        "squall/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

impl Response {
    pub fn new(writer: ResponseWriter) -> Self {
        Self {
            writer,
            state: ResponseState::WritingStatus,
            server_ident: default_server_ident(),
            status_code: None,
            queued_headers: Vec::new(),
            emitted_names: Vec::new(),
            body_transforms: Vec::new(),
            raw_transforms: Vec::new(),
            body_size: None,
            connection: ConnPref::KeepAlive,
            transfer_encodings: Vec::new(),
            content_encodings: Vec::new(),
            exclude_body: false,
            encoding: None,
            status_taps: Vec::new(),
            header_taps: Vec::new(),
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Status code already emitted, for downstream taps
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn set_server_ident(&mut self, ident: impl Into<String>) {
        self.server_ident = ident.into();
    }

    /// Suppress body bytes while keeping the headers a GET would produce
    pub fn set_exclude_body(&mut self, exclude: bool) {
        self.exclude_body = exclude;
    }

    pub fn exclude_body(&self) -> bool {
        self.exclude_body
    }

    pub fn set_connection(&mut self, pref: ConnPref) {
        self.connection = pref;
    }

    pub fn connection(&self) -> ConnPref {
        self.connection
    }

    /// Declare the body size, enabling fixed-length transmission when no
    /// body transform is attached
    pub fn set_body_size(&mut self, size: u64) -> Result<()> {
        if self.state >= ResponseState::WritingBody {
            return Err(Error::invariant("body size set after body start"));
        }
        self.body_size = Some(size);
        Ok(())
    }

    pub fn body_size(&self) -> Option<u64> {
        self.body_size
    }

    /// Record a Content-Encoding token; the matching transform is pushed
    /// separately
    pub fn add_content_encoding(&mut self, token: impl Into<String>) {
        self.content_encodings.push(token.into());
    }

    /// Push a body-level transform (between caller writes and framing).
    /// The last transform pushed is the outermost.
    pub fn push_body_transform(&mut self, t: Box<dyn BodyTransform>) -> Result<()> {
        if self.state >= ResponseState::WritingBody {
            return Err(Error::invariant("transform pushed after body start"));
        }
        self.body_transforms.push(t);
        Ok(())
    }

    /// Push a raw-level transform (between framing and socket).
    ///
    /// Reserved for encoding layers that must see framed output; most
    /// middleware wants [`push_body_transform`](Self::push_body_transform).
    pub fn push_raw_transform(&mut self, t: Box<dyn BodyTransform>) -> Result<()> {
        if self.state >= ResponseState::WritingBody {
            return Err(Error::invariant("transform pushed after body start"));
        }
        self.raw_transforms.push(t);
        Ok(())
    }

    pub fn has_body_transforms(&self) -> bool {
        !self.body_transforms.is_empty()
    }

    /// Observe the status line
    pub fn on_status(&mut self, tap: impl FnMut(u16) + Send + 'static) {
        self.status_taps.push(Box::new(tap));
    }

    /// Observe each emitted header
    pub fn on_header(&mut self, tap: impl FnMut(&str, &str) + Send + 'static) {
        self.header_taps.push(Box::new(tap));
    }

    // ===== Status and headers =====

    /// Write the status line. Must happen exactly once; enqueued headers
    /// flush immediately after.
    pub async fn write_status(&mut self, code: u16, phrase: Option<&str>) -> Result<()> {
        if self.state != ResponseState::WritingStatus {
            return Err(Error::invariant("status written twice"));
        }
        let phrase = match phrase {
            Some(p) => p.to_string(),
            None => canonical_phrase(code)
                .ok_or_else(|| {
                    Error::invariant(format!("no canonical phrase for status {code}"))
                })?
                .to_string(),
        };

        let line = format!("HTTP/1.1 {code} {phrase}\r\n");
        self.raw_write(line.as_bytes()).await?;
        self.status_code = Some(code);
        for tap in &mut self.status_taps {
            tap(code);
        }

        self.state = ResponseState::WritingHeaders;
        let queued = std::mem::take(&mut self.queued_headers);
        for (name, value) in queued {
            self.emit_header(&name, &value).await?;
        }
        Ok(())
    }

    /// Write a header. Before the status line it is enqueued; afterwards
    /// it goes out immediately.
    pub async fn write_header(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        match self.state {
            ResponseState::WritingStatus => {
                self.queued_headers.push((name.to_string(), value.into()));
                Ok(())
            }
            ResponseState::WritingHeaders => self.emit_header(name, &value.into()).await,
            _ => Err(Error::invariant("header written after body start")),
        }
    }

    async fn emit_header(&mut self, name: &str, value: &str) -> Result<()> {
        let line = format!("{name}: {value}\r\n");
        self.raw_write(line.as_bytes()).await?;
        self.emitted_names.push(name.to_ascii_lowercase());
        for tap in &mut self.header_taps {
            tap(name, value);
        }
        Ok(())
    }

    // ===== Body =====

    /// Finish the header section and pick the transfer encoding
    async fn begin_body(&mut self) -> Result<()> {
        match self.state {
            ResponseState::WritingStatus => {
                return Err(Error::invariant("body started before status"))
            }
            ResponseState::WritingHeaders => {}
            _ => return Ok(()),
        }

        let chunked = self.body_size.is_none() || !self.body_transforms.is_empty();
        if chunked {
            self.transfer_encodings.push("chunked".to_string());
        }

        if !self.content_encodings.is_empty() {
            let tokens = self.content_encodings.join(", ");
            self.emit_header("Content-Encoding", &tokens).await?;
        }
        if chunked {
            let tokens = self.transfer_encodings.join(", ");
            self.emit_header("Transfer-Encoding", &tokens).await?;
            self.encoding = Some(WireEncoding::Chunked);
        } else {
            let size = self.body_size.unwrap_or(0);
            self.emit_header("Content-Length", &size.to_string()).await?;
            self.encoding = Some(WireEncoding::Fixed { remaining: size });
        }

        if !self.emitted_names.iter().any(|n| n == "date") {
            let date = httpdate::fmt_http_date(SystemTime::now());
            self.emit_header("Date", &date).await?;
        }
        if !self.emitted_names.iter().any(|n| n == "server") {
            let ident = self.server_ident.clone();
            self.emit_header("Server", &ident).await?;
        }
        if !self.emitted_names.iter().any(|n| n == "connection") {
            let pref = self.connection.as_str();
            self.emit_header("Connection", pref).await?;
        }

        self.raw_write(b"\r\n").await?;
        self.state = ResponseState::WritingBody;
        Ok(())
    }

    /// Write body bytes through the transform pipeline and framing.
    pub async fn write_body(&mut self, chunk: &[u8]) -> Result<()> {
        self.begin_body().await?;
        let data = apply(&mut self.body_transforms, chunk)?;
        self.frame_write(&data).await
    }

    /// Flush transforms, emit the final framing, and finish the response.
    pub async fn end(&mut self) -> Result<()> {
        self.begin_body().await?;
        if self.state == ResponseState::Finished {
            return Ok(());
        }

        let tail = finish_all(&mut self.body_transforms)?;
        self.frame_write(&tail).await?;

        match self.encoding {
            Some(WireEncoding::Chunked) => {
                if !self.exclude_body {
                    self.raw_write(b"0\r\n\r\n").await?;
                }
            }
            Some(WireEncoding::Fixed { remaining }) => {
                if remaining != 0 && !self.exclude_body {
                    return Err(Error::invariant(format!(
                        "fixed-length body short by {remaining} bytes"
                    )));
                }
            }
            None => {}
        }

        let raw_tail = finish_all(&mut self.raw_transforms)?;
        if !raw_tail.is_empty() {
            self.writer.write_all(&raw_tail).await?;
        }
        self.writer.flush().await?;
        self.state = ResponseState::Finished;
        Ok(())
    }

    /// Frame and send already-transformed body bytes
    async fn frame_write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if self.exclude_body {
            // HEAD: account for fixed-length bookkeeping, send nothing.
            if let Some(WireEncoding::Fixed { remaining }) = &mut self.encoding {
                *remaining = remaining.saturating_sub(data.len() as u64);
            }
            return Ok(());
        }
        match &mut self.encoding {
            Some(WireEncoding::Chunked) => {
                let head = format!("{:x}\r\n", data.len());
                self.raw_write(head.as_bytes()).await?;
                self.raw_write(data).await?;
                self.raw_write(b"\r\n").await
            }
            Some(WireEncoding::Fixed { remaining }) => {
                if (data.len() as u64) > *remaining {
                    return Err(Error::invariant("body exceeds declared size"));
                }
                *remaining -= data.len() as u64;
                self.raw_write(data).await
            }
            None => Err(Error::invariant("body write before body start")),
        }
    }

    /// Lowest write layer: raw transforms, then the socket
    async fn raw_write(&mut self, bytes: &[u8]) -> Result<()> {
        let data = apply(&mut self.raw_transforms, bytes)?;
        if !data.is_empty() {
            self.writer.write_all(&data).await?;
        }
        Ok(())
    }

    /// Recover the transport write half once the response is finished
    pub fn into_writer(self) -> ResponseWriter {
        self.writer
    }

    // ===== Convenience responses =====

    /// Complete response from a byte buffer with an explicit status and
    /// media type
    pub async fn buffer(&mut self, bytes: &[u8], status: u16, media_type: &str) -> Result<()> {
        self.set_body_size(bytes.len() as u64)?;
        self.write_status(status, None).await?;
        self.write_header("Content-Type", media_type).await?;
        self.write_body(bytes).await?;
        self.end().await
    }

    /// `200 text/plain` response
    pub async fn text(&mut self, body: &str) -> Result<()> {
        self.buffer(body.as_bytes(), 200, "text/plain; charset=utf-8")
            .await
    }

    /// `200 text/html` response
    pub async fn html(&mut self, body: &str) -> Result<()> {
        self.buffer(body.as_bytes(), 200, "text/html; charset=utf-8")
            .await
    }

    /// Serialize `value` as a `200 application/json` response
    pub async fn json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::invariant(format!("json serialization failed: {e}")))?;
        self.buffer(&body, 200, "application/json").await
    }

    /// Redirect with a Location header
    pub async fn redirect(&mut self, location: &str, status: u16) -> Result<()> {
        let body = format!("Redirecting to {location}\n");
        self.set_body_size(body.len() as u64)?;
        self.write_status(status, None).await?;
        self.write_header("Location", location).await?;
        self.write_header("Content-Type", "text/plain; charset=utf-8")
            .await?;
        self.write_body(body.as_bytes()).await?;
        self.end().await
    }

    /// Stream a file from disk.
    ///
    /// Stats the path for its size so transform-free responses go out
    /// fixed-length; the media type comes from the extension table.
    pub async fn file(&mut self, path: impl AsRef<Path>, status: u16) -> Result<()> {
        use tokio::io::AsyncReadExt;

        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        self.set_body_size(meta.len())?;

        self.write_status(status, None).await?;
        self.write_header("Content-Type", media_type_for(path)).await?;

        if self.exclude_body {
            // Headers must still reflect what a GET would produce.
            self.begin_body().await?;
            return self.end().await;
        }

        let mut file = tokio::fs::File::open(path).await?;
        let mut chunk = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.write_body(&chunk[..n]).await?;
        }
        self.end().await
    }

    /// Render a template to a `text/html` response
    pub async fn render(
        &mut self,
        engine: &dyn TemplateEngine,
        template: &str,
        data: &serde_json::Value,
        status: u16,
    ) -> Result<()> {
        let body = engine.render(template, data)?;
        self.buffer(body.as_bytes(), status, "text/html; charset=utf-8")
            .await
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("state", &self.state)
            .field("status_code", &self.status_code)
            .field("body_size", &self.body_size)
            .field("exclude_body", &self.exclude_body)
            .finish()
    }
}

/// Templating hook; engines live outside the core
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, data: &serde_json::Value) -> Result<String>;
}

/// Media type for a file extension; unknown extensions are served as
/// octet-stream
pub fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("txt") => "text/plain",
        Some("jpg") => "image/jpeg",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn collect(mut rx: tokio::io::DuplexStream) -> Vec<u8> {
        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        out
    }

    fn pair() -> (Response, tokio::io::DuplexStream) {
        let (tx, rx) = tokio::io::duplex(256 * 1024);
        (Response::new(Box::new(tx)), rx)
    }

    #[tokio::test]
    async fn test_fixed_length_wire() {
        let (mut res, rx) = pair();
        res.set_body_size(2).unwrap();
        res.write_status(200, None).await.unwrap();
        res.write_header("Content-Type", "text/plain").await.unwrap();
        res.write_body(b"ok").await.unwrap();
        res.end().await.unwrap();
        assert_eq!(res.state(), ResponseState::Finished);
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("Content-Length: 2\r\n"));
        assert!(!wire.contains("Transfer-Encoding"));
        assert!(wire.ends_with("\r\n\r\nok"));
    }

    #[tokio::test]
    async fn test_unknown_size_goes_chunked() {
        let (mut res, rx) = pair();
        res.write_status(200, None).await.unwrap();
        res.write_body(b"hello ").await.unwrap();
        res.write_body(b"world").await.unwrap();
        res.end().await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("Transfer-Encoding: chunked\r\n"));
        assert!(wire.contains("6\r\nhello \r\n"));
        assert!(wire.contains("5\r\nworld\r\n"));
        assert!(wire.ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_transform_forces_chunked_despite_size() {
        struct Identity;
        impl BodyTransform for Identity {
            fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
                Ok(chunk.to_vec())
            }
            fn finish(&mut self) -> Result<Vec<u8>> {
                Ok(Vec::new())
            }
        }

        let (mut res, rx) = pair();
        res.set_body_size(2).unwrap();
        res.push_body_transform(Box::new(Identity)).unwrap();
        res.write_status(200, None).await.unwrap();
        res.write_body(b"ok").await.unwrap();
        res.end().await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("Transfer-Encoding: chunked\r\n"));
        assert!(!wire.contains("Content-Length"));
        assert!(wire.ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_enqueued_headers_flush_after_status() {
        let (mut res, rx) = pair();
        res.write_header("X-Early", "yes").await.unwrap(); // enqueued
        res.set_body_size(0).unwrap();
        res.write_status(204, None).await.unwrap();
        res.end().await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        let status_pos = wire.find("HTTP/1.1 204").unwrap();
        let header_pos = wire.find("X-Early: yes").unwrap();
        assert!(status_pos < header_pos);
    }

    #[tokio::test]
    async fn test_head_suppresses_body_keeps_headers() {
        let (mut res, rx) = pair();
        res.set_exclude_body(true);
        res.buffer(b"hello", 200, "text/plain").await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("Content-Length: 5\r\n"));
        assert!(wire.contains("Content-Type: text/plain\r\n"));
        // Nothing after the header terminator.
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_double_status_is_invariant_violation() {
        let (mut res, _rx) = pair();
        res.write_status(200, None).await.unwrap();
        let err = res.write_status(200, None).await.unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_unknown_status_without_phrase() {
        let (mut res, _rx) = pair();
        let err = res.write_status(299, None).await.unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));

        // A supplied phrase makes any code legal.
        let (mut res, _rx) = pair();
        res.write_status(299, Some("Custom")).await.unwrap();
    }

    #[tokio::test]
    async fn test_body_overrun_is_invariant_violation() {
        let (mut res, _rx) = pair();
        res.set_body_size(1).unwrap();
        res.write_status(200, None).await.unwrap();
        let err = res.write_body(b"too long").await.unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_taps_fire_in_order() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let (mut res, _rx) = pair();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        res.on_status(move |code| l.lock().push(format!("status:{code}")));
        let l = log.clone();
        res.on_header(move |name, _| l.lock().push(format!("header:{name}")));

        res.set_body_size(0).unwrap();
        res.write_status(200, None).await.unwrap();
        res.write_header("X-One", "1").await.unwrap();
        res.write_header("X-Two", "2").await.unwrap();
        res.end().await.unwrap();

        let log = log.lock();
        assert_eq!(log[0], "status:200");
        let one = log.iter().position(|e| e == "header:X-One").unwrap();
        let two = log.iter().position(|e| e == "header:X-Two").unwrap();
        assert!(one < two);
    }

    #[tokio::test]
    async fn test_default_headers_present() {
        let (mut res, rx) = pair();
        res.text("hi").await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("\r\nDate: "));
        assert!(wire.contains("\r\nServer: squall/"));
        assert!(wire.contains("\r\nConnection: keep-alive\r\n"));
    }

    #[tokio::test]
    async fn test_connection_preference_echoed() {
        let (mut res, rx) = pair();
        res.set_connection(ConnPref::Close);
        res.text("bye").await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("\r\nConnection: close\r\n"));
    }

    #[tokio::test]
    async fn test_redirect() {
        let (mut res, rx) = pair();
        res.redirect("/new", 301).await.unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.starts_with("HTTP/1.1 301 Moved permanently\r\n"));
        assert!(wire.contains("Location: /new\r\n"));
    }

    #[tokio::test]
    async fn test_render_uses_engine_output() {
        struct Upcase;
        impl TemplateEngine for Upcase {
            fn render(&self, template: &str, data: &serde_json::Value) -> Result<String> {
                Ok(format!("{}:{}", template.to_uppercase(), data["name"]))
            }
        }

        let (mut res, rx) = pair();
        res.render(&Upcase, "greet", &serde_json::json!({"name": "ada"}), 200)
            .await
            .unwrap();
        drop(res);

        let wire = String::from_utf8(collect(rx).await).unwrap();
        assert!(wire.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(wire.ends_with("GREET:\"ada\""));
    }

    #[tokio::test]
    async fn test_file_is_fixed_length_with_media_type() {
        let path = std::env::temp_dir().join(format!("squall-file-{}.html", std::process::id()));
        let content = vec![b'x'; 412];
        std::fs::write(&path, &content).unwrap();

        let (mut res, rx) = pair();
        res.file(&path, 200).await.unwrap();
        drop(res);

        let wire = collect(rx).await;
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 412\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        let body_start = text.find("\r\n\r\n").unwrap() + 4;
        assert_eq!(text.len() - body_start, 412);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_head_file_keeps_length_drops_body() {
        let path = std::env::temp_dir().join(format!("squall-head-{}.html", std::process::id()));
        std::fs::write(&path, vec![b'y'; 412]).unwrap();

        let (mut res, rx) = pair();
        res.set_exclude_body(true);
        res.file(&path, 200).await.unwrap();
        drop(res);

        let text = String::from_utf8(collect(rx).await).unwrap();
        assert!(text.contains("Content-Length: 412\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.ends_with("\r\n\r\n"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_media_type_table() {
        assert_eq!(media_type_for(Path::new("a/index.html")), "text/html");
        assert_eq!(media_type_for(Path::new("x.txt")), "text/plain");
        assert_eq!(media_type_for(Path::new("x.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("x.css")), "text/css");
        assert_eq!(media_type_for(Path::new("x.js")), "text/javascript");
        assert_eq!(media_type_for(Path::new("x.mp4")), "video/mp4");
        assert_eq!(
            media_type_for(Path::new("x.wasm")),
            "application/octet-stream"
        );
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }
}
