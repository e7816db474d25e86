//! Per-connection request/response engine
//!
//! Owns one transport byte-stream. Inbound bytes feed the request
//! parser; on `HeadersLoaded` the connection applies its body policy,
//! builds a response around the write half, and drives the router. After
//! the response finishes the parser resets and leftover bytes replay,
//! which is how pipelining works. Parse and dispatch errors translate to
//! 400/505 pages or transport teardown.

use crate::error::{Error, Result, SyntaxSource};
use crate::parser::{ParserEvent, RequestParser};
use crate::request::{Body, Method, Request};
use crate::response::{ConnPref, Response, ResponseState, ResponseWriter};
use crate::router::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, error};

const READ_CHUNK: usize = 8 * 1024;

/// One accepted connection
pub struct Connection {
    router: Arc<Router>,
    peer: SocketAddr,
    server_ident: Option<String>,
}

impl Connection {
    pub fn new(router: Arc<Router>, peer: SocketAddr) -> Self {
        Self {
            router,
            peer,
            server_ident: None,
        }
    }

    /// Override the Server header emitted by responses on this connection
    pub fn server_ident(mut self, ident: impl Into<String>) -> Self {
        self.server_ident = Some(ident.into());
        self
    }

    fn family(&self) -> &'static str {
        if self.peer.is_ipv4() {
            "ipv4"
        } else {
            "ipv6"
        }
    }

    /// Drive the connection until the peer disconnects, keep-alive ends,
    /// or an error tears it down.
    pub async fn run<S>(self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (read_half, write_half) = split(stream);
        let writer: ResponseWriter = Box::new(write_half);
        if let Err(err) = self.serve(read_half, writer).await {
            // Teardown path: transport is dropped without further writes.
            error!(
                family = self.family(),
                peer = %self.peer,
                error = %err,
                "connection torn down"
            );
        }
    }

    async fn serve<R>(&self, mut read_half: R, writer: ResponseWriter) -> Result<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut parser = RequestParser::new();
        let mut req = Request::new();
        let mut writer = Some(writer);
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            loop {
                let take_writer = |writer: &mut Option<ResponseWriter>| {
                    writer
                        .take()
                        .ok_or_else(|| Error::invariant("transport writer missing"))
                };

                let event = match parser.poll_event(&mut req) {
                    Ok(event) => event,
                    Err(err) => {
                        return self.reject(take_writer(&mut writer)?, err).await;
                    }
                };
                match event {
                    Some(ParserEvent::HeadersLoaded) => {
                        if let Err(err) = self
                            .read_body(&mut parser, &mut req, &mut read_half)
                            .await
                        {
                            return self.reject(take_writer(&mut writer)?, err).await;
                        }

                        let w = take_writer(&mut writer)?;
                        let res = self.respond(&mut req, w).await?;
                        let keep_alive = res.connection() == ConnPref::KeepAlive;
                        writer = Some(res.into_writer());
                        parser.next(&mut req);
                        if !keep_alive {
                            return Ok(());
                        }
                    }
                    Some(_) => continue,
                    None => break,
                }
            }

            let n = read_half.read(&mut buf).await?;
            if n == 0 {
                debug!(peer = %self.peer, "peer closed connection");
                return Ok(());
            }
            parser.feed(&buf[..n]);
        }
    }

    /// Body policy: a request advertising Content-Length gets a buffered
    /// body installed and pumped to saturation before dispatch.
    async fn read_body<R>(
        &self,
        parser: &mut RequestParser,
        req: &mut Request,
        read_half: &mut R,
    ) -> Result<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let length = match req.header("content-length") {
            Some(_) => req
                .content_length()
                .ok_or(Error::syntax(SyntaxSource::HeaderValue))?,
            None => return Ok(()),
        };

        parser.install_body(req, Body::buffered(length))?;
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match parser.poll_event(req)? {
                Some(ParserEvent::Finished) => return Ok(()),
                Some(_) => continue,
                None => {
                    let n = read_half.read(&mut buf).await?;
                    if n == 0 {
                        return Err(Error::Networking(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "connection closed mid-body",
                        )));
                    }
                    parser.feed(&buf[..n]);
                }
            }
        }
    }

    /// Dispatch one parsed request and finalize its response.
    async fn respond(&self, req: &mut Request, writer: ResponseWriter) -> Result<Response> {
        let mut res = Response::new(writer);
        if let Some(ident) = &self.server_ident {
            res.set_server_ident(ident.clone());
        }
        if req.method == Method::Head {
            res.set_exclude_body(true);
        }
        if req.headers.connection().iter().any(|t| t == "close") {
            res.set_connection(ConnPref::Close);
        }

        debug!(
            peer = %self.peer,
            method = %req.method,
            path = req.path(),
            "dispatching request"
        );

        match self.router.handle(req, &mut res).await {
            Ok(()) => match res.state() {
                ResponseState::WritingStatus => {
                    // No handler wrote anything.
                    res.buffer(b"Not found\n", 404, "text/plain; charset=utf-8")
                        .await?;
                    Ok(res)
                }
                ResponseState::Finished => Ok(res),
                _ => {
                    res.end().await?;
                    Ok(res)
                }
            },
            Err(err) if err.is_respondable() && res.state() == ResponseState::WritingStatus => {
                // Let the shared translation write the page, then bubble
                // the close decision through the connection preference.
                self.write_error_page(&mut res, &err).await?;
                res.set_connection(ConnPref::Close);
                Ok(res)
            }
            Err(err) => {
                error!(
                    family = self.family(),
                    peer = %self.peer,
                    error = %err,
                    "handler failed past the status line"
                );
                Err(err)
            }
        }
    }

    /// Answer a parse-level failure on a fresh response, then close.
    async fn reject(&self, writer: ResponseWriter, err: Error) -> Result<()> {
        if !err.is_respondable() {
            error!(
                family = self.family(),
                peer = %self.peer,
                error = %err,
                "unrecoverable connection error"
            );
            return Err(err);
        }

        debug!(peer = %self.peer, error = %err, "rejecting malformed request");
        let mut res = Response::new(writer);
        if let Some(ident) = &self.server_ident {
            res.set_server_ident(ident.clone());
        }
        res.set_connection(ConnPref::Close);
        self.write_error_page(&mut res, &err).await?;
        Ok(())
    }

    async fn write_error_page(&self, res: &mut Response, err: &Error) -> Result<()> {
        let (code, title) = match err {
            Error::Syntax(_) => (400, "Bad request"),
            Error::VersionNotSupported(_) => (505, "HTTP version not supported"),
            _ => (500, "Internal server error"),
        };
        let page = format!(
            "<html><head><title>{code} {title}</title></head>\
             <body><h1>{code} {title}</h1><p>{err}</p></body></html>\n"
        );
        res.set_connection(ConnPref::Close);
        res.buffer(page.as_bytes(), code, "text/html; charset=utf-8")
            .await
    }
}
