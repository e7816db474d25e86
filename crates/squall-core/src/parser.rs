//! Incremental request parser
//!
//! A pull-based state machine over a byte accumulator. Callers append
//! bytes with [`RequestParser::feed`] and drain lifecycle events with
//! [`RequestParser::poll_event`]; the parser mutates the [`Request`] it
//! is handed as parts become available.
//!
//! Body parsing only begins once an actor installs a [`Body`] on the
//! request (after inspecting Content-Length); without one the request
//! finishes at the header boundary.

use crate::error::{Error, Result, SyntaxSource};
use crate::request::{Body, Method, Request};
use crate::uri::Uri;
use crate::util::FifoQueue;
use bytes::{Buf, BytesMut};

const SUPPORTED_VERSION: &str = "HTTP/1.1";

/// Parser lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingRequestLine,
    AwaitingHeaders,
    AwaitingBody,
    Finished,
}

/// Lifecycle events, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserEvent {
    /// Request line parsed: method, target, and version are set
    LineLoaded,
    /// Header section complete
    HeadersLoaded,
    /// Installed body saturated
    BodyLoaded,
    /// Request fully parsed; the connection may dispatch freely
    Finished,
}

/// Incremental HTTP/1.1 request parser
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    buf: BytesMut,
    /// HeadersLoaded emitted, body decision still pending
    headers_done: bool,
    events: FifoQueue<ParserEvent>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingRequestLine,
            buf: BytesMut::with_capacity(4 * 1024),
            headers_done: false,
            events: FifoQueue::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Append raw bytes to the accumulator
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Install a body sink on the request.
    ///
    /// Legal only between `HeadersLoaded` and the finish decision; the
    /// parser then routes accumulator bytes through `body.update` until
    /// saturation.
    pub fn install_body(&mut self, req: &mut Request, body: Body) -> Result<()> {
        if !(self.headers_done && self.state == ParserState::AwaitingHeaders) {
            return Err(Error::invariant(
                "body can only be installed after headers are loaded",
            ));
        }
        req.body = Some(body);
        self.state = ParserState::AwaitingBody;
        Ok(())
    }

    /// Reset for the next pipelined request on the same connection.
    ///
    /// Request fields return to defaults; leftover accumulator bytes are
    /// replayed into the new parse.
    pub fn next(&mut self, req: &mut Request) {
        req.reset();
        self.state = ParserState::AwaitingRequestLine;
        self.headers_done = false;
        self.events.clear();
    }

    /// Advance the state machine and return the next lifecycle event.
    ///
    /// `Ok(None)` means more bytes are needed.
    pub fn poll_event(&mut self, req: &mut Request) -> Result<Option<ParserEvent>> {
        loop {
            if let Some(event) = self.events.pop() {
                return Ok(Some(event));
            }

            match self.state {
                ParserState::AwaitingRequestLine => {
                    let Some(line) = self.take_line(SyntaxSource::RequestLine)? else {
                        return Ok(None);
                    };
                    self.parse_request_line(req, &line)?;
                    self.state = ParserState::AwaitingHeaders;
                    self.events.push(ParserEvent::LineLoaded);
                }
                ParserState::AwaitingHeaders if !self.headers_done => {
                    let Some(line) = self.take_line(SyntaxSource::RequestHeaders)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.headers_done = true;
                        self.events.push(ParserEvent::HeadersLoaded);
                    } else {
                        parse_header_line(req, &line)?;
                    }
                }
                ParserState::AwaitingHeaders => {
                    // HeadersLoaded was delivered and nothing installed a
                    // body: the request is complete.
                    self.state = ParserState::Finished;
                    self.events.push(ParserEvent::Finished);
                }
                ParserState::AwaitingBody => {
                    let body = req.body.as_mut().ok_or_else(|| {
                        Error::invariant("parser in AwaitingBody without an installed body")
                    })?;
                    if !body.saturated() {
                        if self.buf.is_empty() {
                            return Ok(None);
                        }
                        let consumed = body.update(&self.buf);
                        self.buf.advance(consumed);
                    }
                    if body.saturated() {
                        self.state = ParserState::Finished;
                        self.events.push(ParserEvent::BodyLoaded);
                        self.events.push(ParserEvent::Finished);
                    } else {
                        return Ok(None);
                    }
                }
                ParserState::Finished => return Ok(None),
            }
        }
    }

    /// Split one `\r\n`-terminated line off the accumulator.
    fn take_line(&mut self, source: SyntaxSource) -> Result<Option<String>> {
        let Some(pos) = find_crlf(&self.buf) else {
            return Ok(None);
        };
        let line = self.buf.split_to(pos + 2);
        let text = std::str::from_utf8(&line[..pos]).map_err(|_| Error::syntax(source))?;
        Ok(Some(text.to_string()))
    }

    fn parse_request_line(&mut self, req: &mut Request, line: &str) -> Result<()> {
        let mut tokens = line.split(' ');
        let (Some(method), Some(target), Some(version), None) = (
            tokens.next(),
            tokens.next(),
            tokens.next(),
            tokens.next(),
        ) else {
            return Err(Error::syntax(SyntaxSource::RequestLine));
        };
        if method.is_empty() || target.is_empty() || version.is_empty() {
            return Err(Error::syntax(SyntaxSource::RequestLine));
        }

        req.method = Method::parse(method)?;
        if version != SUPPORTED_VERSION {
            return Err(Error::VersionNotSupported(version.to_string()));
        }
        req.target = target.to_string();
        req.uri = Uri::parse(target)?;
        Ok(())
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn parse_header_line(req: &mut Request, line: &str) -> Result<()> {
    // The value starts after the first colon only.
    let (key, value) = line
        .split_once(':')
        .ok_or(Error::syntax(SyntaxSource::RequestHeaders))?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return Err(Error::syntax(SyntaxSource::RequestHeaders));
    }
    req.headers.add(key, value);
    Ok(())
}
