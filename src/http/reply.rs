//! Outbound response and its body strategies.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::http::date;
use crate::http::handoff::{self, Command, StreamHandle};
use crate::http::mime;
use crate::http::status::StatusCode;

/// Largest slice of a file sent per serializer call.
pub const FILE_CHUNK_SIZE: usize = 1024 * 1024;

const CRLF: &[u8] = b"\r\n";
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

type Generator = Box<dyn FnMut() -> Bytes + Send>;

/// Which body strategy a [`Reply`] currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Text,
    File,
    Chunked,
    Handoff,
}

enum Body {
    None,
    /// `None` once the body has been handed out.
    Text(Option<Bytes>),
    File {
        file: tokio::fs::File,
        eof: bool,
    },
    Chunked {
        generator: Generator,
        done: bool,
    },
    /// The receiver moves to the connection once it suspends.
    Handoff(Option<mpsc::Receiver<Command>>),
}

impl Body {
    fn kind(&self) -> BodyKind {
        match self {
            Body::None => BodyKind::None,
            Body::Text(_) => BodyKind::Text,
            Body::File { .. } => BodyKind::File,
            Body::Chunked { .. } => BodyKind::Chunked,
            Body::Handoff(_) => BodyKind::Handoff,
        }
    }
}

/// An HTTP response being built by a handler and serialized by the
/// connection.
///
/// Headers keep insertion order and may repeat. Exactly one body strategy
/// is active at a time; selecting a new one replaces the previous one.
pub struct Reply {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Body,
    head_written: bool,
    file_buf: BytesMut,
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.kind())
            .field("head_written", &self.head_written)
            .finish()
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::new()
    }
}

impl Reply {
    /// A 200 reply with no headers and no body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Vec::new(),
            body: Body::None,
            head_written: false,
            file_buf: BytesMut::new(),
        }
    }

    /// Canned reply for `status`: an HTML body with `Content-Length` and
    /// `Content-Type: text/html`.
    pub fn stock_reply(status: StatusCode) -> Self {
        let body = status.stock_body();
        let mut reply = Self::new();
        reply.status = status;
        reply.add_header("Content-Length", body.len().to_string());
        reply.add_header("Content-Type", "text/html");
        reply.body = Body::Text(Some(Bytes::from(body)));
        reply
    }

    /// Clears the reply for the next request on the connection: back to a
    /// bare 200. The file read buffer is kept.
    pub fn reset(&mut self) {
        self.status = StatusCode::Ok;
        self.headers.clear();
        self.body = Body::None;
        self.head_written = false;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn body_kind(&self) -> BodyKind {
        self.body.kind()
    }

    /// True when the handler took over the connection with
    /// [`Reply::handoff`] and the server must not write on its own.
    pub fn is_delay(&self) -> bool {
        matches!(self.body, Body::Handoff(_))
    }

    /// True once the status line and headers went out.
    pub fn head_written(&self) -> bool {
        self.head_written
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.headers
    }

    pub fn headers_len(&self) -> usize {
        self.headers.len()
    }

    /// First value of `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of `name`, matched case-sensitively.
    pub fn header_exact(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .count()
    }

    /// Sends `body` as a single segment. Adds `Content-Length` unless the
    /// handler already set one.
    pub fn response_text(&mut self, body: impl Into<Bytes>) {
        let body = body.into();
        if !self.has_header("Content-Length") {
            self.add_header("Content-Length", body.len().to_string());
        }
        self.body = Body::Text(Some(body));
    }

    /// Streams the file at `path`, adding `Content-Length`, `Last-Modified`
    /// and a `Content-Type` derived from the extension.
    pub fn response_file(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }

        self.add_header("Content-Length", meta.len().to_string());
        if let Ok(modified) = meta.modified() {
            self.add_header("Last-Modified", date::http_date(modified));
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        self.add_header("Content-Type", mime::extension_to_type(ext));

        self.body = Body::File {
            file: tokio::fs::File::from_std(file),
            eof: false,
        };
        Ok(())
    }

    /// Sends the body with chunked transfer encoding. `generator` is called
    /// once per chunk; an empty chunk ends the body.
    pub fn response_by_generator<F, B>(&mut self, mut generator: F)
    where
        F: FnMut() -> B + Send + 'static,
        B: Into<Bytes>,
    {
        if !self
            .header_values("Transfer-Encoding")
            .iter()
            .any(|v| v.eq_ignore_ascii_case("chunked"))
        {
            self.add_header("Transfer-Encoding", "chunked");
        }
        self.body = Body::Chunked {
            generator: Box::new(move || generator().into()),
            done: false,
        };
    }

    /// Takes over the connection for this request. See [`StreamHandle`].
    pub fn handoff(&mut self) -> StreamHandle {
        let (handle, rx) = handoff::channel();
        self.body = Body::Handoff(Some(rx));
        handle
    }

    pub(crate) fn take_handoff(&mut self) -> Option<mpsc::Receiver<Command>> {
        match &mut self.body {
            Body::Handoff(rx) => rx.take(),
            _ => None,
        }
    }

    /// Drops the handoff marker so the reply can fall back to buffered
    /// writing. Any other body strategy is left alone.
    pub(crate) fn end_handoff(&mut self) {
        if self.is_delay() {
            self.body = Body::None;
        }
    }

    /// Appends the status line, headers, a `Date` header and the blank line
    /// to `out`. Does nothing if they were already written.
    pub fn write_head(&mut self, out: &mut Vec<Bytes>) {
        if self.head_written {
            return;
        }
        self.head_written = true;

        let mut head = BytesMut::with_capacity(256);
        head.put_slice(self.status.status_line().as_bytes());
        for (name, value) in &self.headers {
            head.put_slice(name.as_bytes());
            head.put_slice(b": ");
            head.put_slice(value.as_bytes());
            head.put_slice(CRLF);
        }
        if !self.has_header("Date") {
            head.put_slice(b"Date: ");
            head.put_slice(date::now().as_bytes());
            head.put_slice(CRLF);
        }
        head.put_slice(CRLF);
        out.push(head.freeze());
    }

    /// Appends the next output segments to `out`.
    ///
    /// The first call also emits the header block. Returns `true` while
    /// more calls are needed and `false` once the body is exhausted; calls
    /// after that emit nothing and keep returning `false`.
    pub async fn to_buffers(&mut self, out: &mut Vec<Bytes>) -> io::Result<bool> {
        self.write_head(out);

        match &mut self.body {
            Body::None | Body::Handoff(_) => Ok(false),
            Body::Text(body) => {
                if let Some(body) = body.take().filter(|b| !b.is_empty()) {
                    out.push(body);
                }
                Ok(false)
            }
            Body::File { file, eof } => {
                if *eof {
                    return Ok(false);
                }
                self.file_buf.clear();
                self.file_buf.reserve(FILE_CHUNK_SIZE);
                let mut limited = file.take(FILE_CHUNK_SIZE as u64);
                while self.file_buf.len() < FILE_CHUNK_SIZE {
                    if limited.read_buf(&mut self.file_buf).await? == 0 {
                        *eof = true;
                        break;
                    }
                }
                if !self.file_buf.is_empty() {
                    out.push(self.file_buf.split().freeze());
                }
                Ok(!*eof)
            }
            Body::Chunked { generator, done } => {
                if *done {
                    return Ok(false);
                }
                let chunk = generator();
                if chunk.is_empty() {
                    *done = true;
                    out.push(Bytes::from_static(LAST_CHUNK));
                    return Ok(false);
                }
                out.push(Bytes::from(format!("{:x}\r\n", chunk.len())));
                out.push(chunk);
                out.push(Bytes::from_static(CRLF));
                Ok(true)
            }
        }
    }
}
