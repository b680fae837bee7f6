use crate::http::parser::{HeaderRange, RequestHead};

/// A single request header as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a str,
    pub value: &'a [u8],
}

impl<'a> Header<'a> {
    /// The value as text, `None` when it is not valid UTF-8.
    pub fn value_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Every accessor borrows from the connection's receive buffer, so a
/// `Request` cannot outlive the dispatch it was created for.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    buf: &'a [u8],
    head: &'a RequestHead,
}

impl<'a> Request<'a> {
    pub(crate) fn new(buf: &'a [u8], head: &'a RequestHead) -> Self {
        Self { buf, head }
    }

    fn text(&self, range: &std::ops::Range<usize>) -> &'a str {
        // the tokenizer only accepts token and URI characters here
        std::str::from_utf8(&self.buf[range.clone()]).unwrap_or_default()
    }

    fn header_at(&self, h: &HeaderRange) -> Header<'a> {
        Header {
            name: self.text(&h.name),
            value: &self.buf[h.value.clone()],
        }
    }

    /// The request method (e.g. "GET").
    pub fn method(&self) -> &'a str {
        self.text(&self.head.method)
    }

    /// The request target as sent (e.g. "/index.html?x=1").
    pub fn path(&self) -> &'a str {
        self.text(&self.head.path)
    }

    /// Minor protocol version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    pub fn minor_version(&self) -> u8 {
        self.head.minor_version
    }

    pub fn is_http1_0(&self) -> bool {
        self.head.minor_version == 0
    }

    pub fn is_http1_1(&self) -> bool {
        self.head.minor_version == 1
    }

    /// Length of the request line plus headers plus the blank line.
    pub fn header_len(&self) -> usize {
        self.head.header_len
    }

    /// Declared `Content-Length`, 0 when missing or not a number.
    pub fn content_length(&self) -> usize {
        self.head.body_len
    }

    /// The request body. Empty when no `Content-Length` was sent.
    pub fn body(&self) -> &'a [u8] {
        let start = self.head.header_len;
        let end = start.saturating_add(self.head.body_len).min(self.buf.len());
        &self.buf[start..end]
    }

    /// All headers in the order they were received.
    pub fn headers(&self) -> impl Iterator<Item = Header<'a>> + '_ {
        self.head.headers.iter().map(|h| self.header_at(h))
    }

    /// Total number of headers.
    pub fn headers_len(&self) -> usize {
        self.head.headers.len()
    }

    /// Retrieves the first header value by name (case-insensitive).
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present and valid UTF-8, `None` otherwise.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .and_then(|h| h.value_str())
    }

    /// Like [`Request::header`] but the name must match exactly.
    pub fn header_exact(&self, name: &str) -> Option<&'a str> {
        self.headers()
            .find(|h| h.name == name)
            .and_then(|h| h.value_str())
    }

    /// Every value sent under `name` (case-insensitive), in order.
    pub fn header_values(&self, name: &str) -> Vec<&'a str> {
        self.headers()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .filter_map(|h| h.value_str())
            .collect()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers().any(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Number of headers named `name` (case-insensitive).
    pub fn header_count(&self, name: &str) -> usize {
        self.headers()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .count()
    }

    /// Determines whether the client asked for the connection to stay open.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` was sent.
    /// HTTP/1.0 (and anything else) only stays open on an explicit
    /// `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let conn = self.header("Connection");
        if self.is_http1_1() {
            !conn.is_some_and(|v| v.eq_ignore_ascii_case("close"))
        } else {
            conn.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"))
        }
    }
}
