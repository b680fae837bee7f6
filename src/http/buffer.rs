//! Growable receive buffer for one connection.
//!
//! The buffer owns every byte a [`Request`] view borrows from. Views are
//! never stored: they are resolved on demand from the offsets kept in
//! [`RequestHead`], so growing or resetting the buffer cannot leave a
//! dangling view behind.

use crate::http::parser::{ParseError, RequestHead, parse_http_request};
use crate::http::request::Request;

/// Capacity a fresh connection starts with.
pub const INITIAL_CAPACITY: usize = 8 * 1024;

/// Grow before a read when less than this much room is left.
pub const MIN_READ_SPACE: usize = 4 * 1024;

/// Amount added on each growth step while reading headers.
pub const GROW_STEP: usize = 8 * 1024;

/// Hard ceiling for header block plus declared body.
pub const MAX_REQUEST_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug)]
pub struct RequestBuffer {
    bytes: Vec<u8>,
    filled: usize,
    head: Option<RequestHead>,
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuffer {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; INITIAL_CAPACITY],
            filled: 0,
            head: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Bytes received so far.
    pub fn data(&self) -> &[u8] {
        &self.bytes[..self.filled]
    }

    /// Header block length, once the headers have been parsed.
    pub fn parsed_header_len(&self) -> Option<usize> {
        self.head.as_ref().map(|h| h.header_len)
    }

    /// Declared body length of the parsed request, 0 before parsing.
    pub fn declared_body_len(&self) -> usize {
        self.head.as_ref().map(|h| h.body_len).unwrap_or(0)
    }

    /// Header block plus declared body, once the headers have been parsed.
    /// Saturates instead of wrapping on absurd `Content-Length` values.
    pub fn request_len(&self) -> Option<usize> {
        self.head.as_ref().map(|h| h.header_len.saturating_add(h.body_len))
    }

    /// Space to read the next chunk of headers into, growing first when
    /// less than [`MIN_READ_SPACE`] remains.
    pub fn read_space(&mut self) -> &mut [u8] {
        if self.bytes.len() - self.filled < MIN_READ_SPACE {
            self.bytes.resize(self.bytes.len() + GROW_STEP, 0);
        }
        &mut self.bytes[self.filled..]
    }

    /// Space for the rest of the body, sized so that exactly the missing
    /// bytes are requested. Empty when the body already arrived.
    pub fn body_space(&mut self) -> &mut [u8] {
        let total = self.request_len().unwrap_or(self.filled);
        if self.bytes.len() < total {
            self.bytes.resize(total, 0);
        }
        let end = total.max(self.filled);
        &mut self.bytes[self.filled..end]
    }

    /// Records `n` freshly read bytes.
    pub fn advance(&mut self, n: usize) {
        self.filled = (self.filled + n).min(self.bytes.len());
    }

    /// Attempts to parse the header block. `last_len` is the fill level at
    /// the previous attempt (0 on the first one).
    pub fn parse(&mut self, last_len: usize) -> Result<&RequestHead, ParseError> {
        let head = parse_http_request(&self.bytes[..self.filled], last_len)?;
        Ok(self.head.insert(head))
    }

    /// True once the header block and the whole declared body are present.
    pub fn is_request_complete(&self) -> bool {
        self.request_len().is_some_and(|len| self.filled >= len)
    }

    /// Borrowed view of the parsed request.
    pub fn request(&self) -> Option<Request<'_>> {
        self.head
            .as_ref()
            .map(|head| Request::new(&self.bytes[..self.filled], head))
    }

    /// Prepares for the next request on the same connection. Capacity is
    /// kept.
    pub fn reset(&mut self) {
        self.filled = 0;
        self.head = None;
    }
}
