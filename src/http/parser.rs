use std::ops::Range;

/// Number of header slots handed to the tokenizer. A request with more
/// headers than this is rejected as malformed.
pub const MAX_HEADERS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The header block is not terminated yet, read more bytes.
    Incomplete,
    InvalidRequest,
    InvalidHeader,
    InvalidVersion,
    InvalidToken,
    TooManyHeaders,
}

impl ParseError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }
}

impl From<httparse::Error> for ParseError {
    fn from(err: httparse::Error) -> Self {
        match err {
            httparse::Error::HeaderName | httparse::Error::HeaderValue => ParseError::InvalidHeader,
            httparse::Error::Token => ParseError::InvalidToken,
            httparse::Error::Version => ParseError::InvalidVersion,
            httparse::Error::TooManyHeaders => ParseError::TooManyHeaders,
            httparse::Error::NewLine | httparse::Error::Status => ParseError::InvalidRequest,
        }
    }
}

/// Location of one header line inside the request buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRange {
    pub name: Range<usize>,
    pub value: Range<usize>,
}

/// Result of a successful parse, expressed as offsets into the buffer that
/// was parsed rather than as borrowed slices, so it survives buffer growth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Range<usize>,
    pub path: Range<usize>,
    pub minor_version: u8,
    pub headers: Vec<HeaderRange>,
    /// Offset of the first body byte.
    pub header_len: usize,
    /// Declared `Content-Length`, 0 when missing or not a number.
    pub body_len: usize,
}

/// Parses the request line and headers found in `buf`.
///
/// `last_len` is the number of bytes that were already present on the
/// previous (incomplete) attempt. When it is non-zero only the tail that
/// could complete the header terminator is scanned before committing to a
/// full parse, so feeding a request byte by byte stays linear.
pub fn parse_http_request(buf: &[u8], last_len: usize) -> Result<RequestHead, ParseError> {
    if last_len != 0 && !has_headers_end(buf, last_len) {
        return Err(ParseError::Incomplete);
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let header_len = match req.parse(buf)? {
        httparse::Status::Complete(n) => n,
        httparse::Status::Partial => return Err(ParseError::Incomplete),
    };

    let method = req.method.ok_or(ParseError::InvalidRequest)?;
    let path = req.path.ok_or(ParseError::InvalidRequest)?;
    let minor_version = req.version.ok_or(ParseError::InvalidVersion)?;

    let mut body_len = 0;
    let mut ranges = Vec::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        if header.name.eq_ignore_ascii_case("content-length") {
            body_len = std::str::from_utf8(header.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
        }
        ranges.push(HeaderRange {
            name: span(buf, header.name.as_bytes()),
            value: span(buf, header.value),
        });
    }

    Ok(RequestHead {
        method: span(buf, method.as_bytes()),
        path: span(buf, path.as_bytes()),
        minor_version,
        headers: ranges,
        header_len,
        body_len,
    })
}

/// Position of `part` inside `buf`; `part` must be a subslice of `buf`.
fn span(buf: &[u8], part: &[u8]) -> Range<usize> {
    let start = part.as_ptr() as usize - buf.as_ptr() as usize;
    start..start + part.len()
}

/// Looks for an empty line (`\n\n` or `\n\r\n`) in the bytes that could not
/// have been checked on the previous attempt.
fn has_headers_end(buf: &[u8], last_len: usize) -> bool {
    let start = last_len.saturating_sub(3);
    let tail = match buf.get(start..) {
        Some(tail) => tail,
        None => return false,
    };

    tail.iter().enumerate().any(|(i, &b)| {
        b == b'\n'
            && match tail.get(i + 1) {
                Some(b'\n') => true,
                Some(b'\r') => tail.get(i + 2) == Some(&b'\n'),
                _ => false,
            }
    })
}
