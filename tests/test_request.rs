use common::parsed;

mod common;

#[test]
fn test_request_accessors() {
    let buf = parsed(b"PUT /items/7 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 4\r\n\r\nabcd");
    let req = buf.request().unwrap();

    assert_eq!(req.method(), "PUT");
    assert_eq!(req.path(), "/items/7");
    assert!(req.is_http1_1());
    assert!(!req.is_http1_0());
    assert_eq!(req.content_length(), 4);
    assert_eq!(req.body(), b"abcd");
    assert_eq!(req.headers_len(), 2);
}

#[test]
fn test_request_header_lookup_is_case_insensitive() {
    let buf = parsed(b"GET / HTTP/1.1\r\nX-Token: secret\r\n\r\n");
    let req = buf.request().unwrap();

    assert_eq!(req.header("x-token"), Some("secret"));
    assert_eq!(req.header("X-TOKEN"), Some("secret"));
    assert!(req.has_header("x-token"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_header_exact_match() {
    let buf = parsed(b"GET / HTTP/1.1\r\nX-Token: secret\r\n\r\n");
    let req = buf.request().unwrap();

    assert_eq!(req.header_exact("X-Token"), Some("secret"));
    assert_eq!(req.header_exact("x-token"), None);
}

#[test]
fn test_request_repeated_headers() {
    let buf = parsed(b"GET / HTTP/1.1\r\nAccept: a\r\nHost: h\r\naccept: b\r\n\r\n");
    let req = buf.request().unwrap();

    assert_eq!(req.header("Accept"), Some("a"));
    assert_eq!(req.header_values("Accept"), vec!["a", "b"]);
    assert_eq!(req.header_count("ACCEPT"), 2);

    let names: Vec<_> = req.headers().map(|h| h.name).collect();
    assert_eq!(names, vec!["Accept", "Host", "accept"]);
}

#[test]
fn test_request_without_body() {
    let buf = parsed(b"GET / HTTP/1.1\r\n\r\n");
    let req = buf.request().unwrap();

    assert_eq!(req.content_length(), 0);
    assert!(req.body().is_empty());
}

#[test]
fn test_request_body_with_huge_content_length() {
    let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\nabc", usize::MAX);
    let buf = parsed(raw.as_bytes());
    let req = buf.request().unwrap();

    assert_eq!(req.content_length(), usize::MAX);
    assert_eq!(req.body(), b"abc");
}

#[test]
fn test_keep_alive_http11_default() {
    let buf = parsed(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
    assert!(buf.request().unwrap().keep_alive());
}

#[test]
fn test_keep_alive_http11_close_any_case() {
    for value in ["close", "Close", "CLOSE"] {
        let raw = format!("GET / HTTP/1.1\r\nConnection: {value}\r\n\r\n");
        let buf = parsed(raw.as_bytes());
        assert!(!buf.request().unwrap().keep_alive(), "{value}");
    }
}

#[test]
fn test_keep_alive_http10_default() {
    let buf = parsed(b"GET / HTTP/1.0\r\n\r\n");
    assert!(!buf.request().unwrap().keep_alive());
}

#[test]
fn test_keep_alive_http10_explicit() {
    let buf = parsed(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n");
    assert!(buf.request().unwrap().keep_alive());
}

#[test]
fn test_request_view_gone_after_reset() {
    let mut buf = parsed(b"GET / HTTP/1.1\r\n\r\n");
    assert!(buf.request().is_some());

    buf.reset();
    assert!(buf.request().is_none());
    assert_eq!(buf.parsed_header_len(), None);
    assert_eq!(buf.declared_body_len(), 0);
}
