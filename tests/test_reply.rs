use bytes::Bytes;
use common::{concat, header_value};
use warden::http::reply::{BodyKind, FILE_CHUNK_SIZE, Reply};
use warden::http::status::StatusCode;

mod common;

/// Runs the serializer to the end, returning (header block, body bytes, calls).
async fn drain(reply: &mut Reply) -> (String, Vec<u8>, usize) {
    let mut head = None;
    let mut body = Vec::new();
    let mut calls = 0;
    loop {
        let mut segments = Vec::new();
        let more = reply.to_buffers(&mut segments).await.unwrap();
        calls += 1;
        let mut rest = &segments[..];
        if head.is_none() {
            head = Some(String::from_utf8(segments[0].to_vec()).unwrap());
            rest = &segments[1..];
        }
        body.extend(concat(rest));
        if !more {
            break;
        }
    }
    (head.unwrap(), body, calls)
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Created.as_u16(), 201);
    assert_eq!(StatusCode::Accepted.as_u16(), 202);
    assert_eq!(StatusCode::NoContent.as_u16(), 204);
    assert_eq!(StatusCode::MovedTemporarily.as_u16(), 302);
    assert_eq!(StatusCode::NotModified.as_u16(), 304);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    assert_eq!(StatusCode::ServiceUnavailable.as_u16(), 503);
}

#[test]
fn test_status_line() {
    assert_eq!(StatusCode::Ok.status_line(), "HTTP/1.1 200 OK\r\n");
    assert_eq!(
        StatusCode::BadRequest.status_line(),
        "HTTP/1.1 400 Bad Request\r\n"
    );
    assert_eq!(
        StatusCode::MovedTemporarily.status_line(),
        "HTTP/1.1 302 Moved Temporarily\r\n"
    );
}

#[test]
fn test_stock_reply() {
    let reply = Reply::stock_reply(StatusCode::NotFound);

    assert_eq!(reply.status(), StatusCode::NotFound);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    let body = StatusCode::NotFound.stock_body();
    assert!(body.contains("<h1>404 Not Found</h1>"));
    assert_eq!(reply.header("Content-Length"), Some(body.len().to_string().as_str()));
    assert_eq!(reply.body_kind(), BodyKind::Text);
}

#[test]
fn test_headers_keep_order_and_duplicates() {
    let mut reply = Reply::new();
    reply.add_header("Set-Cookie", "a=1");
    reply.add_header("X-Other", "x");
    reply.add_header("set-cookie", "b=2");

    assert_eq!(reply.headers_len(), 3);
    assert_eq!(reply.header("SET-COOKIE"), Some("a=1"));
    assert_eq!(reply.header_values("Set-Cookie"), vec!["a=1", "b=2"]);
    assert_eq!(reply.header_count("set-cookie"), 2);
    assert_eq!(reply.header_exact("set-cookie"), Some("b=2"));
    assert!(!reply.has_header("Location"));
}

#[test]
fn test_headers_mut_edits_in_place() {
    let mut reply = Reply::stock_reply(StatusCode::NotFound);
    reply
        .headers_mut()
        .retain(|(name, _)| !name.eq_ignore_ascii_case("Content-Type"));
    reply.headers_mut().push(("Content-Type".into(), "text/plain".into()));

    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.header_count("Content-Type"), 1);
    assert_eq!(reply.headers()[0].0, "Content-Length");
}

#[test]
fn test_response_text_adds_content_length() {
    let mut reply = Reply::new();
    reply.response_text("Hello World");

    assert_eq!(reply.header("Content-Length"), Some("11"));
}

#[test]
fn test_response_text_preserves_custom_content_length() {
    let mut reply = Reply::new();
    reply.add_header("Content-Length", "999");
    reply.response_text("test");

    assert_eq!(reply.header_values("Content-Length"), vec!["999"]);
}

#[tokio::test]
async fn test_text_body_serialization() {
    let mut reply = Reply::new();
    reply.add_header("Content-Type", "text/plain");
    reply.response_text("Hello World");

    let (head, body, calls) = drain(&mut reply).await;

    assert_eq!(calls, 1);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/plain\r\n"));
    assert!(head.ends_with("\r\n\r\n"));
    assert!(header_value(&head, "Date").is_some_and(|d| d.ends_with(" GMT")));
    let len: usize = header_value(&head, "Content-Length").unwrap().parse().unwrap();
    assert_eq!(len, body.len());
    assert_eq!(body, b"Hello World");
}

#[tokio::test]
async fn test_to_buffers_after_exhaustion_emits_nothing() {
    let mut reply = Reply::new();
    reply.response_text("abc");
    drain(&mut reply).await;

    for _ in 0..3 {
        let mut segments = Vec::new();
        let more = reply.to_buffers(&mut segments).await.unwrap();
        assert!(!more);
        assert!(segments.is_empty());
    }
}

#[tokio::test]
async fn test_handler_date_header_is_not_duplicated() {
    let mut reply = Reply::new();
    reply.add_header("Date", "Sat, 27 Sep 2014 06:31:15 GMT");
    reply.response_text("");

    let (head, _, _) = drain(&mut reply).await;
    assert_eq!(head.matches("Date:").count(), 1);
}

#[tokio::test]
async fn test_no_body_emits_only_header_block() {
    let mut reply = Reply::new();
    reply.set_status(StatusCode::NoContent);

    let (head, body, calls) = drain(&mut reply).await;
    assert!(head.starts_with("HTTP/1.1 204 No Content\r\n"));
    assert!(body.is_empty());
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn test_chunked_encoding() {
    let mut chunks = vec!["ab", "cdef", ""].into_iter();
    let mut reply = Reply::new();
    reply.response_by_generator(move || chunks.next().unwrap_or(""));

    assert_eq!(reply.header("Transfer-Encoding"), Some("chunked"));

    let (head, body, calls) = drain(&mut reply).await;
    assert!(head.contains("Transfer-Encoding: chunked\r\n"));
    assert_eq!(body, b"2\r\nab\r\n4\r\ncdef\r\n0\r\n\r\n");
    assert_eq!(calls, 3);

    let mut segments = Vec::new();
    assert!(!reply.to_buffers(&mut segments).await.unwrap());
    assert!(segments.is_empty());
}

#[tokio::test]
async fn test_chunked_hex_lengths_are_lowercase() {
    let mut sent = false;
    let mut reply = Reply::new();
    reply.response_by_generator(move || {
        if sent {
            return Bytes::new();
        }
        sent = true;
        Bytes::from(vec![b'x'; 255])
    });

    let (_, body, _) = drain(&mut reply).await;
    assert!(body.starts_with(b"ff\r\n"));
    assert!(body.ends_with(b"\r\n0\r\n\r\n"));
}

#[tokio::test]
async fn test_file_body_in_chunks() {
    let dir = std::env::temp_dir().join(format!("warden-reply-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("big.txt");
    let content: Vec<u8> = (0..FILE_CHUNK_SIZE + 10).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &content).unwrap();

    let mut reply = Reply::new();
    reply.response_file(&path).unwrap();

    assert_eq!(reply.body_kind(), BodyKind::File);
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(
        reply.header("Content-Length"),
        Some(content.len().to_string().as_str())
    );
    assert!(reply.has_header("Last-Modified"));

    let (_, body, calls) = drain(&mut reply).await;
    assert_eq!(body, content);
    assert_eq!(calls, 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_response_file_missing() {
    let mut reply = Reply::new();
    let err = reply
        .response_file("/definitely/not/here.html")
        .unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(reply.body_kind(), BodyKind::None);
    assert_eq!(reply.headers_len(), 0);
}

#[tokio::test]
async fn test_handoff_marks_reply_delayed() {
    let mut reply = Reply::new();
    assert!(!reply.is_delay());

    let _handle = reply.handoff();
    assert!(reply.is_delay());
    assert_eq!(reply.body_kind(), BodyKind::Handoff);
}

#[tokio::test]
async fn test_reset() {
    let mut reply = Reply::new();
    reply.add_header("X", "y");
    reply.response_text("abc");
    drain(&mut reply).await;

    reply.reset();
    assert_eq!(reply.status(), StatusCode::Ok);
    assert_eq!(reply.headers_len(), 0);
    assert_eq!(reply.body_kind(), BodyKind::None);
    assert!(!reply.head_written());
}
