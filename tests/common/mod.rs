//! Shared utilities for the integration tests.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::task::JoinHandle;

use warden::config::EngineConfig;
use warden::http::buffer::RequestBuffer;
use warden::http::connection::{Connection, ConnectionError, SharedHandler};
use warden::http::reply::Reply;
use warden::http::request::Request;
use warden::http::transport::PlainTransport;

/// Wraps a closure as a connection handler.
#[allow(dead_code)]
pub fn handler<F>(f: F) -> Option<SharedHandler>
where
    F: Fn(&Request<'_>, &mut Reply) + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Starts a connection over an in-memory pipe and returns the client end.
#[allow(dead_code)]
pub fn spawn_connection(
    handler: Option<SharedHandler>,
) -> (DuplexStream, JoinHandle<Result<(), ConnectionError>>) {
    spawn_connection_with(handler, EngineConfig::default())
}

#[allow(dead_code)]
pub fn spawn_connection_with(
    handler: Option<SharedHandler>,
    cfg: EngineConfig,
) -> (DuplexStream, JoinHandle<Result<(), ConnectionError>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let conn = Connection::with_config(PlainTransport::new(server), handler, &cfg);
    (client, tokio::spawn(conn.start()))
}

/// Reads one response framed by `Content-Length` (0 when absent).
#[allow(dead_code)]
pub async fn read_response(client: &mut DuplexStream) -> (String, Vec<u8>) {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = client.read(&mut byte).await.unwrap();
        assert_eq!(n, 1, "connection closed inside the header block");
        head.push(byte[0]);
    }
    let head = String::from_utf8(head).unwrap();

    let len = header_value(&head, "Content-Length")
        .map(|v| v.parse::<usize>().unwrap())
        .unwrap_or(0);
    let mut body = vec![0; len];
    client.read_exact(&mut body).await.unwrap();
    (head, body)
}

/// Reads until the server closes the connection.
#[allow(dead_code)]
pub async fn read_to_close(client: &mut DuplexStream) -> Vec<u8> {
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    out
}

/// First value of `name` in a raw header block (case-insensitive).
#[allow(dead_code)]
pub fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.split("\r\n").skip(1).find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

/// A buffer holding `raw` with its headers already parsed.
#[allow(dead_code)]
pub fn parsed(raw: &[u8]) -> RequestBuffer {
    let mut buf = feed(raw);
    buf.parse(0).unwrap();
    buf
}

/// A buffer holding `raw`, not parsed yet.
#[allow(dead_code)]
pub fn feed(raw: &[u8]) -> RequestBuffer {
    let mut buf = RequestBuffer::new();
    let mut rest = raw;
    while !rest.is_empty() {
        let space = buf.read_space();
        let n = space.len().min(rest.len());
        space[..n].copy_from_slice(&rest[..n]);
        buf.advance(n);
        rest = &rest[n..];
    }
    buf
}

#[allow(dead_code)]
pub fn concat(segments: &[Bytes]) -> Vec<u8> {
    segments.iter().flat_map(|s| s.iter().copied()).collect()
}
