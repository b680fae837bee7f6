//! HTTP/1.x protocol engine.
//!
//! # Architecture
//!
//! - **`parser`**: resumable request-line and header tokenizer
//! - **`buffer`**: the per-connection receive buffer views borrow from
//! - **`request`**: borrowed view of a parsed request
//! - **`reply`**: outbound status, headers and body strategies
//! - **`connection`**: the per-connection state machine
//! - **`transport`**: plaintext and TLS byte transports
//! - **`handoff`**: direct transport access for one request
//! - **`timer`**: idle deadline
//! - **`static_files`**, **`mime`**, **`date`**, **`status`**: helpers
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │  ReadingHeaders  │ ← incomplete: read again
//!        └──────┬───────────┘
//!               │ complete         malformed → Writing(400) → Closed
//!               ▼
//!        ┌──────────────────┐
//!        │   ReadingBody    │ ← only when Content-Length > 0
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ── handoff ──► Suspended
//!        └──────┬───────────┘                   │
//!               ▼                               │ handle dropped
//!        ┌──────────────────┐                   │
//!        │     Writing      │ ◄─────────────────┘
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → ReadingHeaders (same connection)
//!               └─ Close → Closed
//! ```
//!
//! Any I/O error or an expired idle deadline moves straight to `Closed`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use warden::http::connection::{Connection, SharedHandler};
//! use warden::http::reply::Reply;
//! use warden::http::request::Request;
//! use warden::http::transport::PlainTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler: SharedHandler = Arc::new(|_req: &Request<'_>, rep: &mut Reply| {
//!         rep.add_header("Content-Type", "text/plain");
//!         rep.response_text("Hello World");
//!     });
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let conn = Connection::new(PlainTransport::new(socket), Some(handler.clone()));
//!         tokio::spawn(conn.start());
//!     }
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod date;
pub mod handoff;
pub mod mime;
pub mod parser;
pub mod reply;
pub mod request;
pub mod static_files;
pub mod status;
pub mod timer;
pub mod transport;
