//! Warden - embeddable HTTP/1.x server engine
//!
//! Request parsing, response serialization, keep-alive and idle timeouts
//! over plaintext or TLS transports.

pub mod config;
pub mod http;
pub mod server;

pub use http::connection::{Connection, ConnectionError, Handler, SharedHandler};
pub use http::reply::Reply;
pub use http::request::Request;
pub use http::status::StatusCode;
pub use server::Server;
