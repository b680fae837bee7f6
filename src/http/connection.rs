use std::io;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;
use tracing::debug;

use crate::config::EngineConfig;
use crate::http::buffer::{MAX_REQUEST_SIZE, RequestBuffer};
use crate::http::handoff::Command;
use crate::http::reply::{BodyKind, Reply};
use crate::http::request::Request;
use crate::http::status::StatusCode;
use crate::http::timer::IdleTimer;
use crate::http::transport::Transport;

/// Application code invoked once per request.
///
/// The handler runs synchronously on the connection's task. It fills in the
/// [`Reply`]; the connection serializes it afterwards, unless the handler
/// took over the transport with [`Reply::handoff`].
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: &Request<'_>, reply: &mut Reply);
}

impl<F> Handler for F
where
    F: Fn(&Request<'_>, &mut Reply) + Send + Sync + 'static,
{
    fn handle(&self, req: &Request<'_>, reply: &mut Reply) {
        self(req, reply)
    }
}

pub type SharedHandler = Arc<dyn Handler>;

/// Why a connection was torn down without a response.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("request of {size} bytes exceeds the {limit} byte limit", limit = MAX_REQUEST_SIZE)]
    RequestTooLarge { size: usize },
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("idle timeout")]
    IdleTimeout,
}

impl From<Elapsed> for ConnectionError {
    fn from(_: Elapsed) -> Self {
        ConnectionError::IdleTimeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, not started yet.
    Idle,
    ReadingHeaders,
    ReadingBody,
    Dispatching,
    Writing,
    /// The handler owns the transport through a `StreamHandle`.
    Suspended,
    Closed,
}

/// One client connection: reads a request, hands it to the [`Handler`],
/// writes the [`Reply`], then either waits for the next request or closes.
///
/// At most one read or one write is in flight at any time.
pub struct Connection<T> {
    transport: T,
    buffer: RequestBuffer,
    reply: Reply,
    handler: Option<SharedHandler>,
    keep_alive: bool,
    timer: IdleTimer,
    state: ConnectionState,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, handler: Option<SharedHandler>) -> Self {
        Self::with_config(transport, handler, &EngineConfig::default())
    }

    pub fn with_config(transport: T, handler: Option<SharedHandler>, cfg: &EngineConfig) -> Self {
        Self {
            transport,
            buffer: RequestBuffer::new(),
            reply: Reply::new(),
            handler,
            keep_alive: false,
            timer: IdleTimer::new(cfg.idle_timeout),
            state: ConnectionState::Idle,
        }
    }

    pub fn set_handler(&mut self, handler: SharedHandler) {
        self.handler = Some(handler);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consumes the connection and serves it to the end. See [`Connection::run`].
    pub async fn start(mut self) -> Result<(), ConnectionError> {
        self.run().await
    }

    /// Serves requests until the client leaves, keep-alive ends, or an
    /// error aborts the connection.
    ///
    /// `Ok(())` covers every orderly close, including the one after a 400
    /// for a malformed request. On error nothing further is sent; the
    /// transport is still asked to shut down before the error is returned.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        self.state = ConnectionState::ReadingHeaders;
        let result = self.drive().await;
        if result.is_err() {
            self.close().await;
        }
        self.state = ConnectionState::Closed;
        result
    }

    async fn drive(&mut self) -> Result<(), ConnectionError> {
        loop {
            match self.state {
                ConnectionState::ReadingHeaders => self.do_read().await?,
                ConnectionState::ReadingBody => self.do_read_body().await?,
                ConnectionState::Dispatching => self.do_request(),
                ConnectionState::Writing => self.do_write().await?,
                ConnectionState::Suspended => self.do_handoff().await?,
                ConnectionState::Idle | ConnectionState::Closed => return Ok(()),
            }
        }
    }

    async fn do_read(&mut self) -> Result<(), ConnectionError> {
        self.timer.rearm();
        let last_len = self.buffer.filled();
        let n = self
            .timer
            .guard(self.transport.read_some(self.buffer.read_space()))
            .await??;

        if n == 0 {
            if self.buffer.is_empty() {
                debug!("peer closed the connection");
                self.close().await;
                return Ok(());
            }
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        self.buffer.advance(n);

        match self.buffer.parse(last_len) {
            Ok(_) => {}
            Err(e) if e.is_incomplete() => {
                if self.buffer.filled() > MAX_REQUEST_SIZE {
                    return Err(ConnectionError::RequestTooLarge {
                        size: self.buffer.filled(),
                    });
                }
                return Ok(());
            }
            Err(e) => {
                debug!(error = ?e, "malformed request");
                self.reply = Reply::stock_reply(StatusCode::BadRequest);
                self.reply.add_header("Connection", "close");
                self.keep_alive = false;
                self.state = ConnectionState::Writing;
                return Ok(());
            }
        }

        let size = self.buffer.request_len().unwrap_or_default();
        if size > MAX_REQUEST_SIZE {
            return Err(ConnectionError::RequestTooLarge { size });
        }

        self.state = if self.buffer.is_request_complete() {
            ConnectionState::Dispatching
        } else {
            ConnectionState::ReadingBody
        };
        Ok(())
    }

    async fn do_read_body(&mut self) -> Result<(), ConnectionError> {
        self.timer.rearm();
        let space = self.buffer.body_space();
        let n = space.len();
        if n > 0 {
            self.timer.guard(self.transport.read_exact(space)).await??;
            self.buffer.advance(n);
        }
        self.state = ConnectionState::Dispatching;
        Ok(())
    }

    fn do_request(&mut self) {
        let Some(request) = self.buffer.request() else {
            self.reply = Reply::stock_reply(StatusCode::BadRequest);
            self.state = ConnectionState::Writing;
            return;
        };

        self.keep_alive = request.keep_alive();
        match &self.handler {
            Some(handler) => handler.handle(&request, &mut self.reply),
            None => {
                debug!("no request handler registered");
                self.reply = Reply::stock_reply(StatusCode::BadRequest);
            }
        }

        debug!(
            method = request.method(),
            path = request.path(),
            status = self.reply.status().as_u16(),
            delayed = self.reply.is_delay(),
            "request dispatched"
        );

        self.state = if self.reply.is_delay() {
            ConnectionState::Suspended
        } else {
            ConnectionState::Writing
        };
    }

    /// Settles keep-alive for the current exchange and records it on the
    /// reply. A `Connection` header set by the handler wins.
    fn apply_keep_alive(&mut self) {
        match self.reply.header("Connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => self.keep_alive = false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => self.keep_alive = true,
            Some(_) => {}
            None => {
                let value = if self.keep_alive { "keep-alive" } else { "close" };
                self.reply.add_header("Connection", value);
            }
        }
    }

    async fn do_write(&mut self) -> Result<(), ConnectionError> {
        if !self.reply.head_written() {
            self.apply_keep_alive();
        }

        self.timer.rearm();
        let mut segments = Vec::new();
        let more = self.reply.to_buffers(&mut segments).await?;
        if !segments.is_empty() {
            self.timer
                .guard(self.transport.write_buffers(&segments))
                .await??;
        }

        if !more {
            self.finish_exchange().await;
        }
        Ok(())
    }

    async fn do_handoff(&mut self) -> Result<(), ConnectionError> {
        if let Some(commands) = self.reply.take_handoff() {
            self.serve_handoff(commands).await?;
        }

        self.reply.end_handoff();
        if self.reply.body_kind() != BodyKind::None {
            self.state = ConnectionState::Writing;
        } else if !self.reply.head_written() {
            // nothing reached the client yet, give it a complete empty reply
            self.reply.response_text(Bytes::new());
            self.state = ConnectionState::Writing;
        } else {
            self.finish_exchange().await;
        }
        Ok(())
    }

    async fn serve_handoff(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
    ) -> Result<(), ConnectionError> {
        self.timer.rearm();
        while let Some(command) = self.timer.guard(commands.recv()).await? {
            match command {
                Command::Write { data, done } => {
                    self.timer.rearm();
                    let mut segments = Vec::with_capacity(2);
                    if !self.reply.head_written() {
                        self.apply_keep_alive();
                        self.reply.write_head(&mut segments);
                    }
                    segments.push(data);

                    let res = self
                        .timer
                        .guard(self.transport.write_buffers(&segments))
                        .await;
                    match res {
                        Ok(Ok(())) => {
                            let _ = done.send(Ok(()));
                        }
                        Ok(Err(e)) => {
                            let _ = done.send(Err(copy_err(&e)));
                            return Err(e.into());
                        }
                        Err(elapsed) => {
                            let _ = done.send(Err(io::ErrorKind::TimedOut.into()));
                            return Err(elapsed.into());
                        }
                    }
                }
                Command::Read { max, done } => {
                    self.timer.rearm();
                    let mut buf = vec![0; max];
                    let res = self.timer.guard(self.transport.read_some(&mut buf)).await;
                    match res {
                        Ok(Ok(n)) => {
                            buf.truncate(n);
                            let _ = done.send(Ok(Bytes::from(buf)));
                        }
                        Ok(Err(e)) => {
                            let _ = done.send(Err(copy_err(&e)));
                            return Err(e.into());
                        }
                        Err(elapsed) => {
                            let _ = done.send(Err(io::ErrorKind::TimedOut.into()));
                            return Err(elapsed.into());
                        }
                    }
                }
                Command::Finish { body } => {
                    self.reply.end_handoff();
                    self.reply.response_text(body);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Ends one request/response exchange: either get ready for the next
    /// request or close.
    async fn finish_exchange(&mut self) {
        self.reply.reset();
        if self.keep_alive {
            self.buffer.reset();
            self.state = ConnectionState::ReadingHeaders;
        } else {
            self.close().await;
        }
    }

    async fn close(&mut self) {
        if let Ok(Err(e)) = self.timer.guard(self.transport.shutdown()).await {
            debug!(error = %e, "shutdown failed");
        }
        self.state = ConnectionState::Closed;
    }
}

fn copy_err(e: &io::Error) -> io::Error {
    io::Error::new(e.kind(), e.to_string())
}
