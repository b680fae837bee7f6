//! Byte transports a [`Connection`](crate::http::connection::Connection)
//! can run over.
//!
//! The connection only needs four capabilities: read some bytes, read an
//! exact amount, write a list of segments, and shut down. Plaintext and
//! TLS streams differ only in what shutting down means.

use std::future::Future;
use std::io;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

pub trait Transport: Send {
    /// Reads whatever is available into `buf`, returning the byte count.
    /// 0 means the peer closed its sending side.
    fn read_some<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a;

    /// Fills `buf` completely.
    fn read_exact<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a;

    /// Writes every segment in order and flushes.
    fn write_buffers<'a>(
        &'a mut self,
        bufs: &'a [Bytes],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a;

    /// Ends the exchange from this side.
    fn shutdown(&mut self) -> impl Future<Output = io::Result<()>> + Send + '_;
}

async fn write_all_segments<S>(stream: &mut S, bufs: &[Bytes]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    for buf in bufs {
        stream.write_all(buf).await?;
    }
    stream.flush().await
}

/// Unencrypted stream. Shutting down half-closes the sending side.
#[derive(Debug)]
pub struct PlainTransport<S = TcpStream> {
    stream: S,
}

impl<S> PlainTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for PlainTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn read_some<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a {
        self.stream.read(buf)
    }

    fn read_exact<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a {
        async move {
            self.stream.read_exact(buf).await?;
            Ok(())
        }
    }

    fn write_buffers<'a>(
        &'a mut self,
        bufs: &'a [Bytes],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a {
        write_all_segments(&mut self.stream, bufs)
    }

    fn shutdown(&mut self) -> impl Future<Output = io::Result<()>> + Send + '_ {
        self.stream.shutdown()
    }
}

/// Encrypted stream, typically a `tokio_rustls::server::TlsStream`.
///
/// Shutting down is a no-op here: the TLS close sequence belongs to the
/// stream itself and runs when it is dropped.
#[derive(Debug)]
pub struct TlsTransport<S> {
    stream: S,
}

impl<S> TlsTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for TlsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn read_some<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a {
        self.stream.read(buf)
    }

    fn read_exact<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a {
        async move {
            self.stream.read_exact(buf).await?;
            Ok(())
        }
    }

    fn write_buffers<'a>(
        &'a mut self,
        bufs: &'a [Bytes],
    ) -> impl Future<Output = io::Result<()>> + Send + 'a {
        write_all_segments(&mut self.stream, bufs)
    }

    fn shutdown(&mut self) -> impl Future<Output = io::Result<()>> + Send + '_ {
        std::future::ready(Ok(()))
    }
}
