//! Direct transport access for a single request.
//!
//! A handler that calls [`Reply::handoff`](crate::http::reply::Reply::handoff)
//! gets a [`StreamHandle`]. The connection task then stops serializing the
//! reply on its own and instead executes the reads and writes the handle
//! asks for, one at a time, until the handle is dropped.

use std::io;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

pub(crate) enum Command {
    Write {
        data: Bytes,
        done: oneshot::Sender<io::Result<()>>,
    },
    Read {
        max: usize,
        done: oneshot::Sender<io::Result<Bytes>>,
    },
    Finish {
        body: Bytes,
    },
}

pub(crate) fn channel() -> (StreamHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(1);
    (StreamHandle { tx }, rx)
}

fn gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "connection closed")
}

/// Raw access to a connection for the duration of one request.
///
/// The first [`write`](StreamHandle::write) sends the reply's status line
/// and headers ahead of the data. Dropping the handle hands the connection
/// back to the server, which then either reuses it or closes it according
/// to the keep-alive decision.
#[derive(Debug)]
pub struct StreamHandle {
    tx: mpsc::Sender<Command>,
}

impl StreamHandle {
    /// Writes raw bytes to the client.
    pub async fn write(&mut self, data: impl Into<Bytes>) -> io::Result<()> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(Command::Write {
                data: data.into(),
                done,
            })
            .await
            .map_err(|_| gone())?;
        rx.await.map_err(|_| gone())?
    }

    /// Reads up to `max` bytes from the client. An empty result means the
    /// client closed its side.
    pub async fn read(&mut self, max: usize) -> io::Result<Bytes> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(Command::Read { max, done })
            .await
            .map_err(|_| gone())?;
        rx.await.map_err(|_| gone())?
    }

    /// Releases the connection and lets the server send `body` as the rest
    /// of the reply through its normal buffered path.
    pub async fn finish_with_text(self, body: impl Into<Bytes>) -> io::Result<()> {
        self.tx
            .send(Command::Finish { body: body.into() })
            .await
            .map_err(|_| gone())
    }

    /// True once the connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
