use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{Instrument, debug, info, info_span, warn};

use anyhow::Context;

use crate::config::{Config, EngineConfig};
use crate::http::connection::{Connection, ConnectionError, SharedHandler};
use crate::http::transport::{PlainTransport, TlsTransport, Transport};
use crate::server::tls;

/// Binds every configured listener and serves connections until one of the
/// accept loops fails.
pub async fn run(cfg: &Config, handler: Option<SharedHandler>) -> anyhow::Result<()> {
    let engine = cfg.engine();
    let mut loops = JoinSet::new();

    for listener_cfg in &cfg.listeners {
        let listener = TcpListener::bind(&listener_cfg.addr)
            .await
            .with_context(|| format!("failed to bind {}", listener_cfg.addr))?;
        let acceptor = listener_cfg.tls.as_ref().map(tls::acceptor).transpose()?;
        info!(
            addr = %listener_cfg.addr,
            tls = acceptor.is_some(),
            "Listening"
        );
        loops.spawn(accept_loop(listener, acceptor, handler.clone(), engine.clone()));
    }

    while let Some(res) = loops.join_next().await {
        res.context("accept loop panicked")??;
    }
    Ok(())
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    handler: Option<SharedHandler>,
    engine: EngineConfig,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        debug!(%peer, "Accepted connection");

        let handler = handler.clone();
        let engine = engine.clone();
        let acceptor = acceptor.clone();
        let span = info_span!("conn", %peer);
        tokio::spawn(
            async move {
                if let Err(e) = socket.set_nodelay(true) {
                    debug!(error = %e, "failed to set TCP_NODELAY");
                }
                match acceptor {
                    None => serve(PlainTransport::new(socket), handler, &engine).await,
                    Some(acceptor) => handshake(acceptor, socket, handler, &engine).await,
                }
            }
            .instrument(span),
        );
    }
}

async fn handshake(
    acceptor: TlsAcceptor,
    socket: TcpStream,
    handler: Option<SharedHandler>,
    engine: &EngineConfig,
) {
    match tokio::time::timeout(engine.idle_timeout, acceptor.accept(socket)).await {
        Ok(Ok(stream)) => serve(TlsTransport::new(stream), handler, engine).await,
        Ok(Err(e)) => warn!(error = %e, "TLS handshake failed"),
        Err(_) => warn!("TLS handshake timed out"),
    }
}

async fn serve<T: Transport>(transport: T, handler: Option<SharedHandler>, engine: &EngineConfig) {
    let mut conn = Connection::with_config(transport, handler, engine);
    match conn.run().await {
        Ok(()) => debug!("Connection closed"),
        Err(e @ ConnectionError::RequestTooLarge { .. }) => warn!(error = %e, "Request rejected"),
        Err(e) => debug!(error = %e, "Connection aborted"),
    }
}
