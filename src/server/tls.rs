use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::Context;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;

use crate::config::TlsConfig;

/// Loads the PEM certificate chain and private key named by `cfg`.
pub fn acceptor(cfg: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
    let mut certs_reader = BufReader::new(
        File::open(&cfg.cert_path)
            .with_context(|| format!("failed to open {}", cfg.cert_path.display()))?,
    );
    let certs = rustls_pemfile::certs(&mut certs_reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid certificate in {}", cfg.cert_path.display()))?;

    let mut key_reader = BufReader::new(
        File::open(&cfg.key_path)
            .with_context(|| format!("failed to open {}", cfg.key_path.display()))?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .with_context(|| format!("invalid private key in {}", cfg.key_path.display()))?
        .with_context(|| format!("no private key found in {}", cfg.key_path.display()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate and key do not form a usable pair")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
