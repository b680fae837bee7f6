//! Listening sockets and the accept loop.

pub mod listener;
pub mod tls;

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::http::connection::{Handler, SharedHandler};

/// Top-level server: a configuration plus the request handler every
/// connection dispatches to.
pub struct Server {
    config: Config,
    handler: Option<SharedHandler>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the handler. Without one every request gets a 400.
    pub fn request_handler<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Serves until Ctrl-C or until a listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        tokio::select! {
            res = listener::run(&self.config, self.handler.clone()) => res,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}
