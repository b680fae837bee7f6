use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::http::timer::DEFAULT_IDLE_TIMEOUT;

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ListenerConfig {
    pub addr: String,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listeners")]
    pub listeners: Vec<ListenerConfig>,
    /// Runtime worker threads, defaults to the number of CPUs.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// Settings every connection is created with.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub idle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

fn default_listeners() -> Vec<ListenerConfig> {
    vec![ListenerConfig {
        addr: DEFAULT_LISTEN.to_string(),
        tls: None,
    }]
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listeners: default_listeners(),
            workers: None,
            static_dir: None,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// `LISTEN` sets the plaintext address. `TLS_LISTEN` together with
    /// `TLS_CERT` and `TLS_KEY` adds an encrypted listener. `WORKERS`,
    /// `STATIC_DIR` and `IDLE_TIMEOUT_SECS` map onto the matching fields.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut listeners = vec![ListenerConfig {
            addr: lookup("LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            tls: None,
        }];

        if let Some(addr) = lookup("TLS_LISTEN") {
            let cert_path = lookup("TLS_CERT").context("TLS_LISTEN is set but TLS_CERT is not")?;
            let key_path = lookup("TLS_KEY").context("TLS_LISTEN is set but TLS_KEY is not")?;
            listeners.push(ListenerConfig {
                addr,
                tls: Some(TlsConfig {
                    cert_path: cert_path.into(),
                    key_path: key_path.into(),
                }),
            });
        }

        let workers = lookup("WORKERS")
            .map(|v| v.parse::<usize>().with_context(|| format!("invalid WORKERS value {v:?}")))
            .transpose()?;

        let idle_timeout_secs = lookup("IDLE_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .with_context(|| format!("invalid IDLE_TIMEOUT_SECS value {v:?}"))
            })
            .transpose()?
            .unwrap_or_else(default_idle_timeout_secs);

        let cfg = Self {
            listeners,
            workers,
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
            idle_timeout_secs,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(s).context("invalid configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listeners.is_empty() {
            bail!("at least one listener is required");
        }
        if self.workers == Some(0) {
            bail!("workers must be at least 1");
        }
        if self.idle_timeout_secs == 0 {
            bail!("idle_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}
