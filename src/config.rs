use std::{env, net::SocketAddr, time::Duration};

use reqwest::Url;

use crate::dialect::DialectPreference;

/// One inference backend. `base_path` never ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    origin_scheme: String,
    origin_host: String,
    base_path: String,
}

impl BackendConfig {
    pub fn new(
        origin_scheme: impl Into<String>,
        origin_host: impl Into<String>,
        base_path: &str,
    ) -> Self {
        Self {
            origin_scheme: origin_scheme.into(),
            origin_host: origin_host.into(),
            base_path: base_path.trim_end_matches('/').to_owned(),
        }
    }

    pub fn from_url(url: &Url) -> Result<Self, String> {
        let host = url
            .host_str()
            .ok_or_else(|| format!("backend origin `{url}` has no host"))?;
        let origin_host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        Ok(Self::new(url.scheme(), origin_host, url.path()))
    }

    pub fn parse(origin: &str) -> Result<Self, String> {
        let url = Url::parse(origin.trim())
            .map_err(|error| format!("invalid backend origin `{origin}`: {error}"))?;
        Self::from_url(&url)
    }

    pub fn origin_scheme(&self) -> &str {
        &self.origin_scheme
    }

    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn origin(&self) -> String {
        format!("{}://{}", self.origin_scheme, self.origin_host)
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub backend: BackendConfig,
    pub dialect: DialectPreference,
    pub listen_addr: SocketAddr,
    pub connect_timeout: Duration,
    /// Longest silence allowed between reads of a backend response. It
    /// restarts on every read, so a generation that keeps producing tokens
    /// is never cut off however long it runs.
    pub read_timeout: Duration,
}

impl BridgeConfig {
    pub fn new(backend: BackendConfig, dialect: DialectPreference) -> Self {
        Self {
            backend,
            dialect,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(300),
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let origin = env::var("BRIDGE_BACKEND_ORIGIN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:11434".to_owned());
        let backend = BackendConfig::parse(&origin)?;

        let dialect = match env::var("BRIDGE_DIALECT") {
            Ok(value) if !value.trim().is_empty() => value.parse::<DialectPreference>()?,
            _ => DialectPreference::AutoDetect,
        };

        let listen_addr = match env::var("BRIDGE_LISTEN_ADDR") {
            Ok(value) if !value.trim().is_empty() => value
                .trim()
                .parse::<SocketAddr>()
                .map_err(|error| format!("invalid BRIDGE_LISTEN_ADDR `{value}`: {error}"))?,
            _ => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        Ok(Self {
            backend,
            dialect,
            listen_addr,
            connect_timeout: Duration::from_secs(read_u64("BRIDGE_CONNECT_TIMEOUT_SECS", 5)),
            read_timeout: Duration::from_secs(read_u64("BRIDGE_READ_TIMEOUT_SECS", 300)),
        })
    }
}

fn read_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
