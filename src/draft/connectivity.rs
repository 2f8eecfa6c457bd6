use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityChange {
    WentOffline,
    CameOnline,
}

/// Edge detector over successive connectivity readings.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    last_known: bool,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        Self {
            last_known: initially_online,
        }
    }

    pub fn last_known(&self) -> bool {
        self.last_known
    }

    pub fn observe(&mut self, online: bool) -> Option<ConnectivityChange> {
        let change = match (self.last_known, online) {
            (true, false) => Some(ConnectivityChange::WentOffline),
            (false, true) => Some(ConnectivityChange::CameOnline),
            _ => None,
        };
        self.last_known = online;
        change
    }
}

/// Treats the machine as online while the backend host accepts TCP
/// connections.
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    address: String,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn from_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let url = reqwest::Url::parse(base_url)
            .with_context(|| format!("invalid backend url {base_url}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("backend url {base_url} has no host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("backend url {base_url} has no port"))?;
        Ok(Self::new(format!("{host}:{port}"), timeout))
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn is_online(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await,
            Ok(Ok(_))
        )
    }
}
