use std::time::Duration;

use gamewatch_types::Protocol;
use tracing::trace;

use crate::report::ProbeReport;
use crate::{Result, minecraft, samp, source};

/// Per-probe deadline covering resolve, connect, every send and every read
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Entry point that dispatches a probe to the client for `protocol`
#[derive(Debug, Clone, Copy)]
pub struct QueryClient {
    timeout: Duration,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl QueryClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, protocol: Protocol, host: &str, port: u16) -> Result<ProbeReport> {
        trace!(%protocol, host, port, "status probe");
        match protocol {
            Protocol::Source => source::query(host, port, self.timeout).await,
            Protocol::Samp => samp::query(host, port, self.timeout).await,
            Protocol::Minecraft => minecraft::query(host, port, self.timeout).await,
        }
    }

    pub async fn probe_players(
        &self,
        protocol: Protocol,
        host: &str,
        port: u16,
    ) -> Result<Vec<String>> {
        trace!(%protocol, host, port, "roster probe");
        match protocol {
            Protocol::Source => source::query_players(host, port, self.timeout).await,
            Protocol::Samp => samp::query_players(host, port, self.timeout).await,
            Protocol::Minecraft => minecraft::query_players(host, port, self.timeout).await,
        }
    }
}
