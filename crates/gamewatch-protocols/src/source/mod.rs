//! Valve Source engine query (A2S) over UDP.
//!
//! Servers may answer either request with an `S2C_CHALLENGE`; the request is
//! then repeated once with the challenge number appended.

pub mod packet;

use std::time::{Duration, Instant};

use crate::net::{connect_udp, elapsed_ms, resolve, udp_exchange, with_timeout};
use crate::report::ProbeReport;
use crate::Result;

/// A2S_INFO probe.
pub async fn query(host: &str, port: u16, timeout: Duration) -> Result<ProbeReport> {
    with_timeout(timeout, async {
        let socket = connect_udp(resolve(host, port).await?).await?;

        let start = Instant::now();
        let mut reply = udp_exchange(&socket, &packet::info_request(None)).await?;
        let ping_ms = elapsed_ms(start);

        if let Some(challenge) = packet::challenge(&reply) {
            reply = udp_exchange(&socket, &packet::info_request(Some(challenge))).await?;
        }

        let mut report = packet::parse_info(&reply)?;
        report.ping_ms = ping_ms;
        Ok(report)
    })
    .await
}

/// A2S_PLAYER roster probe.
pub async fn query_players(host: &str, port: u16, timeout: Duration) -> Result<Vec<String>> {
    with_timeout(timeout, async {
        let socket = connect_udp(resolve(host, port).await?).await?;

        let mut reply = udp_exchange(&socket, &packet::player_request(packet::NO_CHALLENGE)).await?;
        if let Some(challenge) = packet::challenge(&reply) {
            reply = udp_exchange(&socket, &packet::player_request(challenge)).await?;
        }

        packet::parse_players(&reply)
    })
    .await
}
