//! SA-MP / open.mp query over UDP.

pub mod packet;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::Result;
use crate::net::{connect_udp, elapsed_ms, resolve_ipv4, udp_exchange, with_timeout};
use crate::report::ProbeReport;
use packet::Opcode;

pub async fn query(host: &str, port: u16, timeout: Duration) -> Result<ProbeReport> {
    with_timeout(timeout, async {
        let ip = resolve_ipv4(host, port).await?;
        let socket = connect_udp(SocketAddr::from((ip, port))).await?;

        let start = Instant::now();
        let reply = udp_exchange(&socket, &packet::request(ip, port, Opcode::Info)).await?;
        let ping_ms = elapsed_ms(start);

        let mut report = packet::parse_info(&reply)?;
        report.ping_ms = ping_ms;
        Ok(report)
    })
    .await
}

pub async fn query_players(host: &str, port: u16, timeout: Duration) -> Result<Vec<String>> {
    with_timeout(timeout, async {
        let ip = resolve_ipv4(host, port).await?;
        let socket = connect_udp(SocketAddr::from((ip, port))).await?;

        let request = packet::request(ip, port, Opcode::DetailedPlayers);
        let reply = udp_exchange(&socket, &request).await?;
        packet::parse_players(&reply)
    })
    .await
}
