//! Minecraft Java server list ping (handshake + status request over TCP).

pub mod codec;
pub mod status;

use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::Result;
use crate::net::{elapsed_ms, with_timeout};
use crate::report::ProbeReport;
use status::StatusResponse;

async fn fetch_status(host: &str, port: u16) -> Result<(StatusResponse, u32)> {
    let mut stream = TcpStream::connect((host, port)).await?;

    let start = Instant::now();
    let mut request = codec::handshake(host, port);
    request.extend_from_slice(&codec::status_request());
    stream.write_all(&request).await?;

    let json = codec::read_status_json(&mut stream).await?;
    let ping_ms = elapsed_ms(start);

    Ok((status::parse(&json)?, ping_ms))
}

pub async fn query(host: &str, port: u16, timeout: Duration) -> Result<ProbeReport> {
    with_timeout(timeout, async {
        let (status, ping_ms) = fetch_status(host, port).await?;
        let mut report = status.report();
        report.ping_ms = ping_ms;
        Ok(report)
    })
    .await
}

/// Player names from `players.sample`. Large servers only expose a subset.
pub async fn query_players(host: &str, port: u16, timeout: Duration) -> Result<Vec<String>> {
    with_timeout(timeout, async {
        let (status, _) = fetch_status(host, port).await?;
        Ok(status.player_names())
    })
    .await
}
