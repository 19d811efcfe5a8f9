use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{UdpSocket, lookup_host};

use crate::{Error, Result};

/// Largest datagram the UDP protocols read in one go
pub(crate) const MAX_DATAGRAM: usize = 1400;

/// Run `fut` under the probe timeout, mapping expiry to `Error::Timeout`.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, fut).await?
}

pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    lookup_host((host, port))
        .await
        .map_err(|e| Error::Resolve(format!("{}: {}", host, e)))?
        .next()
        .ok_or_else(|| Error::Resolve(format!("{}: no addresses", host)))
}

/// First IPv4 address of `host`. SA-MP requests embed the octets, so IPv6 is unusable.
pub(crate) async fn resolve_ipv4(host: &str, port: u16) -> Result<Ipv4Addr> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    lookup_host((host, port))
        .await
        .map_err(|e| Error::Resolve(format!("{}: {}", host, e)))?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| Error::Resolve(format!("{}: no IPv4 address", host)))
}

/// UDP socket bound to an ephemeral port and connected to `addr`.
pub(crate) async fn connect_udp(addr: SocketAddr) -> Result<UdpSocket> {
    let bind: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.connect(addr).await?;
    Ok(socket)
}

/// Send one request and wait for one reply datagram.
pub(crate) async fn udp_exchange(socket: &UdpSocket, request: &[u8]) -> Result<Vec<u8>> {
    socket.send(request).await?;
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let n = socket.recv(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

pub(crate) fn elapsed_ms(start: std::time::Instant) -> u32 {
    start.elapsed().as_millis().min(u32::MAX as u128) as u32
}
