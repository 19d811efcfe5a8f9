//! Loopback game servers for end-to-end probe tests.
//!
//! Each mock binds `127.0.0.1:0`, answers in its protocol's wire format, and
//! can be told to go silent to simulate an unreachable server. The serving
//! task is aborted when the mock is dropped.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

use crate::fixtures::{
    A2sInfo, SampInfo, a2s_challenge, a2s_players_response, minecraft_status_packet,
    samp_players_response,
};

/// Challenge the Source mock hands out
pub const MOCK_CHALLENGE: [u8; 4] = [0x0A, 0x0B, 0x0C, 0x0D];

#[derive(Clone)]
struct Control {
    responding: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl Control {
    fn new() -> Self {
        Self {
            responding: Arc::new(AtomicBool::new(true)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Shared handle pieces for every mock
struct MockHandle {
    addr: SocketAddr,
    control: Control,
    task: JoinHandle<()>,
}

impl MockHandle {
    fn set_responding(&self, responding: bool) {
        self.control.responding.store(responding, Ordering::SeqCst);
    }

    fn requests(&self) -> usize {
        self.control.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn spawn_udp<F>(control: Control, handler: F) -> std::io::Result<MockHandle>
where
    F: Fn(&[u8]) -> Option<Vec<u8>> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let addr = socket.local_addr()?;
    let task_control = control.clone();

    let task = tokio::spawn(async move {
        let mut buf = vec![0u8; 1500];
        loop {
            let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                break;
            };
            task_control.requests.fetch_add(1, Ordering::SeqCst);
            if !task_control.responding.load(Ordering::SeqCst) {
                continue;
            }
            if let Some(reply) = handler(&buf[..n]) {
                let _ = socket.send_to(&reply, peer).await;
            }
        }
    });

    Ok(MockHandle {
        addr,
        control,
        task,
    })
}

/// A2S server answering A2S_INFO and A2S_PLAYER
pub struct MockSourceServer {
    handle: MockHandle,
    info: Arc<Mutex<A2sInfo>>,
    players: Arc<Mutex<Vec<String>>>,
}

impl MockSourceServer {
    /// `require_challenge` makes the first A2S_INFO request get a challenge reply.
    pub async fn start(
        info: A2sInfo,
        players: &[&str],
        require_challenge: bool,
    ) -> std::io::Result<Self> {
        let info = Arc::new(Mutex::new(info));
        let players = Arc::new(Mutex::new(
            players.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        ));

        let handler_info = info.clone();
        let handler_players = players.clone();
        let handle = spawn_udp(Control::new(), move |request| {
            if request.len() < 5 || request[..4] != [0xFF; 4] {
                return None;
            }
            match request[4] {
                b'T' => {
                    let has_challenge = request.ends_with(&MOCK_CHALLENGE);
                    if require_challenge && !has_challenge {
                        Some(a2s_challenge(MOCK_CHALLENGE))
                    } else {
                        Some(handler_info.lock().ok()?.to_bytes())
                    }
                }
                0x55 => {
                    if request.ends_with(&MOCK_CHALLENGE) {
                        let names = handler_players.lock().ok()?.clone();
                        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                        Some(a2s_players_response(&refs))
                    } else {
                        Some(a2s_challenge(MOCK_CHALLENGE))
                    }
                }
                _ => None,
            }
        })
        .await?;

        Ok(Self {
            handle,
            info,
            players,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.addr
    }

    pub fn set_info(&self, info: A2sInfo) {
        if let Ok(mut guard) = self.info.lock() {
            *guard = info;
        }
    }

    pub fn set_players(&self, players: &[&str]) {
        if let Ok(mut guard) = self.players.lock() {
            *guard = players.iter().map(|p| p.to_string()).collect();
        }
    }

    pub fn set_responding(&self, responding: bool) {
        self.handle.set_responding(responding);
    }

    pub fn requests(&self) -> usize {
        self.handle.requests()
    }
}

/// SA-MP server answering `'i'` and `'d'`
pub struct MockSampServer {
    handle: MockHandle,
    info: Arc<Mutex<SampInfo>>,
    players: Arc<Mutex<Vec<String>>>,
}

impl MockSampServer {
    pub async fn start(info: SampInfo, players: &[&str]) -> std::io::Result<Self> {
        let info = Arc::new(Mutex::new(info));
        let players = Arc::new(Mutex::new(
            players.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        ));

        let handler_info = info.clone();
        let handler_players = players.clone();
        let handle = spawn_udp(Control::new(), move |request| {
            if request.len() < 11 || &request[..4] != b"SAMP" {
                return None;
            }
            match request[10] {
                b'i' => Some(handler_info.lock().ok()?.to_bytes()),
                b'd' => {
                    let names = handler_players.lock().ok()?.clone();
                    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                    Some(samp_players_response(&refs))
                }
                _ => None,
            }
        })
        .await?;

        Ok(Self {
            handle,
            info,
            players,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.addr
    }

    pub fn set_info(&self, info: SampInfo) {
        if let Ok(mut guard) = self.info.lock() {
            *guard = info;
        }
    }

    pub fn set_players(&self, players: &[&str]) {
        if let Ok(mut guard) = self.players.lock() {
            *guard = players.iter().map(|p| p.to_string()).collect();
        }
    }

    pub fn set_responding(&self, responding: bool) {
        self.handle.set_responding(responding);
    }

    pub fn requests(&self) -> usize {
        self.handle.requests()
    }
}

/// Minecraft server answering the server list ping with a fixed JSON body
pub struct MockMinecraftServer {
    handle: MockHandle,
    json: Arc<Mutex<String>>,
}

impl MockMinecraftServer {
    pub async fn start(json: impl Into<String>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let json = Arc::new(Mutex::new(json.into()));
        let control = Control::new();

        let task_json = json.clone();
        let task_control = control.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                task_control.requests.fetch_add(1, Ordering::SeqCst);
                if !task_control.responding.load(Ordering::SeqCst) {
                    // Hold the connection open without answering
                    tokio::spawn(async move {
                        let _stream = stream;
                        std::future::pending::<()>().await;
                    });
                    continue;
                }
                let body = task_json.lock().map(|j| j.clone()).unwrap_or_default();
                tokio::spawn(serve_status(stream, body));
            }
        });

        Ok(Self {
            handle: MockHandle {
                addr,
                control,
                task,
            },
            json,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.addr
    }

    pub fn set_json(&self, json: impl Into<String>) {
        if let Ok(mut guard) = self.json.lock() {
            *guard = json.into();
        }
    }

    pub fn set_responding(&self, responding: bool) {
        self.handle.set_responding(responding);
    }

    pub fn requests(&self) -> usize {
        self.handle.requests()
    }
}

async fn read_varint(stream: &mut TcpStream) -> std::io::Result<u32> {
    let mut result = 0u32;
    for shift in (0..35).step_by(7) {
        let byte = stream.read_u8().await?;
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok(result)
}

async fn skip_packet(stream: &mut TcpStream) -> std::io::Result<()> {
    let len = read_varint(stream).await? as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(())
}

async fn serve_status(mut stream: TcpStream, json: String) {
    // handshake, then status request
    if skip_packet(&mut stream).await.is_err() || skip_packet(&mut stream).await.is_err() {
        return;
    }
    let _ = stream.write_all(&minecraft_status_packet(&json)).await;
    let _ = stream.shutdown().await;
}
