use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, Result};

/// Protocol version announced in the handshake (1.21)
pub const PROTOCOL_VERSION: i32 = 767;
pub const HANDSHAKE_ID: i32 = 0x00;
pub const STATUS_REQUEST_ID: i32 = 0x00;
pub const STATUS_RESPONSE_ID: i32 = 0x00;
/// Next state requested in the handshake: status
pub const NEXT_STATE_STATUS: i32 = 1;

/// Upper bound on the status JSON; real responses with a favicon stay well below
pub const MAX_JSON_LEN: usize = 2 * 1024 * 1024;

pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    while v >= 0x80 {
        buf.push((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Prefix `payload` with its varint length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(payload.len() + 5);
    write_varint(&mut packet, payload.len() as i32);
    packet.extend_from_slice(payload);
    packet
}

pub fn handshake(host: &str, port: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, HANDSHAKE_ID);
    write_varint(&mut payload, PROTOCOL_VERSION);
    write_string(&mut payload, host);
    payload.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut payload, NEXT_STATE_STATUS);
    frame(&payload)
}

pub fn status_request() -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, STATUS_REQUEST_ID);
    frame(&payload)
}

pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32> {
    let mut result: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = reader.read_u8().await?;
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result as i32);
        }
    }
    Err(Error::UnexpectedResponse("varint longer than 5 bytes".to_string()))
}

/// Read one status response packet and return its JSON body.
pub async fn read_status_json<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let _packet_len = read_varint(reader).await?;
    let packet_id = read_varint(reader).await?;
    if packet_id != STATUS_RESPONSE_ID {
        return Err(Error::UnexpectedResponse(format!(
            "packet id 0x{:02X} (expected status response)",
            packet_id
        )));
    }

    let json_len = read_varint(reader).await?;
    if json_len < 0 || json_len as usize > MAX_JSON_LEN {
        return Err(Error::UnexpectedResponse(format!(
            "status length {} out of range",
            json_len
        )));
    }

    let mut body = vec![0u8; json_len as usize];
    reader.read_exact(&mut body).await?;
    String::from_utf8(body)
        .map_err(|_| Error::UnexpectedResponse("status is not UTF-8".to_string()))
}
