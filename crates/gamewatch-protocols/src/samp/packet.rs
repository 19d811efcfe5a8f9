use std::net::Ipv4Addr;

use crate::reader::ByteReader;
use crate::report::ProbeReport;
use crate::{Error, Result};

pub const MAGIC: &[u8; 4] = b"SAMP";
/// Magic + IPv4 octets + port + opcode, echoed at the start of every reply
pub const HEADER_LEN: usize = 11;

pub const MAX_HOSTNAME: usize = 256;
pub const MAX_GAMEMODE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Info,
    DetailedPlayers,
}

impl Opcode {
    pub fn byte(self) -> u8 {
        match self {
            Opcode::Info => b'i',
            Opcode::DetailedPlayers => b'd',
        }
    }
}

pub fn request(ip: Ipv4Addr, port: u16, opcode: Opcode) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN);
    packet.extend_from_slice(MAGIC);
    packet.extend_from_slice(&ip.octets());
    packet.extend_from_slice(&port.to_le_bytes());
    packet.push(opcode.byte());
    packet
}

fn body(data: &[u8], opcode: Opcode) -> Result<&[u8]> {
    if data.len() < HEADER_LEN {
        return Err(Error::Truncated("reply header"));
    }
    if &data[..4] != MAGIC {
        return Err(Error::UnexpectedResponse("missing SAMP magic".to_string()));
    }
    if data[HEADER_LEN - 1] != opcode.byte() {
        return Err(Error::UnexpectedResponse(format!(
            "opcode '{}' (expected '{}')",
            data[HEADER_LEN - 1] as char,
            opcode.byte() as char
        )));
    }
    Ok(&data[HEADER_LEN..])
}

fn length_prefixed(r: &mut ByteReader<'_>, max: usize, field: &'static str) -> Result<String> {
    let len = r.u32_le(field)? as usize;
    let raw = r.bytes(len, field)?;
    let raw = &raw[..len.min(max)];
    Ok(String::from_utf8_lossy(raw).into_owned())
}

/// Decode an `'i'` reply. The gamemode string is reported as the map.
pub fn parse_info(data: &[u8]) -> Result<ProbeReport> {
    let mut r = ByteReader::new(body(data, Opcode::Info)?);

    let _password = r.u8("password flag")?;
    let players_now = r.u16_le("players")?;
    let players_max = r.u16_le("max players")?;
    let hostname = length_prefixed(&mut r, MAX_HOSTNAME, "hostname")?;
    let gamemode = length_prefixed(&mut r, MAX_GAMEMODE, "gamemode")?;

    Ok(ProbeReport {
        players_now: players_now as u32,
        players_max: players_max as u32,
        map: gamemode,
        server_name: hostname,
        ping_ms: 0,
    })
}

/// Decode a `'d'` reply into player names.
///
/// A malformed record ends the scan; names collected before it are returned.
pub fn parse_players(data: &[u8]) -> Result<Vec<String>> {
    let mut r = ByteReader::new(body(data, Opcode::DetailedPlayers)?);

    let count = r.u16_le("player count")?;
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let Ok(name) = read_player(&mut r) else {
            break;
        };
        if !name.is_empty() {
            names.push(name);
        }
    }
    Ok(names)
}

fn read_player(r: &mut ByteReader<'_>) -> Result<String> {
    let _id = r.u8("player id")?;
    let len = r.u8("name length")? as usize;
    let name = r.bytes(len, "player name")?;
    let _score = r.i32_le("score")?;
    Ok(String::from_utf8_lossy(name).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamewatch_testing::fixtures::{SampInfo, samp_players_response};

    #[test]
    fn test_request_layout() {
        let packet = request(Ipv4Addr::new(10, 0, 0, 5), 7777, Opcode::Info);
        assert_eq!(
            packet,
            vec![b'S', b'A', b'M', b'P', 10, 0, 0, 5, 0x61, 0x1E, b'i']
        );
    }

    #[test]
    fn test_parse_info() {
        let bytes = SampInfo {
            hostname: "Los Santos RP".into(),
            gamemode: "Roleplay".into(),
            players: 57,
            max_players: 500,
            ..Default::default()
        }
        .to_bytes();

        let report = parse_info(&bytes).unwrap();
        assert_eq!(report.players_now, 57);
        assert_eq!(report.players_max, 500);
        assert_eq!(report.server_name, "Los Santos RP");
        assert_eq!(report.map, "Roleplay");
    }

    #[test]
    fn test_parse_info_clamps_long_gamemode() {
        let bytes = SampInfo {
            gamemode: "g".repeat(100),
            ..Default::default()
        }
        .to_bytes();

        let report = parse_info(&bytes).unwrap();
        assert_eq!(report.map.len(), MAX_GAMEMODE);
    }

    #[test]
    fn test_parse_info_rejects_short_or_foreign_reply() {
        let bytes = SampInfo::default().to_bytes();
        assert!(parse_info(&bytes[..HEADER_LEN + 2]).is_err());
        assert!(parse_info(b"XXXX").is_err());

        let mut wrong_opcode = bytes.clone();
        wrong_opcode[HEADER_LEN - 1] = b'c';
        assert!(matches!(
            parse_info(&wrong_opcode),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_players_stops_at_malformed_record() {
        let mut bytes = samp_players_response(&["Carl", "Sweet", "Ryder"]);
        // Claim a longer name for the last record than the datagram holds
        let last_len_at = bytes.len() - 4 - "Ryder".len() - 1;
        bytes[last_len_at] = 200;

        let names = parse_players(&bytes).unwrap();
        assert_eq!(names, vec!["Carl".to_string(), "Sweet".to_string()]);
    }
}
