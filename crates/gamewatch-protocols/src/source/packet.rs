use crate::reader::ByteReader;
use crate::report::ProbeReport;
use crate::{Error, Result};

pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
pub const INFO_REQUEST: &[u8] = b"\xFF\xFF\xFF\xFFTSource Engine Query\x00";
pub const PLAYER_REQUEST: u8 = 0x55;

pub const CHALLENGE_RESPONSE: u8 = 0x41;
pub const INFO_RESPONSE: u8 = 0x49;
pub const PLAYER_RESPONSE: u8 = 0x44;

/// Challenge sent with the first A2S_PLAYER request
pub const NO_CHALLENGE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

pub fn info_request(challenge: Option<[u8; 4]>) -> Vec<u8> {
    let mut request = INFO_REQUEST.to_vec();
    if let Some(challenge) = challenge {
        request.extend_from_slice(&challenge);
    }
    request
}

pub fn player_request(challenge: [u8; 4]) -> Vec<u8> {
    let mut request = HEADER.to_vec();
    request.push(PLAYER_REQUEST);
    request.extend_from_slice(&challenge);
    request
}

/// Challenge number carried by an `S2C_CHALLENGE` reply, if `data` is one.
pub fn challenge(data: &[u8]) -> Option<[u8; 4]> {
    if data.len() >= 9 && data[..4] == HEADER && data[4] == CHALLENGE_RESPONSE {
        Some([data[5], data[6], data[7], data[8]])
    } else {
        None
    }
}

fn expect_type(r: &mut ByteReader<'_>, expected: u8) -> Result<()> {
    let header = r.bytes(4, "header")?;
    if header != HEADER {
        return Err(Error::UnexpectedResponse(format!(
            "bad header {:02X?}",
            header
        )));
    }
    let kind = r.u8("response type")?;
    if kind != expected {
        return Err(Error::UnexpectedResponse(format!(
            "type 0x{:02X} (expected 0x{:02X})",
            kind, expected
        )));
    }
    Ok(())
}

/// Decode an A2S_INFO reply. `ping_ms` is left at zero for the caller to fill.
pub fn parse_info(data: &[u8]) -> Result<ProbeReport> {
    let mut r = ByteReader::new(data);
    expect_type(&mut r, INFO_RESPONSE)?;

    let _protocol = r.u8("protocol version")?;
    let server_name = r.cstring("server name")?;
    let map = r.cstring("map")?;
    let _folder = r.cstring("folder")?;
    let _game = r.cstring("game")?;
    let _app_id = r.u16_le("app id")?;
    let players_now = r.u8("players")?;
    let players_max = r.u8("max players")?;
    let _bots = r.u8("bots")?;

    Ok(ProbeReport {
        players_now: players_now as u32,
        players_max: players_max as u32,
        map,
        server_name,
        ping_ms: 0,
    })
}

/// Decode an A2S_PLAYER reply into player names.
///
/// Records cut short by the datagram end stop the scan; names read so far are kept.
pub fn parse_players(data: &[u8]) -> Result<Vec<String>> {
    let mut r = ByteReader::new(data);
    expect_type(&mut r, PLAYER_RESPONSE)?;

    let count = r.u8("player count")?;
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let Ok(record) = read_player(&mut r) else {
            break;
        };
        if !record.is_empty() {
            names.push(record);
        }
    }
    Ok(names)
}

fn read_player(r: &mut ByteReader<'_>) -> Result<String> {
    let _index = r.u8("player index")?;
    let name = r.cstring("player name")?;
    let _score = r.i32_le("score")?;
    let _duration = r.f32_le("duration")?;
    Ok(name.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamewatch_testing::fixtures::{A2sInfo, a2s_players_response};

    #[test]
    fn test_parse_info_exact_fields() {
        let bytes = A2sInfo {
            name: "My Server".into(),
            map: "de_dust2".into(),
            players: 12,
            max_players: 24,
            ..Default::default()
        }
        .to_bytes();

        let report = parse_info(&bytes).unwrap();
        assert_eq!(report.players_now, 12);
        assert_eq!(report.players_max, 24);
        assert_eq!(report.map, "de_dust2");
        assert_eq!(report.server_name, "My Server");
    }

    #[test]
    fn test_parse_info_truncated_is_error() {
        let bytes = A2sInfo::default().to_bytes();
        // The last four bytes are optional trailing fields; len - 5 drops the bot count
        for cut in [3, 5, 8, bytes.len() - 5] {
            assert!(parse_info(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_parse_info_rejects_wrong_type() {
        let mut bytes = A2sInfo::default().to_bytes();
        bytes[4] = 0x6D; // legacy GoldSrc reply
        assert!(matches!(
            parse_info(&bytes),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_challenge_detection() {
        let reply = [0xFF, 0xFF, 0xFF, 0xFF, 0x41, 1, 2, 3, 4];
        assert_eq!(challenge(&reply), Some([1, 2, 3, 4]));
        assert_eq!(challenge(&A2sInfo::default().to_bytes()), None);

        let request = info_request(Some([1, 2, 3, 4]));
        assert_eq!(&request[request.len() - 4..], &[1, 2, 3, 4]);
        assert!(request.starts_with(INFO_REQUEST));
    }

    #[test]
    fn test_parse_players_keeps_complete_records() {
        let mut bytes = a2s_players_response(&["Alice", "Bob", "Carol"]);
        // Cut into Carol's record
        bytes.truncate(bytes.len() - 6);

        let names = parse_players(&bytes).unwrap();
        assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
    }

    #[test]
    fn test_player_request_layout() {
        assert_eq!(
            player_request(NO_CHALLENGE),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0x55, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }
}
