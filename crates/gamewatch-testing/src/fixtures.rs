//! Reply builders for the supported wire protocols.
//!
//! Byte layouts mirror what real servers send so parser tests and mock
//! servers share one definition.

/// A2S_INFO reply fields
#[derive(Debug, Clone)]
pub struct A2sInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
}

impl Default for A2sInfo {
    fn default() -> Self {
        Self {
            protocol: 17,
            name: "Test Server".to_string(),
            map: "de_dust2".to_string(),
            folder: "cstrike".to_string(),
            game: "Counter-Strike".to_string(),
            app_id: 10,
            players: 0,
            max_players: 32,
            bots: 0,
        }
    }
}

impl A2sInfo {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x49, self.protocol];
        for s in [&self.name, &self.map, &self.folder, &self.game] {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        out.extend_from_slice(&self.app_id.to_le_bytes());
        out.extend_from_slice(&[self.players, self.max_players, self.bots]);
        // Trailing EDF-less fields: server type, environment, visibility, vac
        out.extend_from_slice(&[b'd', b'l', 0, 1]);
        out
    }
}

pub fn a2s_challenge(challenge: [u8; 4]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x41];
    out.extend_from_slice(&challenge);
    out
}

pub fn a2s_players_response(names: &[&str]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x44, names.len() as u8];
    for (index, name) in names.iter().enumerate() {
        out.push(index as u8);
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(&(10 * index as i32).to_le_bytes());
        out.extend_from_slice(&120.5f32.to_le_bytes());
    }
    out
}

/// SA-MP `'i'` reply fields
#[derive(Debug, Clone)]
pub struct SampInfo {
    pub password: bool,
    pub players: u16,
    pub max_players: u16,
    pub hostname: String,
    pub gamemode: String,
    pub language: String,
}

impl Default for SampInfo {
    fn default() -> Self {
        Self {
            password: false,
            players: 0,
            max_players: 100,
            hostname: "SA-MP Server".to_string(),
            gamemode: "Freeroam".to_string(),
            language: "English".to_string(),
        }
    }
}

/// Header echoed by SA-MP replies; address fields are not checked by clients
pub fn samp_header(opcode: u8) -> Vec<u8> {
    let mut out = b"SAMP".to_vec();
    out.extend_from_slice(&[127, 0, 0, 1]);
    out.extend_from_slice(&7777u16.to_le_bytes());
    out.push(opcode);
    out
}

impl SampInfo {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = samp_header(b'i');
        out.push(self.password as u8);
        out.extend_from_slice(&self.players.to_le_bytes());
        out.extend_from_slice(&self.max_players.to_le_bytes());
        for s in [&self.hostname, &self.gamemode, &self.language] {
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        out
    }
}

pub fn samp_players_response(names: &[&str]) -> Vec<u8> {
    let mut out = samp_header(b'd');
    out.extend_from_slice(&(names.len() as u16).to_le_bytes());
    for (id, name) in names.iter().enumerate() {
        out.push(id as u8);
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(id as i32 * 100).to_le_bytes());
    }
    out
}

fn varint(out: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    while v >= 0x80 {
        out.push((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

/// Framed status response packet carrying `json`
pub fn minecraft_status_packet(json: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    varint(&mut payload, 0x00);
    varint(&mut payload, json.len() as i32);
    payload.extend_from_slice(json.as_bytes());

    let mut out = Vec::new();
    varint(&mut out, payload.len() as i32);
    out.extend_from_slice(&payload);
    out
}

/// Status JSON with the given counts, sample names and MOTD
pub fn minecraft_status_json(online: u32, max: u32, sample: &[&str], motd: &str) -> String {
    let sample: Vec<_> = sample
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "name": name,
                "id": format!("00000000-0000-0000-0000-{:012}", i),
            })
        })
        .collect();
    serde_json::json!({
        "version": { "name": "1.21", "protocol": 767 },
        "players": { "online": online, "max": max, "sample": sample },
        "description": motd,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_packet_length_prefix() {
        let packet = minecraft_status_packet("{}");
        // length(1) id(1) strlen(1) body(2)
        assert_eq!(packet, vec![4, 0, 2, b'{', b'}']);
    }

    #[test]
    fn test_samp_header_len() {
        assert_eq!(samp_header(b'i').len(), 11);
    }
}
