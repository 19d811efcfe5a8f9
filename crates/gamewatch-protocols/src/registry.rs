use gamewatch_types::{GameType, Protocol};

#[derive(Debug, Clone)]
pub struct ProtocolMetadata {
    pub protocol: Protocol,
    pub transport: &'static str,
    pub description: &'static str,
    pub supports_roster: bool,
}

const PROTOCOLS: &[ProtocolMetadata] = &[
    ProtocolMetadata {
        protocol: Protocol::Source,
        transport: "udp",
        description: "Valve A2S_INFO / A2S_PLAYER",
        supports_roster: true,
    },
    ProtocolMetadata {
        protocol: Protocol::Samp,
        transport: "udp",
        description: "SA-MP / open.mp query ('i' info, 'd' players)",
        supports_roster: true,
    },
    ProtocolMetadata {
        protocol: Protocol::Minecraft,
        transport: "tcp",
        description: "Minecraft Java server list ping (players.sample)",
        supports_roster: true,
    },
];

pub fn get_all_protocols() -> &'static [ProtocolMetadata] {
    PROTOCOLS
}

pub fn get_protocol_metadata(protocol: Protocol) -> &'static ProtocolMetadata {
    PROTOCOLS
        .iter()
        .find(|p| p.protocol == protocol)
        .unwrap_or(&PROTOCOLS[0])
}

/// Every known game tag with the protocol it is queried with.
pub fn game_protocol_table() -> Vec<(&'static str, Protocol)> {
    GameType::all_known()
        .iter()
        .map(|tag| (*tag, GameType::from(*tag).protocol()))
        .collect()
}
