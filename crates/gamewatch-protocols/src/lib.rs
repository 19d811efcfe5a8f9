//! Native query clients for game servers.
//!
//! Each protocol module exposes `query` (status) and `query_players` (roster)
//! plus pure packet builders/parsers. Any failure, including a timeout or a
//! malformed reply, is an [`Error`]; callers treat all of them as "offline".

pub mod client;
pub mod error;
pub mod minecraft;
mod net;
mod reader;
pub mod registry;
pub mod report;
pub mod samp;
pub mod source;

pub use client::{DEFAULT_TIMEOUT, QueryClient};
pub use error::{Error, Result};
pub use registry::{ProtocolMetadata, game_protocol_table, get_all_protocols, get_protocol_metadata};
pub use report::ProbeReport;
