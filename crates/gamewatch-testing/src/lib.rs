//! Testing infrastructure for gamewatch integration tests.
//!
//! - `fixtures`: wire-format reply builders for every supported protocol
//! - `mock`: loopback UDP/TCP servers that answer like real game servers
//! - `world`: temp data directory + config file + CLI invocation

pub mod fixtures;
pub mod mock;
pub mod world;

pub use mock::{MockMinecraftServer, MockSampServer, MockSourceServer};
pub use world::TestWorld;
