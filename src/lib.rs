//! wirepool: building blocks for binary-protocol TCP servers
//!
//! This crate provides two independent pieces that a server stack wires
//! together:
//! - A bounded pool of reusable async-I/O operation contexts, so that
//!   sustained connection load does not allocate per operation
//! - An MQTT 3.1.1 control packet codec producing byte-exact frames
//!
//! Features:
//! - Lock-free free list with a hard cap on idle contexts
//! - Pluggable create/cleanup hooks via the `PoolManager` trait
//! - CONNECT packet encoding with full field validation
//! - Configuration via TOML file

pub mod config;
pub mod logging;
pub mod protocols;
pub mod runtime;

pub use config::{Config, ConfigError, PoolConfig};
pub use protocols::mqtt::{ConnectPacket, ControlPacket, ControlPacketType, PacketError, QoS};
pub use runtime::{AsyncContext, AsyncContextPool, PoolManager, PoolStats, ResourcePool};
