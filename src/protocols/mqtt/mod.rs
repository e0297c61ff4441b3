//! MQTT 3.1.1 control packet codec.
//!
//! Every MQTT control packet shares one frame layout:
//!
//! ```text
//! +----------------+--------------------+-----------------+---------+
//! | type | flags   | remaining length   | variable header | payload |
//! | 4 bits 4 bits  | 1-4 bytes (VLQ)    | per command     |         |
//! +----------------+--------------------+-----------------+---------+
//! ```
//!
//! `ControlPacket` owns the framing; each command variant only supplies
//! its variable header and payload. CONNECT is the implemented command:
//!
//! ```text
//! [0x10][len][00 04 'M' 'Q' 'T' 'T'][level][flags][keep-alive:2]
//! [client id]([will topic][will message])?([user name])?([password])?
//! ```
//!
//! Text fields use the MQTT string encoding: a 2-byte big-endian length
//! followed by the raw bytes.
//!
//! ## Example
//!
//! ```
//! use wirepool::protocols::mqtt::ConnectPacket;
//!
//! let bytes = ConnectPacket::with_client_id("abc").encode().unwrap();
//! assert_eq!(&bytes[..2], &[0x10, 0x0F]);
//! ```

mod connect;
mod error;
mod packet;
pub mod remaining_length;
pub mod string;

pub use connect::{protocol_level, ConnectPacket, QoS, PROTOCOL_VERSIONS};
pub use error::PacketError;
pub use packet::{ControlPacket, ControlPacketType};
