use thiserror::Error;

/// Errors raised while encoding or decoding MQTT packets.
///
/// Encoding validates every field before any byte is emitted, so an error
/// here means no output was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("Invalid protocol name [{name}] or version [{version}]")]
    InvalidProtocol { name: String, version: String },

    #[error("Cannot support version [{name} {version}]")]
    UnsupportedVersion { name: String, version: String },

    #[error("Invalid client identifier [{0}]")]
    InvalidClientIdentifier(String),

    #[error("Missing {0} while its flag is set")]
    MissingField(&'static str),

    #[error("String length {0} exceeds maximum 65535")]
    StringTooLong(usize),

    #[error("Keep-alive interval {0}s exceeds maximum 65535s")]
    KeepAliveOutOfRange(u64),

    #[error("Remaining length {0} exceeds maximum 268435455")]
    RemainingLengthTooLarge(usize),

    #[error("Insufficient bytes: need {needed}, have {available}")]
    Incomplete { needed: usize, available: usize },

    #[error("Remaining length uses more than 4 bytes")]
    MalformedRemainingLength,

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Unknown control packet type {0}")]
    UnknownPacketType(u8),

    #[error("Invalid QoS level {0}")]
    InvalidQoS(u8),
}
