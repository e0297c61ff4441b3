//! Control packet framing.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use super::connect::ConnectPacket;
use super::remaining_length;
use super::PacketError;

/// MQTT 3.1.1 command codes (upper nibble of the fixed header).
///
/// Only `Connect` has an encoder; the other codes are listed so that
/// header bytes can be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlPacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl From<ControlPacketType> for u8 {
    fn from(packet_type: ControlPacketType) -> u8 {
        packet_type as u8
    }
}

impl TryFrom<u8> for ControlPacketType {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ControlPacketType::*;

        Ok(match value {
            1 => Connect,
            2 => ConnAck,
            3 => Publish,
            4 => PubAck,
            5 => PubRec,
            6 => PubRel,
            7 => PubComp,
            8 => Subscribe,
            9 => SubAck,
            10 => Unsubscribe,
            11 => UnsubAck,
            12 => PingReq,
            13 => PingResp,
            14 => Disconnect,
            _ => return Err(PacketError::UnknownPacketType(value)),
        })
    }
}

/// An encodable MQTT control packet.
///
/// The command is held as a `Cow` so a packet can be framed straight from a
/// borrowed command as well as an owned one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPacket<'a> {
    Connect(Cow<'a, ConnectPacket>),
}

impl ControlPacket<'_> {
    /// Command code of this packet.
    pub fn packet_type(&self) -> ControlPacketType {
        match self {
            ControlPacket::Connect(_) => ControlPacketType::Connect,
        }
    }

    /// The 4 flag bits of the fixed header.
    pub fn flags(&self) -> u8 {
        match self {
            ControlPacket::Connect(_) => ConnectPacket::FLAGS,
        }
    }

    /// Encode the packet into a single contiguous buffer.
    pub fn encode(&self) -> Result<Bytes, PacketError> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoded packet to `buf`.
    ///
    /// `buf` is left untouched if encoding fails.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        encode_frame(
            buf,
            self.packet_type(),
            self.flags(),
            |b| self.write_variable_header(b),
            |b| self.write_payload(b),
        )
    }

    fn write_variable_header(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        match self {
            ControlPacket::Connect(connect) => connect.write_variable_header(buf),
        }
    }

    fn write_payload(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        match self {
            ControlPacket::Connect(connect) => connect.write_payload(buf),
        }
    }
}

impl From<ConnectPacket> for ControlPacket<'static> {
    fn from(packet: ConnectPacket) -> Self {
        ControlPacket::Connect(Cow::Owned(packet))
    }
}

impl<'a> From<&'a ConnectPacket> for ControlPacket<'a> {
    fn from(packet: &'a ConnectPacket) -> Self {
        ControlPacket::Connect(Cow::Borrowed(packet))
    }
}

/// Frame a packet: fixed header, remaining length, variable header, payload.
///
/// The variable header and payload are built into scratch buffers first,
/// so a failure in either step leaves `buf` unchanged.
fn encode_frame<H, P>(
    buf: &mut BytesMut,
    packet_type: ControlPacketType,
    flags: u8,
    variable_header: H,
    payload: P,
) -> Result<(), PacketError>
where
    H: FnOnce(&mut BytesMut) -> Result<(), PacketError>,
    P: FnOnce(&mut BytesMut) -> Result<(), PacketError>,
{
    let mut header_bytes = BytesMut::new();
    variable_header(&mut header_bytes)?;

    let mut payload_bytes = BytesMut::new();
    payload(&mut payload_bytes)?;

    let remaining = header_bytes.len() + payload_bytes.len();
    let mut fixed = BytesMut::with_capacity(5);
    fixed.put_u8((u8::from(packet_type) << 4) | (flags & 0x0F));
    remaining_length::encode(&mut fixed, remaining)?;

    buf.reserve(fixed.len() + remaining);
    buf.put_slice(&fixed);
    buf.put_slice(&header_bytes);
    buf.put_slice(&payload_bytes);

    trace!(
        packet_type = ?packet_type,
        remaining_length = remaining,
        "Encoded control packet"
    );
    Ok(())
}
