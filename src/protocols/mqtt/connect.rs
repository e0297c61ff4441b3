//! CONNECT packet.
//!
//! The first packet a client sends after opening a connection. It names
//! the protocol and its level, carries the session and will options in a
//! single flags byte, and lists the client identifier followed by the
//! optional will and credential fields.

use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

use super::packet::ControlPacket;
use super::string::encode_string;
use super::PacketError;

/// Supported protocol versions and their protocol level byte.
pub const PROTOCOL_VERSIONS: &[(&str, u8)] = &[("3.1.1", 0x04)];

/// Look up the protocol level for a version string.
pub fn protocol_level(version: &str) -> Option<u8> {
    PROTOCOL_VERSIONS
        .iter()
        .find(|(name, _)| *name == version)
        .map(|(_, level)| *level)
}

// Connect flag bits
const USER_NAME: u8 = 0x80;
const PASSWORD: u8 = 0x40;
const WILL_RETAIN: u8 = 0x20;
const WILL_QOS_1: u8 = 0x08;
const WILL_QOS_2: u8 = 0x10;
const WILL: u8 = 0x04;
const CLEAN_SESSION: u8 = 0x02;

/// Delivery guarantee for the will message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> u8 {
        qos as u8
    }
}

impl TryFrom<u8> for QoS {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(PacketError::InvalidQoS(value)),
        }
    }
}

/// MQTT CONNECT packet.
///
/// Fields are public so a caller can configure the packet directly; the
/// `with_*` methods cover the common combinations and keep each flag in
/// step with its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPacket {
    pub protocol_name: String,
    /// Key into `PROTOCOL_VERSIONS`.
    pub protocol_version: String,
    pub client_identifier: String,
    /// Sent as whole seconds; must not exceed 65535 s.
    pub keep_alive: Duration,
    pub clean_session: bool,
    pub user_name_flag: bool,
    pub password_flag: bool,
    pub will_flag: bool,
    pub will_retain: bool,
    pub will_qos: QoS,
    pub will_topic: Option<String>,
    pub will_message: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        Self {
            protocol_name: "MQTT".to_string(),
            protocol_version: "3.1.1".to_string(),
            client_identifier: String::new(),
            keep_alive: Duration::from_secs(30),
            clean_session: true,
            user_name_flag: false,
            password_flag: false,
            will_flag: false,
            will_retain: false,
            will_qos: QoS::AtMostOnce,
            will_topic: None,
            will_message: None,
            user_name: None,
            password: None,
        }
    }
}

impl ConnectPacket {
    /// Fixed header flags; reserved as zero for CONNECT.
    pub const FLAGS: u8 = 0;

    /// Create a packet with default settings and no client identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a packet with default settings for the given client.
    pub fn with_client_id(client_identifier: impl Into<String>) -> Self {
        Self {
            client_identifier: client_identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    /// Set the will message and raise the will flag.
    pub fn with_will(
        mut self,
        topic: impl Into<String>,
        message: impl Into<String>,
        qos: QoS,
        retain: bool,
    ) -> Self {
        self.will_flag = true;
        self.will_topic = Some(topic.into());
        self.will_message = Some(message.into());
        self.will_qos = qos;
        self.will_retain = retain;
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name_flag = true;
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password_flag = true;
        self.password = Some(password.into());
        self
    }

    /// The connect flags byte.
    pub fn connect_flags(&self) -> u8 {
        let mut flags = 0u8;

        if self.user_name_flag {
            flags |= USER_NAME;
        }
        if self.password_flag {
            flags |= PASSWORD;
        }
        if self.will_retain {
            flags |= WILL_RETAIN;
        }
        if self.will_flag {
            flags |= WILL;
        }
        if self.clean_session {
            flags |= CLEAN_SESSION;
        }
        match self.will_qos {
            QoS::AtMostOnce => {}
            QoS::AtLeastOnce => flags |= WILL_QOS_1,
            QoS::ExactlyOnce => flags |= WILL_QOS_2,
        }

        flags
    }

    /// Encode the packet into a single contiguous buffer.
    pub fn encode(&self) -> Result<Bytes, PacketError> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoded packet to `buf`, leaving it untouched on error.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        ControlPacket::from(self).encode_into(buf)
    }

    /// Protocol name, level, connect flags, keep-alive.
    pub(super) fn write_variable_header(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        if is_blank(&self.protocol_name) || is_blank(&self.protocol_version) {
            return Err(PacketError::InvalidProtocol {
                name: self.protocol_name.clone(),
                version: self.protocol_version.clone(),
            });
        }
        let Some(level) = protocol_level(&self.protocol_version) else {
            return Err(PacketError::UnsupportedVersion {
                name: self.protocol_name.clone(),
                version: self.protocol_version.clone(),
            });
        };

        let keep_alive = self.keep_alive.as_secs();
        let keep_alive =
            u16::try_from(keep_alive).map_err(|_| PacketError::KeepAliveOutOfRange(keep_alive))?;

        encode_string(buf, &self.protocol_name)?;
        buf.put_u8(level);
        buf.put_u8(self.connect_flags());
        buf.put_u16(keep_alive);
        Ok(())
    }

    /// Client identifier, then will topic/message, user name, password as flagged.
    pub(super) fn write_payload(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        if is_blank(&self.client_identifier) {
            return Err(PacketError::InvalidClientIdentifier(
                self.client_identifier.clone(),
            ));
        }

        encode_string(buf, &self.client_identifier)?;

        if self.will_flag {
            encode_string(buf, required(&self.will_topic, "will topic")?)?;
            encode_string(buf, required(&self.will_message, "will message")?)?;
        }
        if self.user_name_flag {
            encode_string(buf, required(&self.user_name, "user name")?)?;
        }
        if self.password_flag {
            encode_string(buf, required(&self.password, "password")?)?;
        }

        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, PacketError> {
    field.as_deref().ok_or(PacketError::MissingField(name))
}
