//! Packet types and QoS levels

use std::fmt;

use super::Error;

/// MQTT control packet types (high nibble of the first header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PacketType {
    /// Client request to connect
    Connect = 1,
    /// Connect acknowledgment
    Connack = 2,
    /// Publish message
    Publish = 3,
    /// Publish acknowledgment (QoS 1)
    Puback = 4,
    /// Publish received (QoS 2, part 1)
    Pubrec = 5,
    /// Publish release (QoS 2, part 2)
    Pubrel = 6,
    /// Publish complete (QoS 2, part 3)
    Pubcomp = 7,
    /// Subscribe request
    Subscribe = 8,
    /// Subscribe acknowledgment
    Suback = 9,
    /// Unsubscribe request
    Unsubscribe = 10,
    /// Unsubscribe acknowledgment
    Unsuback = 11,
    /// Ping request
    Pingreq = 12,
    /// Ping response
    Pingresp = 13,
    /// Client is disconnecting
    Disconnect = 14,
}

impl PacketType {
    /// Convert from the 4-bit type value
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Connect),
            2 => Some(Self::Connack),
            3 => Some(Self::Publish),
            4 => Some(Self::Puback),
            5 => Some(Self::Pubrec),
            6 => Some(Self::Pubrel),
            7 => Some(Self::Pubcomp),
            8 => Some(Self::Subscribe),
            9 => Some(Self::Suback),
            10 => Some(Self::Unsubscribe),
            11 => Some(Self::Unsuback),
            12 => Some(Self::Pingreq),
            13 => Some(Self::Pingresp),
            14 => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// Convert to the 4-bit type value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Flag nibble mandated for this packet type.
    ///
    /// PUBLISH carries dup/QoS/retain in its flags, so any value is accepted
    /// there; see [`PacketType::has_fixed_flags`].
    #[must_use]
    pub const fn default_flags(self) -> u8 {
        match self {
            Self::Pubrel | Self::Subscribe | Self::Unsubscribe => 0b0010,
            _ => 0,
        }
    }

    /// Whether the flag nibble is fixed for this type
    #[must_use]
    pub const fn has_fixed_flags(self) -> bool {
        !matches!(self, Self::Publish)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "CONNECT",
            Self::Connack => "CONNACK",
            Self::Publish => "PUBLISH",
            Self::Puback => "PUBACK",
            Self::Pubrec => "PUBREC",
            Self::Pubrel => "PUBREL",
            Self::Pubcomp => "PUBCOMP",
            Self::Subscribe => "SUBSCRIBE",
            Self::Suback => "SUBACK",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Unsuback => "UNSUBACK",
            Self::Pingreq => "PINGREQ",
            Self::Pingresp => "PINGRESP",
            Self::Disconnect => "DISCONNECT",
        };
        write!(f, "{name}")
    }
}

/// Quality of Service levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(clippy::enum_variant_names)]
pub enum QoS {
    /// Fire and forget
    #[default]
    AtMostOnce = 0,
    /// Acknowledged delivery
    AtLeastOnce = 1,
    /// Assured single delivery
    ExactlyOnce = 2,
}

impl QoS {
    /// Convert from byte
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AtMostOnce),
            1 => Some(Self::AtLeastOnce),
            2 => Some(Self::ExactlyOnce),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(Error::InvalidQos { qos: value })
    }
}

impl fmt::Display for QoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
