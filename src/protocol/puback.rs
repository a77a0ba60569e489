//! PUBACK packet

use std::fmt;

use super::ack::PacketIdOnly;
use super::{ControlPacket, FixedHeader, PacketIdAllocator, PacketType, Result};

/// PUBACK packet, the response to a QoS 1 PUBLISH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubAck {
    inner: PacketIdOnly,
}

impl PubAck {
    /// Create a PUBACK with an unset packet identifier
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: PacketIdOnly::new(PacketType::Puback),
        }
    }

    /// Create a PUBACK acknowledging `packet_id`
    #[must_use]
    pub fn with_packet_id(packet_id: u16) -> Self {
        let mut ack = Self::new();
        ack.set_packet_id(packet_id);
        ack
    }

    /// Get packet identifier
    #[must_use]
    pub const fn packet_id(&self) -> u16 {
        self.inner.packet_id()
    }

    /// Set packet identifier
    pub fn set_packet_id(&mut self, packet_id: u16) {
        self.inner.set_packet_id(packet_id);
    }

    /// Get fixed header
    #[must_use]
    pub const fn header(&self) -> &FixedHeader {
        self.inner.header()
    }
}

impl Default for PubAck {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPacket for PubAck {
    fn packet_type(&self) -> PacketType {
        PacketType::Puback
    }

    fn encoded_len(&self) -> Result<usize> {
        Ok(self.inner.encoded_len())
    }

    fn decode(&mut self, src: &[u8]) -> Result<usize> {
        self.inner.decode(src)
    }

    fn encode(&mut self, dst: &mut [u8], ids: &PacketIdAllocator) -> Result<usize> {
        self.inner.encode(dst, ids)
    }
}

impl fmt::Display for PubAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
