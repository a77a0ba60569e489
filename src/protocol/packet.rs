//! Packet capability and type dispatch

use bytes::Bytes;
use tracing::debug;

use super::{
    Error, FixedHeader, PacketIdAllocator, PacketType, PubAck, Result, Subscribe, UnsubAck,
};

/// Contract shared by every control packet.
///
/// Packets keep the bytes of their last successful decode or encode and
/// return them verbatim from [`ControlPacket::encode`] until a mutator
/// discards them.
pub trait ControlPacket {
    /// Packet type written in the fixed header
    fn packet_type(&self) -> PacketType;

    /// Total encoded size (fixed header, variable header and payload)
    fn encoded_len(&self) -> Result<usize>;

    /// Decode from the front of `src`, replacing the packet's content.
    ///
    /// Returns the number of bytes consumed. On error the packet is left
    /// unchanged.
    fn decode(&mut self, src: &[u8]) -> Result<usize>;

    /// Encode into `dst`, taking a packet identifier from `ids` when the
    /// packet has none yet. Returns the number of bytes written.
    fn encode(&mut self, dst: &mut [u8], ids: &PacketIdAllocator) -> Result<usize>;

    /// Encode into a freshly allocated buffer
    fn encode_to_vec(&mut self, ids: &PacketIdAllocator) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()?];
        let n = self.encode(&mut buf, ids)?;
        buf.truncate(n);
        Ok(buf)
    }
}

/// Copy a cached encoding into `dst`.
pub(crate) fn copy_cached(cached: &Bytes, dst: &mut [u8]) -> Result<usize> {
    let needed = cached.len();
    if dst.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            got: dst.len(),
        });
    }
    dst[..needed].copy_from_slice(cached);
    Ok(needed)
}

/// Any packet this codec understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// SUBSCRIBE
    Subscribe(Subscribe),
    /// PUBACK
    PubAck(PubAck),
    /// UNSUBACK
    UnsubAck(UnsubAck),
}

impl Packet {
    /// Decode whichever packet starts at the front of `src`.
    ///
    /// Returns the packet and the number of bytes consumed. Packet types
    /// without a codec here fail with [`Error::UnsupportedPacketType`].
    pub fn decode(src: &[u8]) -> Result<(Self, usize)> {
        let (header, _) = FixedHeader::decode(src)?;

        let result = match header.packet_type() {
            PacketType::Subscribe => Self::decode_as(src, Subscribe::new(), Self::Subscribe),
            PacketType::Puback => Self::decode_as(src, PubAck::new(), Self::PubAck),
            PacketType::Unsuback => Self::decode_as(src, UnsubAck::new(), Self::UnsubAck),
            packet_type => Err(Error::UnsupportedPacketType { packet_type }),
        };

        if let Err(err) = &result {
            debug!(packet_type = %header.packet_type(), error = %err, "rejected packet");
        }
        result
    }

    fn decode_as<P: ControlPacket>(
        src: &[u8],
        mut packet: P,
        wrap: fn(P) -> Self,
    ) -> Result<(Self, usize)> {
        let n = packet.decode(src)?;
        Ok((wrap(packet), n))
    }

    /// Packet type
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        self.as_control().packet_type()
    }

    /// Total encoded size
    pub fn encoded_len(&self) -> Result<usize> {
        self.as_control().encoded_len()
    }

    /// Encode into `dst`
    pub fn encode(&mut self, dst: &mut [u8], ids: &PacketIdAllocator) -> Result<usize> {
        self.as_control_mut().encode(dst, ids)
    }

    fn as_control(&self) -> &dyn ControlPacket {
        match self {
            Self::Subscribe(p) => p,
            Self::PubAck(p) => p,
            Self::UnsubAck(p) => p,
        }
    }

    fn as_control_mut(&mut self) -> &mut dyn ControlPacket {
        match self {
            Self::Subscribe(p) => p,
            Self::PubAck(p) => p,
            Self::UnsubAck(p) => p,
        }
    }
}

impl From<Subscribe> for Packet {
    fn from(packet: Subscribe) -> Self {
        Self::Subscribe(packet)
    }
}

impl From<PubAck> for Packet {
    fn from(packet: PubAck) -> Self {
        Self::PubAck(packet)
    }
}

impl From<UnsubAck> for Packet {
    fn from(packet: UnsubAck) -> Self {
        Self::UnsubAck(packet)
    }
}
