//! Packet-identifier-only acknowledgment body
//!
//! PUBACK and UNSUBACK (and, in the wider protocol, PUBREC/PUBREL/PUBCOMP)
//! share one wire shape: a fixed header with remaining length 2 followed by
//! the packet identifier. [`PacketIdOnly`] implements that shape once and
//! the concrete packet types compose it.

use std::fmt;

use bytes::Bytes;
use tracing::trace;

use super::codec::{read_u16, write_u16};
use super::packet::copy_cached;
use super::{Error, FixedHeader, PACKET_ID_LEN, PacketIdAllocator, PacketType, Result};

/// Fixed header plus packet identifier, with encode caching
#[derive(Debug, Clone)]
pub struct PacketIdOnly {
    header: FixedHeader,
    packet_id: u16,
    cache: Option<Bytes>,
}

impl PacketIdOnly {
    /// Create an empty body for `packet_type` with an unset identifier
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(packet_type: PacketType) -> Self {
        Self {
            header: FixedHeader::new(packet_type).with_remaining_length(PACKET_ID_LEN as u32),
            packet_id: 0,
            cache: None,
        }
    }

    /// Get packet type
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.header.packet_type()
    }

    /// Get fixed header
    #[must_use]
    pub const fn header(&self) -> &FixedHeader {
        &self.header
    }

    /// Get packet identifier (0 while unset)
    #[must_use]
    pub const fn packet_id(&self) -> u16 {
        self.packet_id
    }

    /// Set packet identifier
    pub fn set_packet_id(&mut self, packet_id: u16) {
        self.packet_id = packet_id;
        self.cache = None;
    }

    /// Total encoded size
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match &self.cache {
            Some(cached) => cached.len(),
            None => 1 + 1 + PACKET_ID_LEN,
        }
    }

    /// Decode from `src`, replacing the current content on success.
    pub fn decode(&mut self, src: &[u8]) -> Result<usize> {
        let packet_type = self.packet_type();
        let (header, header_len) = FixedHeader::decode_expecting(src, packet_type)?;

        if header.remaining_length() as usize != PACKET_ID_LEN {
            return Err(Error::MalformedPacket {
                packet_type,
                reason: "remaining length must be exactly 2",
            });
        }

        let body = header.body(src, header_len)?;
        let packet_id = read_u16(body)?;
        let total = header_len + body.len();

        self.header = header;
        self.packet_id = packet_id;
        self.cache = Some(Bytes::copy_from_slice(&src[..total]));

        trace!(%packet_type, packet_id, bytes = total, "decoded packet");
        Ok(total)
    }

    /// Encode into `dst`, allocating an identifier from `ids` if unset.
    pub fn encode(&mut self, dst: &mut [u8], ids: &PacketIdAllocator) -> Result<usize> {
        if let Some(cached) = &self.cache {
            return copy_cached(cached, dst);
        }

        self.header.set_remaining_length(PACKET_ID_LEN)?;
        let total = self.header.encoded_len() + PACKET_ID_LEN;
        if dst.len() < total {
            return Err(Error::BufferTooSmall {
                needed: total,
                got: dst.len(),
            });
        }

        if self.packet_id == 0 {
            self.packet_id = ids.next_id();
        }

        let mut n = self.header.encode(dst)?;
        n += write_u16(&mut dst[n..], self.packet_id)?;

        self.cache = Some(Bytes::copy_from_slice(&dst[..n]));

        trace!(
            packet_type = %self.packet_type(),
            packet_id = self.packet_id,
            bytes = n,
            "encoded packet"
        );
        Ok(n)
    }
}

impl PartialEq for PacketIdOnly {
    fn eq(&self, other: &Self) -> bool {
        self.packet_type() == other.packet_type() && self.packet_id == other.packet_id
    }
}

impl Eq for PacketIdOnly {}

impl fmt::Display for PacketIdOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, packet_id={}", self.header, self.packet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_length_must_be_two() {
        let mut ack = PacketIdOnly::new(PacketType::Unsuback);
        let result = ack.decode(&[0xB0, 0x03, 0x00, 0x07, 0x00]);
        assert!(matches!(
            result,
            Err(Error::MalformedPacket {
                packet_type: PacketType::Unsuback,
                ..
            })
        ));
    }

    #[test]
    fn test_new_header_has_fixed_remaining_length() {
        let ack = PacketIdOnly::new(PacketType::Unsuback);
        assert_eq!(ack.header().remaining_length(), 2);
        assert_eq!(ack.header().encoded_len() + PACKET_ID_LEN, ack.encoded_len());
        assert_eq!(
            ack.to_string(),
            "UNSUBACK (flags=0x0, remaining_length=2), packet_id=0"
        );
    }

    #[test]
    fn test_failed_decode_keeps_content() {
        let mut ack = PacketIdOnly::new(PacketType::Puback);
        ack.set_packet_id(9);
        assert!(ack.decode(&[0x40, 0x02, 0x00]).is_err());
        assert_eq!(ack.packet_id(), 9);
    }

    #[test]
    fn test_set_packet_id_invalidates_cache() {
        let ids = PacketIdAllocator::new();
        let mut ack = PacketIdOnly::new(PacketType::Puback);
        let mut buf = [0u8; 4];

        ack.encode(&mut buf, &ids).unwrap();
        assert_eq!(buf, [0x40, 0x02, 0x00, 0x01]);

        ack.set_packet_id(0x1234);
        ack.encode(&mut buf, &ids).unwrap();
        assert_eq!(buf, [0x40, 0x02, 0x12, 0x34]);
    }
}
