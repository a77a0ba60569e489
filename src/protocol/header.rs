//! Fixed header codec
//!
//! Every control packet starts with a fixed header of 2 to 5 bytes.

use std::fmt;

use super::codec::{read_remaining_length, remaining_length_len, write_remaining_length};
use super::{Error, MAX_REMAINING_LENGTH, PacketType, Result};

/// MQTT fixed header
///
/// # Wire Format
///
/// ```text
///  7 6 5 4 3 2 1 0
/// +-+-+-+-+-+-+-+-+
/// | Type  | Flags |   byte 0
/// +-+-+-+-+-+-+-+-+
/// |  Remaining    |   bytes 1..=4, base-128 varint
/// |  Length (1-4) |
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    packet_type: PacketType,
    flags: u8,
    remaining_length: u32,
}

impl FixedHeader {
    /// Create a header with the type's mandated flags and zero remaining length
    #[must_use]
    pub const fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            flags: packet_type.default_flags(),
            remaining_length: 0,
        }
    }

    /// Same header with a fixed remaining length
    #[must_use]
    pub(crate) const fn with_remaining_length(self, remaining_length: u32) -> Self {
        Self {
            remaining_length,
            ..self
        }
    }

    /// Get packet type
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Get flag nibble
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Get remaining length
    #[must_use]
    pub const fn remaining_length(&self) -> u32 {
        self.remaining_length
    }

    /// Set remaining length, rejecting values the varint cannot carry
    pub fn set_remaining_length(&mut self, len: usize) -> Result<()> {
        self.remaining_length = u32::try_from(len)
            .ok()
            .filter(|len| *len <= MAX_REMAINING_LENGTH)
            .ok_or(Error::RemainingLengthTooLarge { len })?;
        Ok(())
    }

    /// Encoded size of this header
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        1 + remaining_length_len(self.remaining_length)
    }

    /// Parse a fixed header from the front of `src`.
    ///
    /// Returns the header and the number of bytes it occupies.
    pub fn decode(src: &[u8]) -> Result<(Self, usize)> {
        let first = *src.first().ok_or(Error::Truncated { needed: 1, got: 0 })?;

        let type_byte = first >> 4;
        let packet_type =
            PacketType::from_u8(type_byte).ok_or(Error::InvalidPacketType { type_byte })?;

        let flags = first & 0x0F;
        if packet_type.has_fixed_flags() && flags != packet_type.default_flags() {
            return Err(Error::InvalidFlags { packet_type, flags });
        }

        let (remaining_length, n) = read_remaining_length(&src[1..])?;

        Ok((
            Self {
                packet_type,
                flags,
                remaining_length,
            },
            1 + n,
        ))
    }

    /// Parse a fixed header and require it to carry `expected` as its type
    pub fn decode_expecting(src: &[u8], expected: PacketType) -> Result<(Self, usize)> {
        let (header, n) = Self::decode(src)?;
        if header.packet_type != expected {
            return Err(Error::UnexpectedPacketType {
                expected,
                found: header.packet_type,
            });
        }
        Ok((header, n))
    }

    /// Slice the variable header and payload announced by this header out of
    /// `src`, where `header_len` bytes were consumed by the header itself.
    pub fn body<'a>(&self, src: &'a [u8], header_len: usize) -> Result<&'a [u8]> {
        let end = header_len + self.remaining_length as usize;
        src.get(header_len..end).ok_or(Error::Truncated {
            needed: end,
            got: src.len(),
        })
    }

    /// Write the header to `dst`. Returns the number of bytes written.
    pub fn encode(&self, dst: &mut [u8]) -> Result<usize> {
        let needed = self.encoded_len();
        if dst.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                got: dst.len(),
            });
        }

        dst[0] = (self.packet_type.as_u8() << 4) | self.flags;
        let n = write_remaining_length(&mut dst[1..], self.remaining_length)?;

        Ok(1 + n)
    }
}

impl fmt::Display for FixedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (flags={:#x}, remaining_length={})",
            self.packet_type, self.flags, self.remaining_length
        )
    }
}
