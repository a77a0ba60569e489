//! Packet codec error types

use thiserror::Error;

use super::PacketType;

/// Packet codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// QoS value outside {0, 1, 2}
    #[error("invalid QoS: {qos}")]
    InvalidQos {
        /// Offending QoS byte
        qos: u8,
    },

    /// SUBSCRIBE without a single topic filter
    #[error("SUBSCRIBE packet carries an empty topic list")]
    EmptyTopicList,

    /// Destination buffer too small
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Remaining length varint longer than 4 bytes
    #[error("malformed remaining length: more than 4 varint bytes")]
    MalformedRemainingLength,

    /// Source ended before a declared length was satisfied
    #[error("truncated input: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// Structurally invalid packet
    #[error("malformed {packet_type} packet: {reason}")]
    MalformedPacket {
        /// Packet being decoded
        packet_type: PacketType,
        /// What was wrong
        reason: &'static str,
    },

    /// Remaining length above the 4-byte varint maximum
    #[error("remaining length too large: {len} bytes (max 268435455)")]
    RemainingLengthTooLarge {
        /// Computed length
        len: usize,
    },

    /// Byte string longer than a 2-byte length prefix can describe
    #[error("byte string too long: {len} bytes (max 65535)")]
    BytesTooLong {
        /// String length
        len: usize,
    },

    /// Unknown packet type nibble
    #[error("invalid packet type: {type_byte:#x}")]
    InvalidPacketType {
        /// Type nibble
        type_byte: u8,
    },

    /// Fixed header flags not allowed for the packet type
    #[error("invalid flags {flags:#06b} for {packet_type}")]
    InvalidFlags {
        /// Packet type
        packet_type: PacketType,
        /// Flag nibble found
        flags: u8,
    },

    /// Packet of a different type than the decoder expects
    #[error("unexpected packet type: expected {expected}, got {found}")]
    UnexpectedPacketType {
        /// Type the decoder handles
        expected: PacketType,
        /// Type found on the wire
        found: PacketType,
    },

    /// Valid packet type this codec does not implement
    #[error("unsupported packet type: {packet_type}")]
    UnsupportedPacketType {
        /// Packet type
        packet_type: PacketType,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
