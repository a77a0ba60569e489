//! Control packet codec
//!
//! This module provides the fixed header, wire primitives and the packet
//! types built on them.

mod ack;
pub mod codec;
mod error;
mod header;
mod packet;
mod packet_id;
mod puback;
mod subscribe;
mod types;
mod unsuback;

pub use ack::PacketIdOnly;
pub use error::{Error, Result};
pub use header::FixedHeader;
pub use packet::{ControlPacket, Packet};
pub use packet_id::PacketIdAllocator;
pub use puback::PubAck;
pub use subscribe::Subscribe;
pub use types::{PacketType, QoS};
pub use unsuback::UnsubAck;

/// Largest remaining length a 4-byte varint can carry (256 MB - 1)
pub const MAX_REMAINING_LENGTH: u32 = 268_435_455;

/// Maximum remaining-length varint size in bytes
pub const MAX_VARINT_LEN: usize = 4;

/// Largest fixed header: type byte plus a 4-byte varint
pub const MAX_FIXED_HEADER_LEN: usize = 1 + MAX_VARINT_LEN;

/// Largest byte string a 2-byte length prefix can describe
pub const MAX_BYTES_LEN: usize = u16::MAX as usize;

/// Packet identifier size in bytes
pub const PACKET_ID_LEN: usize = 2;

/// Returned by [`Subscribe::topic_qos`] for an absent topic filter
pub const QOS_FAILURE: u8 = 0x80;
