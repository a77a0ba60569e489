//! mqpacket - Byte-exact codec for MQTT control packets
//!
//! This library converts between in-memory control packets and their wire
//! form. It covers the fixed header shared by every packet, SUBSCRIBE, and
//! the packet-identifier-only acknowledgments (PUBACK, UNSUBACK).
//!
//! # Quick Start
//!
//! ```rust
//! use mqpacket::{ControlPacket, PacketIdAllocator, Subscribe};
//!
//! let ids = PacketIdAllocator::new();
//!
//! // Build a SUBSCRIBE
//! let mut subscribe = Subscribe::new();
//! subscribe.add_topic(&b"sensors/+/temp"[..], 1)?;
//!
//! // Encode; the packet identifier is allocated on first encode
//! let bytes = subscribe.encode_to_vec(&ids)?;
//!
//! // Decode from bytes
//! let mut decoded = Subscribe::new();
//! decoded.decode(&bytes)?;
//! assert_eq!(decoded, subscribe);
//! # Ok::<(), mqpacket::Error>(())
//! ```
//!
//! # Features
//!
//! - **Byte-exact framing** - minimal remaining-length varints, checked
//!   length prefixes, no panics on malformed input
//! - **Encode caching** - an unmodified packet re-encodes by copying its
//!   last encoding
//! - **Injectable identifiers** - packet identifiers come from an explicit,
//!   lock-free [`PacketIdAllocator`]
//! - **`serde`** (optional feature) - serialization for [`PacketType`] and
//!   [`QoS`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    ControlPacket, Error, FixedHeader, MAX_REMAINING_LENGTH, Packet, PacketIdAllocator,
    PacketType, PubAck, QOS_FAILURE, QoS, Result, Subscribe, UnsubAck,
};
