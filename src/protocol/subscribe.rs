//! SUBSCRIBE packet
//!
//! Sent from the client to the server to create one or more subscriptions.
//! Each entry pairs a topic filter with the maximum QoS at which the server
//! may forward matching messages.

use std::fmt;

use bytes::Bytes;
use tracing::trace;

use super::codec::{
    lp_bytes_len, read_lp_bytes, read_u16, remaining_length_len, write_lp_bytes, write_u16,
};
use super::packet::copy_cached;
use super::{
    ControlPacket, Error, FixedHeader, MAX_BYTES_LEN, MAX_REMAINING_LENGTH, PACKET_ID_LEN,
    PacketIdAllocator, PacketType, QOS_FAILURE, QoS, Result,
};

/// SUBSCRIBE packet
///
/// # Wire Format
///
/// ```text
/// +--------------------+
/// | 0x82 | rem. length |  fixed header
/// +--------------------+
/// | packet id (2, BE)  |  variable header
/// +--------------------+
/// | len (2) | filter   |  payload, repeated >= 1 times
/// | QoS (1)            |
/// +--------------------+
/// ```
///
/// Topic filters and their QoS levels live in two parallel vectors of equal
/// length.
#[derive(Debug, Clone)]
pub struct Subscribe {
    header: FixedHeader,
    packet_id: u16,
    topics: Vec<Bytes>,
    qos: Vec<QoS>,
    cache: Option<Bytes>,
}

impl Subscribe {
    /// Create an empty SUBSCRIBE with an unset packet identifier
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header: FixedHeader::new(PacketType::Subscribe),
            packet_id: 0,
            topics: Vec::new(),
            qos: Vec::new(),
            cache: None,
        }
    }

    /// Get fixed header as last decoded or encoded
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

    /// Topic filters in insertion or wire order
    #[must_use]
    pub fn topics(&self) -> &[Bytes] {
        &self.topics
    }

    /// Requested QoS levels, index-aligned with [`Subscribe::topics`]
    #[must_use]
    pub fn qos(&self) -> &[QoS] {
        &self.qos
    }

    /// Add a topic filter with its requested QoS.
    ///
    /// A filter already present keeps its position and takes the new QoS.
    pub fn add_topic(&mut self, topic: impl Into<Bytes>, qos: u8) -> Result<()> {
        let qos = QoS::try_from(qos)?;
        let topic = topic.into();

        match self.position(&topic) {
            Some(i) => self.qos[i] = qos,
            None => {
                self.topics.push(topic);
                self.qos.push(qos);
            }
        }

        self.cache = None;
        Ok(())
    }

    /// Remove a topic filter. Absent filters are ignored.
    pub fn remove_topic(&mut self, topic: &[u8]) {
        if let Some(i) = self.position(topic) {
            self.topics.remove(i);
            self.qos.remove(i);
        }

        self.cache = None;
    }

    /// Whether `topic` is in the list
    #[must_use]
    pub fn topic_exists(&self, topic: &[u8]) -> bool {
        self.position(topic).is_some()
    }

    /// QoS requested for `topic`, or [`QOS_FAILURE`] if absent
    #[must_use]
    pub fn topic_qos(&self, topic: &[u8]) -> u8 {
        self.position(topic).map_or(QOS_FAILURE, |i| self.qos[i].as_u8())
    }

    fn position(&self, topic: &[u8]) -> Option<usize> {
        self.topics.iter().position(|t| &t[..] == topic)
    }

    /// Variable header plus payload size. Fails if a topic filter does not
    /// fit its 2-byte length prefix.
    fn body_len(&self) -> Result<usize> {
        self.topics.iter().try_fold(PACKET_ID_LEN, |acc, topic| {
            if topic.len() > MAX_BYTES_LEN {
                return Err(Error::BytesTooLong { len: topic.len() });
            }
            Ok(acc + lp_bytes_len(topic) + 1)
        })
    }
}

impl Default for Subscribe {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPacket for Subscribe {
    fn packet_type(&self) -> PacketType {
        PacketType::Subscribe
    }

    fn encoded_len(&self) -> Result<usize> {
        if let Some(cached) = &self.cache {
            return Ok(cached.len());
        }

        let len = self.body_len()?;
        let remaining = u32::try_from(len)
            .ok()
            .filter(|len| *len <= MAX_REMAINING_LENGTH)
            .ok_or(Error::RemainingLengthTooLarge { len })?;

        Ok(1 + remaining_length_len(remaining) + len)
    }

    fn decode(&mut self, src: &[u8]) -> Result<usize> {
        let (header, header_len) = FixedHeader::decode_expecting(src, PacketType::Subscribe)?;
        let body = header.body(src, header_len)?;

        let packet_id = read_u16(body)?;
        let mut pos = PACKET_ID_LEN;

        let mut topics = Vec::new();
        let mut qos = Vec::new();

        while pos < body.len() {
            let (topic, n) = read_lp_bytes(&body[pos..])?;
            pos += n;

            let level = *body.get(pos).ok_or(Error::Truncated {
                needed: header_len + pos + 1,
                got: header_len + body.len(),
            })?;
            pos += 1;

            topics.push(Bytes::copy_from_slice(topic));
            qos.push(QoS::try_from(level)?);
        }

        if topics.is_empty() {
            return Err(Error::EmptyTopicList);
        }

        let total = header_len + body.len();

        self.header = header;
        self.packet_id = packet_id;
        self.topics = topics;
        self.qos = qos;
        self.cache = Some(Bytes::copy_from_slice(&src[..total]));

        trace!(packet_id, topics = self.topics.len(), bytes = total, "decoded SUBSCRIBE");
        Ok(total)
    }

    fn encode(&mut self, dst: &mut [u8], ids: &PacketIdAllocator) -> Result<usize> {
        if let Some(cached) = &self.cache {
            return copy_cached(cached, dst);
        }

        if self.topics.is_empty() {
            return Err(Error::EmptyTopicList);
        }

        let body_len = self.body_len()?;
        let mut header = self.header;
        header.set_remaining_length(body_len)?;

        let total = header.encoded_len() + body_len;
        if dst.len() < total {
            return Err(Error::BufferTooSmall {
                needed: total,
                got: dst.len(),
            });
        }

        // Nothing below can fail, so the packet is only mutated from here on
        self.header = header;
        if self.packet_id == 0 {
            self.packet_id = ids.next_id();
        }

        let mut n = self.header.encode(dst)?;
        n += write_u16(&mut dst[n..], self.packet_id)?;

        for (topic, qos) in self.topics.iter().zip(&self.qos) {
            n += write_lp_bytes(&mut dst[n..], topic)?;
            dst[n] = qos.as_u8();
            n += 1;
        }

        self.cache = Some(Bytes::copy_from_slice(&dst[..n]));

        trace!(
            packet_id = self.packet_id,
            topics = self.topics.len(),
            bytes = n,
            "encoded SUBSCRIBE"
        );
        Ok(n)
    }
}

/// Content equality: packet identifier, topic filters and QoS levels.
impl PartialEq for Subscribe {
    fn eq(&self, other: &Self) -> bool {
        self.packet_id == other.packet_id && self.topics == other.topics && self.qos == other.qos
    }
}

impl Eq for Subscribe {}

impl fmt::Display for Subscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, packet_id={}", self.header, self.packet_id)?;
        for (i, (topic, qos)) in self.topics.iter().zip(&self.qos).enumerate() {
            write!(
                f,
                ", topic[{i}]={:?}/{qos}",
                String::from_utf8_lossy(topic)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TOPICS: [u8; 16] = [
        0x82, 0x0E, // fixed header
        0x00, 0x07, // packet id
        0x00, 0x03, b'a', b'/', b'b', 0x01, // a/b @ QoS 1
        0x00, 0x03, b'c', b'/', b'#', 0x02, // c/# @ QoS 2
    ];

    fn two_topics() -> Subscribe {
        let mut packet = Subscribe::new();
        packet.add_topic(&b"a/b"[..], 1).unwrap();
        packet.add_topic(&b"c/#"[..], 2).unwrap();
        packet
    }

    #[test]
    fn test_add_topic() {
        let packet = two_topics();
        assert_eq!(packet.topics().len(), 2);
        assert_eq!(packet.qos(), &[QoS::AtLeastOnce, QoS::ExactlyOnce]);
        assert!(packet.topic_exists(b"a/b"));
        assert!(!packet.topic_exists(b"a/"));
        assert_eq!(packet.topic_qos(b"c/#"), 2);
    }

    #[test]
    fn test_add_duplicate_topic_updates_qos() {
        let mut packet = two_topics();
        packet.add_topic(&b"a/b"[..], 0).unwrap();

        assert_eq!(packet.topics().len(), 2);
        assert_eq!(packet.qos().len(), 2);
        assert_eq!(packet.topics()[0].as_ref(), b"a/b");
        assert_eq!(packet.topic_qos(b"a/b"), 0);
    }

    #[test]
    fn test_add_topic_invalid_qos() {
        let mut packet = Subscribe::new();
        assert_eq!(
            packet.add_topic(&b"a/b"[..], 3),
            Err(Error::InvalidQos { qos: 3 })
        );
        assert!(packet.topics().is_empty());
        assert!(packet.qos().is_empty());
    }

    #[test]
    fn test_topic_qos_absent() {
        let packet = two_topics();
        assert_eq!(packet.topic_qos(b"x/y"), QOS_FAILURE);
        assert_eq!(packet.topic_qos(b"x/y"), 0x80);
    }

    #[test]
    fn test_remove_topic() {
        let mut packet = two_topics();
        packet.add_topic(&b"d"[..], 0).unwrap();
        packet.remove_topic(b"c/#");

        let topics: Vec<&[u8]> = packet.topics().iter().map(|t| &t[..]).collect();
        assert_eq!(topics, vec![&b"a/b"[..], &b"d"[..]]);
        assert_eq!(packet.qos(), &[QoS::AtLeastOnce, QoS::AtMostOnce]);
    }

    #[test]
    fn test_remove_absent_topic() {
        let mut packet = two_topics();
        let before = packet.clone();
        packet.remove_topic(b"nope");
        assert_eq!(packet, before);
    }

    #[test]
    fn test_encoded_len() {
        let packet = two_topics();
        // 2 + (2 + 3 + 1) * 2 = 14 body bytes, 2 header bytes
        assert_eq!(packet.encoded_len().unwrap(), 16);
    }

    #[test]
    fn test_encoded_len_two_byte_varint() {
        let mut packet = Subscribe::new();
        packet.add_topic(vec![b't'; 200], 0).unwrap();
        // body = 2 + 2 + 200 + 1 = 205, varint 2 bytes
        assert_eq!(packet.encoded_len().unwrap(), 1 + 2 + 205);
    }

    #[test]
    fn test_encode_worked_example() {
        let ids = PacketIdAllocator::new();
        let mut packet = two_topics();
        assert_eq!(packet.packet_id(), 0);

        let bytes = packet.encode_to_vec(&ids).unwrap();
        assert_ne!(packet.packet_id(), 0);

        let id = packet.packet_id().to_be_bytes();
        let mut expected = vec![0x82, 0x0E, id[0], id[1]];
        expected.extend_from_slice(&[0x00, 0x03, b'a', b'/', b'b', 0x01]);
        expected.extend_from_slice(&[0x00, 0x03, b'c', b'/', b'#', 0x02]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_keeps_explicit_id() {
        let ids = PacketIdAllocator::new();
        let mut packet = two_topics();
        packet.set_packet_id(7);

        assert_eq!(packet.encode_to_vec(&ids).unwrap(), TWO_TOPICS);
        assert_eq!(ids.current(), 0);
    }

    #[test]
    fn test_decode_worked_example() {
        let mut packet = Subscribe::new();
        assert_eq!(packet.decode(&TWO_TOPICS).unwrap(), TWO_TOPICS.len());

        assert_eq!(packet.packet_id(), 7);
        assert_eq!(packet.header().remaining_length(), 14);
        assert_eq!(packet.topic_qos(b"a/b"), 1);
        assert_eq!(packet.topic_qos(b"c/#"), 2);

        let mut expected = two_topics();
        expected.set_packet_id(7);
        assert_eq!(packet, expected);
    }

    #[test]
    fn test_decode_replaces_content() {
        let mut packet = Subscribe::new();
        packet.add_topic(&b"old"[..], 0).unwrap();
        packet.decode(&TWO_TOPICS).unwrap();
        assert!(!packet.topic_exists(b"old"));
        assert_eq!(packet.topics().len(), 2);
    }

    #[test]
    fn test_decode_empty_topic_list() {
        let mut packet = Subscribe::new();
        let result = packet.decode(&[0x82, 0x02, 0x00, 0x01]);
        assert_eq!(result, Err(Error::EmptyTopicList));
    }

    #[test]
    fn test_decode_remaining_length_exceeds_input() {
        let mut packet = Subscribe::new();
        let result = packet.decode(&TWO_TOPICS[..10]);
        assert_eq!(result, Err(Error::Truncated { needed: 16, got: 10 }));
    }

    #[test]
    fn test_decode_topic_overruns_remaining_length() {
        // Topic claims 9 bytes but the packet body ends after 3
        let src = [0x82, 0x08, 0x00, 0x01, 0x00, 0x09, b'a', b'/', b'b', 0x01];
        let mut packet = Subscribe::new();
        assert!(matches!(packet.decode(&src), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_decode_missing_qos_byte() {
        let src = [0x82, 0x07, 0x00, 0x01, 0x00, 0x03, b'a', b'/', b'b'];
        let mut packet = Subscribe::new();
        assert!(matches!(packet.decode(&src), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_decode_missing_packet_id() {
        let mut packet = Subscribe::new();
        assert!(matches!(
            packet.decode(&[0x82, 0x01, 0x00]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_invalid_qos_byte() {
        let src = [0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x03];
        let mut packet = Subscribe::new();
        assert_eq!(packet.decode(&src), Err(Error::InvalidQos { qos: 3 }));
    }

    #[test]
    fn test_failed_decode_keeps_content() {
        let mut packet = two_topics();
        let _ = packet.decode(&[0x82, 0x02, 0x00, 0x01]);
        assert_eq!(packet, two_topics());
    }

    #[test]
    fn test_reencode_decoded_is_identical() {
        let ids = PacketIdAllocator::new();
        let mut packet = Subscribe::new();
        packet.decode(&TWO_TOPICS).unwrap();

        let first = packet.encode_to_vec(&ids).unwrap();
        let second = packet.encode_to_vec(&ids).unwrap();
        assert_eq!(first, TWO_TOPICS);
        assert_eq!(first, second);
        assert_eq!(ids.current(), 0);
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let ids = PacketIdAllocator::new();
        let mut packet = Subscribe::new();
        packet.decode(&TWO_TOPICS).unwrap();

        // QoS-only update must still change the encoding
        packet.add_topic(&b"a/b"[..], 0).unwrap();
        let bytes = packet.encode_to_vec(&ids).unwrap();
        assert_eq!(bytes[9], 0x00);

        packet.remove_topic(b"c/#");
        let bytes = packet.encode_to_vec(&ids).unwrap();
        assert_eq!(bytes, vec![0x82, 0x08, 0x00, 0x07, 0x00, 0x03, b'a', b'/', b'b', 0x00]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let ids = PacketIdAllocator::new();
        let mut packet = two_topics();
        let mut buf = [0u8; 15];

        assert_eq!(
            packet.encode(&mut buf, &ids),
            Err(Error::BufferTooSmall { needed: 16, got: 15 })
        );
        // Identifier is only allocated once the buffer is known to fit
        assert_eq!(packet.packet_id(), 0);
    }

    #[test]
    fn test_encode_empty_topic_list() {
        let ids = PacketIdAllocator::new();
        let mut packet = Subscribe::new();
        let mut buf = [0u8; 16];
        assert_eq!(packet.encode(&mut buf, &ids), Err(Error::EmptyTopicList));
    }

    #[test]
    fn test_encode_topic_too_long() {
        let ids = PacketIdAllocator::new();
        let mut packet = Subscribe::new();
        packet.add_topic(vec![b'x'; 70_000], 1).unwrap();

        assert_eq!(
            packet.encoded_len(),
            Err(Error::BytesTooLong { len: 70_000 })
        );

        let mut buf = vec![0u8; 70_016];
        assert_eq!(
            packet.encode(&mut buf, &ids),
            Err(Error::BytesTooLong { len: 70_000 })
        );

        // Failed encode leaves the packet and the allocator alone
        assert_eq!(packet.packet_id(), 0);
        assert_eq!(packet.header().remaining_length(), 0);
        assert_eq!(ids.current(), 0);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_buffer_too_small_keeps_header() {
        let ids = PacketIdAllocator::new();
        let mut packet = two_topics();
        let mut buf = [0u8; 4];

        assert!(packet.encode(&mut buf, &ids).is_err());
        assert_eq!(packet.header().remaining_length(), 0);
        assert_eq!(ids.current(), 0);
    }

    #[test]
    fn test_display() {
        let mut packet = Subscribe::new();
        packet.decode(&TWO_TOPICS).unwrap();
        assert_eq!(
            packet.to_string(),
            "SUBSCRIBE (flags=0x2, remaining_length=14), packet_id=7, \
             topic[0]=\"a/b\"/1, topic[1]=\"c/#\"/2"
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn topics_strategy() -> impl Strategy<Value = Vec<(Vec<u8>, u8)>> {
            prop::collection::btree_map(
                prop::collection::vec(any::<u8>(), 0..64),
                0u8..=2,
                1..16,
            )
            .prop_map(|map| map.into_iter().collect())
        }

        proptest! {
            /// Property: decode(encode(p)) reproduces topics, QoS and identifier
            #[test]
            fn prop_roundtrip_preserves_content(
                entries in topics_strategy(),
                packet_id in 1u16..=u16::MAX,
            ) {
                let ids = PacketIdAllocator::new();
                let mut original = Subscribe::new();
                original.set_packet_id(packet_id);
                for (topic, qos) in &entries {
                    original.add_topic(topic.clone(), *qos).unwrap();
                }

                let encoded = original.encode_to_vec(&ids).unwrap();
                prop_assert_eq!(encoded.len(), original.encoded_len().unwrap());

                let mut decoded = Subscribe::new();
                prop_assert_eq!(decoded.decode(&encoded).unwrap(), encoded.len());
                prop_assert_eq!(&decoded, &original);
            }

            /// Property: arbitrary bytes never panic the decoder
            #[test]
            fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
                let mut packet = Subscribe::new();
                if let Ok(n) = packet.decode(&bytes) {
                    prop_assert!(n <= bytes.len());
                    prop_assert!(!packet.topics().is_empty());
                    prop_assert_eq!(packet.topics().len(), packet.qos().len());
                }
            }
        }
    }
}
