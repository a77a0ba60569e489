//! Packet identifier allocation

use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates 16-bit packet identifiers from a shared 64-bit counter.
///
/// Allocation is a single lock-free `fetch_add`, so one allocator can be
/// shared by every connection and thread that encodes packets. Only the low
/// 16 bits of the counter are used; after 65 535 allocations identifiers
/// repeat, with no check against identifiers still in flight. Zero is never
/// handed out.
///
/// `new` is `const`, so a process-wide allocator is just a `static`:
///
/// ```
/// use mqpacket::PacketIdAllocator;
///
/// static PACKET_IDS: PacketIdAllocator = PacketIdAllocator::new();
///
/// assert_eq!(PACKET_IDS.next_id(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PacketIdAllocator {
    counter: AtomicU64,
}

impl PacketIdAllocator {
    /// Create an allocator whose first identifier is 1
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator with the counter preset to `value`; the next
    /// allocation yields the low 16 bits of `value + 1`.
    #[must_use]
    pub const fn starting_at(value: u64) -> Self {
        Self {
            counter: AtomicU64::new(value),
        }
    }

    /// Allocate the next non-zero identifier
    pub fn next_id(&self) -> u16 {
        loop {
            let raw = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            #[allow(clippy::cast_possible_truncation)]
            let id = (raw & 0xFFFF) as u16;
            if id != 0 {
                return id;
            }
        }
    }

    /// Current raw counter value
    #[must_use]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
