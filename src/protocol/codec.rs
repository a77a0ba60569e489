//! Wire primitives shared by every control packet
//!
//! Remaining-length varints, big-endian packet identifiers and
//! length-prefixed byte strings. Every reader checks the source length
//! before indexing and every writer checks the destination, so malformed
//! input surfaces as an [`Error`] instead of a panic.

use super::{Error, MAX_BYTES_LEN, MAX_REMAINING_LENGTH, MAX_VARINT_LEN, Result};

/// Decode a remaining-length varint from the front of `src`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Encoding
///
/// 7 bits per byte, least significant group first, high bit set while more
/// bytes follow:
/// - 0-127: 1 byte
/// - 128-16383: 2 bytes
/// - 16384-2097151: 3 bytes
/// - 2097152-268435455: 4 bytes
pub fn read_remaining_length(src: &[u8]) -> Result<(u32, usize)> {
    let mut value = 0u32;

    for (i, &byte) in src.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u32::from(byte & 0x7F) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    if src.len() >= MAX_VARINT_LEN {
        // Fourth byte still had the continuation bit set
        return Err(Error::MalformedRemainingLength);
    }

    Err(Error::Truncated {
        needed: src.len() + 1,
        got: src.len(),
    })
}

/// Number of bytes needed to encode `value` as a remaining-length varint.
#[must_use]
pub const fn remaining_length_len(value: u32) -> usize {
    if value < 128 {
        1
    } else if value < 128 * 128 {
        2
    } else if value < 128 * 128 * 128 {
        3
    } else {
        4
    }
}

/// Encode `value` as a remaining-length varint using the minimal number of
/// bytes. Returns the number of bytes written.
pub fn write_remaining_length(dst: &mut [u8], value: u32) -> Result<usize> {
    if value > MAX_REMAINING_LENGTH {
        return Err(Error::RemainingLengthTooLarge {
            len: value as usize,
        });
    }

    let needed = remaining_length_len(value);
    if dst.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            got: dst.len(),
        });
    }

    let mut value = value;
    for slot in &mut dst[..needed] {
        let mut byte = (value % 128) as u8;
        value /= 128;
        if value > 0 {
            byte |= 0x80;
        }
        *slot = byte;
    }

    Ok(needed)
}

/// Read a 2-byte big-endian u16.
pub fn read_u16(src: &[u8]) -> Result<u16> {
    match src {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(Error::Truncated {
            needed: 2,
            got: src.len(),
        }),
    }
}

/// Write a 2-byte big-endian u16. Returns the number of bytes written.
pub fn write_u16(dst: &mut [u8], value: u16) -> Result<usize> {
    if dst.len() < 2 {
        return Err(Error::BufferTooSmall {
            needed: 2,
            got: dst.len(),
        });
    }
    dst[..2].copy_from_slice(&value.to_be_bytes());
    Ok(2)
}

/// Read a length-prefixed byte string (2-byte length + data).
///
/// Returns the borrowed data and the total bytes consumed including the
/// prefix.
pub fn read_lp_bytes(src: &[u8]) -> Result<(&[u8], usize)> {
    let len = read_u16(src)? as usize;
    let total = 2 + len;

    if src.len() < total {
        return Err(Error::Truncated {
            needed: total,
            got: src.len(),
        });
    }

    Ok((&src[2..total], total))
}

/// Write a length-prefixed byte string. Returns the number of bytes written.
pub fn write_lp_bytes(dst: &mut [u8], data: &[u8]) -> Result<usize> {
    let len = data.len();
    if len > MAX_BYTES_LEN {
        return Err(Error::BytesTooLong { len });
    }

    let total = lp_bytes_len(data);
    if dst.len() < total {
        return Err(Error::BufferTooSmall {
            needed: total,
            got: dst.len(),
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    write_u16(dst, len as u16)?;
    dst[2..total].copy_from_slice(data);

    Ok(total)
}

/// Encoded size of a length-prefixed byte string.
#[must_use]
pub const fn lp_bytes_len(data: &[u8]) -> usize {
    2 + data.len()
}
