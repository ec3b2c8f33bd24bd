//! Base-128 variable-length integers.
//!
//! Each byte carries seven value bits, least significant group first; the
//! high bit is set on every byte except the last. A value of `bits` width
//! takes at most `ceil(bits / 7)` bytes.

use crate::{MalformedError, Result};

/// Maximum encoded size of a 64-bit value.
pub(crate) const MAX_VARINT_LEN: usize = 10;

/// Encodes `value`, returning the buffer and the number of bytes used.
#[inline]
pub(crate) fn encode_varint(mut value: u64) -> ([u8; MAX_VARINT_LEN], usize) {
    let mut buf = [0_u8; MAX_VARINT_LEN];
    let mut len = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[len] = byte;
            return (buf, len + 1);
        }
        buf[len] = byte | 0x80;
        len += 1;
    }
}

/// Decodes a varint of at most `bits` bits, pulling bytes from `next`.
///
/// Fails with [`MalformedError::VarintOverflow`] if a byte sets bits beyond
/// the width, and with [`MalformedError::TruncatedVarint`] if the byte budget
/// runs out before a terminating byte.
pub(crate) fn decode_varint(bits: u32, mut next: impl FnMut() -> Result<u8>) -> Result<u64> {
    let mut value = 0_u64;
    for group in 0..bits.div_ceil(7) {
        let byte = next()?;
        let payload = u64::from(byte & 0x7F);
        let shift = 7 * group;
        if shift + 7 > bits && payload >> (bits - shift) != 0 {
            return Err(MalformedError::VarintOverflow { bits }.into());
        }
        value |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(MalformedError::TruncatedVarint { bits }.into())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::{decode_varint, encode_varint};
    use crate::{Error, MalformedError, Result};

    fn encode(value: u64) -> Vec<u8> {
        let (buf, len) = encode_varint(value);
        buf[..len].to_vec()
    }

    fn decode(bits: u32, bytes: &[u8]) -> Result<u64> {
        let mut iter = bytes.iter().copied();
        decode_varint(bits, || {
            iter.next()
                .ok_or_else(|| Error::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)))
        })
    }

    #[test]
    fn three_hundred_takes_two_bytes() {
        assert_eq!(encode(300), [0xAC, 0x02]);
        assert_eq!(decode(32, &[0xAC, 0x02]).unwrap(), 300);
    }

    #[test]
    fn width_extremes() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(u64::from(u16::MAX)).len(), 3);
        assert_eq!(encode(u64::from(u32::MAX)).len(), 5);
        assert_eq!(encode(u64::MAX).len(), 10);

        assert_eq!(decode(16, &encode(u64::from(u16::MAX))).unwrap(), u64::from(u16::MAX));
        assert_eq!(decode(64, &encode(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn truncated_within_budget() {
        let err = decode(16, &[0x80, 0x80, 0x80, 0x01]).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::TruncatedVarint { bits: 16 })));
    }

    #[test]
    fn overflow_beyond_width() {
        // 2^16 needs a third group payload of 4
        let err = decode(16, &encode(1 << 16)).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::VarintOverflow { bits: 16 })));

        let err = decode(64, &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02]).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::VarintOverflow { bits: 64 })));
    }

    proptest! {
        #[test]
        fn round_trips_every_width(value: u64) {
            prop_assert_eq!(decode(64, &encode(value)).unwrap(), value);
            let narrow = value & u64::from(u32::MAX);
            prop_assert_eq!(decode(32, &encode(narrow)).unwrap(), narrow);
            let narrow = value & u64::from(u16::MAX);
            prop_assert_eq!(decode(16, &encode(narrow)).unwrap(), narrow);
        }

        #[test]
        fn never_longer_than_budget(value: u64) {
            let bits = 64 - value.leading_zeros().min(63);
            prop_assert!(encode(value).len() <= bits.div_ceil(7) as usize);
        }
    }
}
