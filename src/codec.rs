//! Binary wire codec.
//!
//! Four encoders compose recursively: unsigned integers (4-byte
//! little-endian), floating point (8-byte little-endian IEEE-754),
//! byte strings (4-byte length prefix + raw bytes), and sequences
//! (4-byte count prefix + elements). Composite records concatenate
//! their fields in lexicographic field-name order; that order is part
//! of the wire format and of every content hash, so it must not change.
//!
//! Decoding is strict: truncated input and leftover bytes after a
//! top-level record are both `ChainError::Decode`.

use crate::error::{ChainError, Result};

/// A value with a canonical binary encoding.
pub trait Wire: Sized {
    fn write(&self, out: &mut Vec<u8>);

    /// Decode a value from the front of `input`, returning the rest.
    fn read(input: &[u8]) -> Result<(Self, &[u8])>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// Strict decode: the input must contain exactly one value.
    fn from_bytes(input: &[u8]) -> Result<Self> {
        let (value, rest) = Self::read(input)?;
        if !rest.is_empty() {
            return Err(ChainError::Decode(format!(
                "{} trailing bytes after record",
                rest.len()
            )));
        }
        Ok(value)
    }
}

pub(crate) fn take(input: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if input.len() < n {
        return Err(ChainError::Decode(format!(
            "unexpected end of input: need {} bytes, have {}",
            n,
            input.len()
        )));
    }
    Ok(input.split_at(n))
}

impl Wire for u32 {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (bytes, rest) = take(input, 4)?;
        Ok((u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), rest))
    }
}

impl Wire for f64 {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (bytes, rest) = take(input, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok((f64::from_le_bytes(raw), rest))
    }
}

impl Wire for Vec<u8> {
    fn write(&self, out: &mut Vec<u8>) {
        // Byte strings above u32::MAX are not representable on the wire.
        debug_assert!(self.len() <= u32::MAX as usize);
        (self.len() as u32).write(out);
        out.extend_from_slice(self);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (len, rest) = u32::read(input)?;
        let (bytes, rest) = take(rest, len as usize)?;
        Ok((bytes.to_vec(), rest))
    }
}

/// Hashes and other fixed 32-byte values travel as byte strings and
/// must decode to exactly 32 bytes.
impl Wire for [u8; 32] {
    fn write(&self, out: &mut Vec<u8>) {
        (self.len() as u32).write(out);
        out.extend_from_slice(self);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (len, rest) = u32::read(input)?;
        if len != 32 {
            return Err(ChainError::Decode(format!(
                "expected a 32-byte string, length prefix says {}",
                len
            )));
        }
        let (bytes, rest) = take(rest, 32)?;
        let mut value = [0u8; 32];
        value.copy_from_slice(bytes);
        Ok((value, rest))
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn write(&self, out: &mut Vec<u8>) {
        write_seq(self, out);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (count, mut rest) = u32::read(input)?;
        let mut items = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let (item, remaining) = T::read(rest)?;
            items.push(item);
            rest = remaining;
        }
        Ok((items, rest))
    }
}

/// Encode a slice as a sequence: count prefix, then each element.
pub fn write_seq<T: Wire>(items: &[T], out: &mut Vec<u8>) {
    debug_assert!(items.len() <= u32::MAX as usize);
    (items.len() as u32).write(out);
    for item in items {
        item.write(out);
    }
}

/// Field tables must be lexicographically sorted; checked by per-type tests.
pub fn fields_sorted(fields: &[&str]) -> bool {
    fields.windows(2).all(|pair| pair[0] < pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    #[test]
    fn test_u32_round_trip() {
        for value in [0u32, 1, 600, u32::MAX] {
            let bytes = value.to_bytes();
            assert_eq!(bytes.len(), 4);
            assert_eq!(u32::from_bytes(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_u32_little_endian() {
        assert_eq!(1u32.to_bytes(), vec![1, 0, 0, 0]);
        assert_eq!(0x0403_0201u32.to_bytes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_f64_round_trip() {
        for value in [0.0f64, 10.0, 9.99, -1.5, f64::MAX] {
            let bytes = value.to_bytes();
            assert_eq!(bytes.len(), 8);
            assert_eq!(f64::from_bytes(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_byte_string_round_trip() {
        let value = vec![0xAAu8, 0xBB, 0xCC];
        let bytes = value.to_bytes();
        assert_eq!(&bytes[..4], &[3, 0, 0, 0]);
        assert_eq!(Vec::<u8>::from_bytes(&bytes).unwrap(), value);

        let empty: Vec<u8> = Vec::new();
        assert_eq!(Vec::<u8>::from_bytes(&empty.to_bytes()).unwrap(), empty);
    }

    #[test]
    fn test_sequence_round_trip() {
        let value = vec![1u32, 2, 3];
        let bytes = value.to_bytes();
        // Count prefix then packed 4-byte elements.
        assert_eq!(bytes.len(), 4 + 12);
        assert_eq!(Vec::<u32>::from_bytes(&bytes).unwrap(), value);

        let nested = vec![vec![1u8, 2], vec![], vec![3]];
        assert_eq!(
            Vec::<Vec<u8>>::from_bytes(&nested.to_bytes()).unwrap(),
            nested
        );
    }

    #[test]
    fn test_truncated_input_fails() {
        assert!(matches!(
            u32::from_bytes(&[1, 2]),
            Err(ChainError::Decode(_))
        ));
        assert!(matches!(
            f64::from_bytes(&[0; 7]),
            Err(ChainError::Decode(_))
        ));
        // Length prefix promises more bytes than the buffer holds.
        let mut bytes = vec![10u8, 0, 0, 0];
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            Vec::<u8>::from_bytes(&bytes),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut bytes = 7u32.to_bytes();
        bytes.push(0);
        assert!(matches!(
            u32::from_bytes(&bytes),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn test_fixed_hash_length_enforced() {
        let hash = [0x11u8; 32];
        let bytes = hash.to_bytes();
        assert_eq!(<[u8; 32]>::from_bytes(&bytes).unwrap(), hash);

        let short = vec![5u8, 0, 0, 0, 1, 2, 3, 4, 5];
        assert!(matches!(
            <[u8; 32]>::from_bytes(&short),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn test_fields_sorted() {
        assert!(fields_sorted(&["address", "amount"]));
        assert!(!fields_sorted(&["amount", "address"]));
        assert!(!fields_sorted(&["a", "a"]));
    }
}
