//! Variable-length integer encoding utilities.
//!
//! Unsigned LEB128: 7 bits per byte with a continuation bit. The segment
//! format uses it for lengths, counts and document frequencies, and the term
//! dictionary statistics are computed from encoded lengths, so
//! [`encoded_len`] must agree with [`encode_u64`] exactly.

use crate::error::{Result, ShardStatError};

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(value));
    let mut val = value;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;

        if val != 0 {
            byte |= 0x80; // Set continuation bit
        }

        bytes.push(byte);

        if val == 0 {
            break;
        }
    }

    bytes
}

/// Decode a u64 value from variable-length encoding.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;
    let mut bytes_read = 0;

    for &byte in bytes {
        bytes_read += 1;

        if shift >= 64 {
            return Err(ShardStatError::segment("VarInt overflow"));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, bytes_read));
        }

        shift += 7;
    }

    Err(ShardStatError::segment("Incomplete VarInt"))
}

/// Number of bytes [`encode_u64`] produces for `value`.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_u64() {
        let test_values = [0, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for &value in &test_values {
            let encoded = encode_u64(value);
            let (decoded, bytes_read) = decode_u64(&encoded).unwrap();

            assert_eq!(value, decoded);
            assert_eq!(encoded.len(), bytes_read);
            assert_eq!(encoded.len(), encoded_len(value));
        }
    }

    #[test]
    fn test_encoding_efficiency() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(127), 1);
        assert_eq!(encoded_len(128), 2);
        assert_eq!(encoded_len(16383), 2);
        assert_eq!(encoded_len(16384), 3);
        assert_eq!(encoded_len(u64::MAX), 10);
    }

    #[test]
    fn test_incomplete_varint() {
        // Continuation bit set but no more data
        assert!(decode_u64(&[0x80]).is_err());
        assert!(decode_u64(&[]).is_err());
    }

    #[test]
    fn test_overflow() {
        let overflow_data = vec![0xFF; 11];
        assert!(decode_u64(&overflow_data).is_err());
    }
}
