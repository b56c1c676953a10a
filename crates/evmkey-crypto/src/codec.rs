//! Fixed-width big-endian integer codec
//!
//! Every integer that crosses a wire format (HD derivation indices, ABI
//! slots, RLP items) goes through here.

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

/// Unsigned 256-bit quantity. Values above `2^256 - 1` are rejected at
/// every encoding boundary.
pub type U256 = BigUint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Value needs {needed} bytes, slot holds {width}")]
    ValueTooLarge { needed: usize, width: usize },
}

/// Encode a 32-bit index as 4 big-endian bytes
pub fn u32_be(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Encode `value` left-padded with zeros to exactly `width` bytes
pub fn to_be_padded(value: &BigUint, width: usize) -> Result<Vec<u8>, CodecError> {
    let bytes = to_be_minimal(value);
    if bytes.len() > width {
        return Err(CodecError::ValueTooLarge {
            needed: bytes.len(),
            width,
        });
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Encode `value` into a 32-byte word
pub fn to_be_32(value: &BigUint) -> Result<[u8; 32], CodecError> {
    let padded = to_be_padded(value, 32)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&padded);
    Ok(out)
}

/// Shortest big-endian form; zero encodes as no bytes
pub fn to_be_minimal(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

/// Drop leading zero bytes from an already-encoded big-endian integer
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Decode an unsigned big-endian integer of any length
pub fn from_be(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// `2^256 - 1`
pub fn u256_max() -> U256 {
    (BigUint::from(1u8) << 256u32) - 1u8
}

/// Check that `value` fits in 256 bits
pub fn check_u256(value: &BigUint) -> Result<(), CodecError> {
    let bits = value.bits();
    if bits > 256 {
        return Err(CodecError::ValueTooLarge {
            needed: ((bits + 7) / 8) as usize,
            width: 32,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_be() {
        assert_eq!(u32_be(0x8000_002c), [0x80, 0x00, 0x00, 0x2c]);
        assert_eq!(u32_be(0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_padding() {
        let one = BigUint::from(1u8);
        let padded = to_be_padded(&one, 32).unwrap();
        assert_eq!(padded.len(), 32);
        assert_eq!(padded[31], 1);
        assert!(padded[..31].iter().all(|&b| b == 0));

        assert_eq!(to_be_padded(&BigUint::zero(), 4).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_padding_overflow() {
        let big = BigUint::from(0x1_0000u32);
        assert_eq!(
            to_be_padded(&big, 2),
            Err(CodecError::ValueTooLarge { needed: 3, width: 2 })
        );
    }

    #[test]
    fn test_minimal() {
        assert!(to_be_minimal(&BigUint::zero()).is_empty());
        assert_eq!(to_be_minimal(&BigUint::from(0x0400u32)), vec![0x04, 0x00]);
        assert_eq!(trim_leading_zeros(&[0, 0, 7, 0]), &[7, 0]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }

    #[test]
    fn test_u256_bounds() {
        let max = u256_max();
        assert_eq!(to_be_32(&max).unwrap(), [0xff; 32]);
        assert!(check_u256(&max).is_ok());
        assert!(check_u256(&(max + 1u8)).is_err());
        assert_eq!(from_be(&[0xff; 32]), u256_max());
    }
}
