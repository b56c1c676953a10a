//! Hex and EIP-55 address encoding

use thiserror::Error;

use crate::hash::keccak256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Invalid character in input")]
    InvalidCharacter,
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Decode hex with or without `0x` prefix
pub fn decode_hex(input: &str) -> Result<Vec<u8>, EncodingError> {
    hex::decode(strip_hex_prefix(input.trim())).map_err(|_| EncodingError::InvalidCharacter)
}

/// Decode hex into a fixed-size array
pub fn decode_hex_array<const N: usize>(input: &str) -> Result<[u8; N], EncodingError> {
    let bytes = decode_hex(input)?;
    if bytes.len() != N {
        return Err(EncodingError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// `0x`-prefixed lowercase hex
pub fn encode_hex_prefixed(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// EIP-55 checksum encoding for Ethereum addresses
pub fn eip55_checksum(address: &[u8; 20]) -> String {
    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in hex_addr.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 {
            (hash[i / 2] >> 4) & 0x0F
        } else {
            hash[i / 2] & 0x0F
        };

        if hash_nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(hex_str: &str) -> [u8; 20] {
        decode_hex_array(hex_str).unwrap()
    }

    #[test]
    fn test_eip55_checksum() {
        let checksummed = eip55_checksum(&addr("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert_eq!(checksummed, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_eip55_reference_set() {
        for expected in [
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let raw = addr(&expected.to_lowercase());
            assert_eq!(eip55_checksum(&raw), expected);
        }
    }

    #[test]
    fn test_checksum_is_reversible() {
        let raw = addr("0xde709f2102306220921060314715629080e2fb77");
        let checksummed = eip55_checksum(&raw);
        assert_eq!(
            checksummed.to_lowercase(),
            "0xde709f2102306220921060314715629080e2fb77"
        );
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(decode_hex("0102").unwrap(), vec![1, 2]);
        assert_eq!(decode_hex("0xzz"), Err(EncodingError::InvalidCharacter));
        assert_eq!(
            decode_hex_array::<4>("0x0102"),
            Err(EncodingError::InvalidLength { expected: 4, actual: 2 })
        );
        assert_eq!(encode_hex_prefixed(&[0xab]), "0xab");
    }
}
