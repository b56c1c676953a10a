//! Recursive Length Prefix encoding
//!
//! Only the encoder side: the wallet builds transactions, it never parses
//! them back.

use evmkey_crypto::codec;
use num_bigint::BigUint;

/// Encode a byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }

    let mut out = encode_header(0x80, data.len());
    out.extend_from_slice(data);
    out
}

/// Encode an integer in its minimal big-endian form; zero is the empty string
pub fn encode_u64(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    encode_bytes(codec::trim_leading_zeros(&bytes))
}

pub fn encode_uint(value: &BigUint) -> Vec<u8> {
    encode_bytes(&codec::to_be_minimal(value))
}

/// Encode a list from already-encoded items
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_len = items.iter().map(Vec::len).sum();
    let mut out = encode_header(0xc0, payload_len);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Short form below 56 bytes of payload, long form (length of length) above
fn encode_header(offset: u8, len: usize) -> Vec<u8> {
    if len < 56 {
        return vec![offset + len as u8];
    }
    let len_bytes = encode_length(len);
    let mut out = Vec::with_capacity(1 + len_bytes.len() + len);
    out.push(offset + 55 + len_bytes.len() as u8);
    out.extend_from_slice(&len_bytes);
    out
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    codec::trim_leading_zeros(&bytes).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bytes() {
        assert_eq!(encode_bytes(&[0x00]), vec![0x00]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(encode_bytes(&[]), vec![0x80]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);

        let lorem = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        assert_eq!(lorem.len(), 56);
        let encoded = encode_bytes(lorem);
        assert_eq!(&encoded[..2], &[0xb8, 0x38]);
        assert_eq!(&encoded[2..], &lorem[..]);
    }

    #[test]
    fn test_integers() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(15), vec![0x0f]);
        assert_eq!(encode_u64(1024), vec![0x82, 0x04, 0x00]);
        assert_eq!(encode_uint(&BigUint::from(0u8)), vec![0x80]);
        assert_eq!(encode_uint(&BigUint::from(1024u32)), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_lists() {
        assert_eq!(encode_list(&[]), vec![0xc0]);

        let cat_dog = encode_list(&[encode_bytes(b"cat"), encode_bytes(b"dog")]);
        assert_eq!(
            cat_dog,
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );

        // [ [], [[]], [ [], [[]] ] ]
        let empty = encode_list(&[]);
        let one = encode_list(&[empty.clone()]);
        let two = encode_list(&[empty.clone(), one.clone()]);
        assert_eq!(
            encode_list(&[empty, one, two]),
            vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
        );
    }

    #[test]
    fn test_long_list() {
        let items: Vec<Vec<u8>> = (0..20).map(|_| encode_bytes(b"abc")).collect();
        let encoded = encode_list(&items);
        assert_eq!(&encoded[..2], &[0xf8, 80]);
        assert_eq!(encoded.len(), 82);
    }
}
