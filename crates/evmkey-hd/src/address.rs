//! Account addresses
//!
//! address = last 20 bytes of keccak256(uncompressed_pubkey[1..65]),
//! displayed with the EIP-55 mixed-case checksum.

use std::fmt;
use std::str::FromStr;

use evmkey_crypto::{encoding, hash::keccak256, hex, secp256k1, Secp256k1Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::key::PrivateKey;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be 40 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("Address contains non-hex characters")]
    InvalidHex,
    #[error("Address checksum does not match")]
    InvalidChecksum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address of an uncompressed `0x04 || x || y` point
    pub fn from_public_key(public_key: &[u8; 65]) -> Self {
        let hash = keccak256(&public_key[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    pub fn from_private_key(key: &PrivateKey) -> Result<Self, Secp256k1Error> {
        Ok(Self::from_public_key(&key.public_key()?))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 form, `0x`-prefixed
    pub fn to_checksum(&self) -> String {
        encoding::eip55_checksum(&self.0)
    }

    pub fn to_lowercase_hex(&self) -> String {
        encoding::encode_hex_prefixed(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// `0x` optional. All-lowercase and all-uppercase input is accepted
    /// as-is; mixed case must carry a valid checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = encoding::strip_hex_prefix(s.trim());
        if body.len() != 40 {
            return Err(AddressError::InvalidLength(body.len()));
        }
        if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex);
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        let address = Self(bytes);

        let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *body {
            return Err(AddressError::InvalidChecksum);
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Uncompressed public key for `key`
pub fn public_key_from(key: &PrivateKey) -> Result<[u8; 65], Secp256k1Error> {
    secp256k1::derive_public_key(key.as_bytes())
}

/// Address of an uncompressed public key
pub fn address_from(public_key: &[u8; 65]) -> Address {
    Address::from_public_key(public_key)
}

pub fn is_valid_address(input: &str) -> bool {
    input.parse::<Address>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_address_of_key_one() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = PrivateKey::from_bytes(&bytes).unwrap();
        let address = Address::from_private_key(&key).unwrap();
        assert_eq!(
            address.to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
        assert_eq!(
            address.to_lowercase_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_public_key_matches_keypair() {
        let key = PrivateKey::from_bytes(&[0x46u8; 32]).unwrap();
        let public = public_key_from(&key).unwrap();
        assert_eq!(public[0], 0x04);
        assert_eq!(public, key.public_key().unwrap());
        assert_eq!(
            address_from(&public),
            Address::from_private_key(&key).unwrap()
        );
    }

    #[test]
    fn test_checksum_reference_addresses() {
        for expected in CHECKSUMMED {
            let address: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(address.to_checksum(), expected);
            assert_eq!(expected.parse::<Address>().unwrap(), address);
        }
    }

    #[test]
    fn test_checksum_is_idempotent() {
        let address: Address = CHECKSUMMED[0].parse().unwrap();
        let once = address.to_checksum();
        let twice = once.parse::<Address>().unwrap().to_checksum();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_accepts_unprefixed_and_uppercase() {
        let body = &CHECKSUMMED[1][2..];
        assert!(is_valid_address(body));
        assert!(is_valid_address(&format!("0x{}", body.to_uppercase())));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength(4))
        );
        assert_eq!(
            "0xzz5eb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<Address>(),
            Err(AddressError::InvalidHex)
        );
        // flip the case of one letter
        let tampered = CHECKSUMMED[0].replacen('a', "A", 1);
        assert_eq!(
            tampered.parse::<Address>(),
            Err(AddressError::InvalidChecksum)
        );
    }

    #[test]
    fn test_serde_uses_checksum_string() {
        let address: Address = CHECKSUMMED[2].parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", CHECKSUMMED[2]));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
