//! Account private key

use std::fmt;

use evmkey_crypto::{encoding, Secp256k1Error, Secp256k1Keypair};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Private key is not 32 bytes of hex")]
    InvalidEncoding,
    #[error("Private key is zero or not below the curve order")]
    OutOfRange,
}

/// 32-byte big-endian secp256k1 scalar, guaranteed `0 < k < n`.
///
/// Wiped on drop; `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        Secp256k1Keypair::from_bytes(bytes).map_err(|_| KeyError::OutOfRange)?;
        Ok(Self(*bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: &[u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidEncoding)?;
        Self::from_bytes(array)
    }

    /// Parse 64 hex chars, `0x` optional
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            encoding::decode_hex_array::<32>(input).map_err(|_| KeyError::InvalidEncoding)?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex, for export only
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(encoding::encode_hex_prefixed(&self.0))
    }

    pub fn keypair(&self) -> Result<Secp256k1Keypair, Secp256k1Error> {
        Secp256k1Keypair::from_bytes(&self.0)
    }

    /// Uncompressed public key (0x04 || x || y)
    pub fn public_key(&self) -> Result<[u8; 65], Secp256k1Error> {
        Ok(self.keypair()?.public_key_uncompressed())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}
