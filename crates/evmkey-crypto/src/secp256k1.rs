//! secp256k1 curve operations: public key derivation, scalar tweaks and
//! recoverable ECDSA over 32-byte prehashes
//!
//! All curve arithmetic is delegated to `k256`.

use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    elliptic_curve::{sec1::ToEncodedPoint, PrimeField},
    PublicKey, Scalar, SecretKey,
};
use thiserror::Error;

/// Curve order `n`
pub const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// `n / 2`, the largest `s` a canonical signature may carry
pub const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Generator point `G`, uncompressed SEC1 encoding
pub const GENERATOR_UNCOMPRESSED: [u8; 65] = [
    0x04, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce, 0x87, 0x0b,
    0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17,
    0x98, 0x48, 0x3a, 0xda, 0x77, 0x26, 0xa3, 0xc4, 0x65, 0x5d, 0xa4, 0xfb, 0xfc, 0x0e, 0x11, 0x08,
    0xa8, 0xfd, 0x17, 0xb4, 0x48, 0xa6, 0x85, 0x54, 0x19, 0x9c, 0x47, 0xd0, 0x8f, 0xfb, 0x10, 0xd4,
    0xb8,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Secp256k1Error {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),
}

/// ECDSA signature with the recovery id needed to rebuild the signer's key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1 (y parity of R); 2 and 3 never occur for curve-order nonces
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// `s <= n/2`
    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_ORDER
    }
}

/// A secp256k1 keypair for ECDSA operations
#[derive(Clone)]
pub struct Secp256k1Keypair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Secp256k1Keypair {
    /// Create from raw 32-byte private key; rejects 0 and values >= n
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, Secp256k1Error> {
        let secret_key = SecretKey::from_bytes(bytes.into())
            .map_err(|_| Secp256k1Error::InvalidPrivateKey)?;
        let public_key = secret_key.public_key();
        Ok(Self { secret_key, public_key })
    }

    /// Get the uncompressed public key (65 bytes: 0x04 || x || y)
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let point = self.public_key.to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Get the compressed public key (33 bytes: 0x02/0x03 || x)
    pub fn public_key_compressed(&self) -> [u8; 33] {
        let point = self.public_key.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Get just the X and Y coordinates (64 bytes, no prefix)
    pub fn public_key_xy(&self) -> [u8; 64] {
        let uncompressed = self.public_key_uncompressed();
        let mut result = [0u8; 64];
        result.copy_from_slice(&uncompressed[1..65]);
        result
    }

    /// Sign a 32-byte prehash (RFC 6979 nonce).
    ///
    /// k256 emits low-S signatures and adjusts the recovery id to match.
    pub fn sign_prehash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature, Secp256k1Error> {
        let signing_key = SigningKey::from(&self.secret_key);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| Secp256k1Error::SigningFailed(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

/// Derive the uncompressed public key (0x04 || x || y) for a raw private key
pub fn derive_public_key(private_key: &[u8; 32]) -> Result<[u8; 65], Secp256k1Error> {
    Ok(Secp256k1Keypair::from_bytes(private_key)?.public_key_uncompressed())
}

/// `(tweak + key) mod n`, or `None` when `tweak >= n` or the sum is zero.
///
/// This is the scalar step of BIP32 private child derivation.
pub fn tweak_add(key: &[u8; 32], tweak: &[u8; 32]) -> Result<Option<[u8; 32]>, Secp256k1Error> {
    let parent = SecretKey::from_bytes(key.into())
        .map_err(|_| Secp256k1Error::InvalidPrivateKey)?
        .to_nonzero_scalar();

    let tweak: Option<Scalar> = Scalar::from_repr((*tweak).into()).into();
    let Some(tweak) = tweak else {
        return Ok(None);
    };

    let child = tweak + *parent;
    Ok(SecretKey::from_bytes(&child.to_bytes())
        .ok()
        .map(|k| k.to_bytes().into()))
}

/// Recover the uncompressed public key that produced `signature` over `hash`
pub fn recover_public_key(
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<[u8; 65], Secp256k1Error> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);

    let sig = Signature::from_slice(&rs)
        .map_err(|e| Secp256k1Error::RecoveryFailed(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
        Secp256k1Error::RecoveryFailed(format!("bad recovery id {}", signature.recovery_id))
    })?;

    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| Secp256k1Error::RecoveryFailed(e.to_string()))?;

    let point = key.to_encoded_point(false);
    let mut result = [0u8; 65];
    result.copy_from_slice(point.as_bytes());
    Ok(result)
}
