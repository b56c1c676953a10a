//! EvmKey Crypto Primitives
//!
//! Low-level building blocks for HD key derivation and transaction signing:
//! big-endian integer codec, secp256k1 curve operations, hashes and
//! address encoding.

pub mod codec;
pub mod encoding;
pub mod hash;
pub mod secp256k1;

pub use self::codec::{CodecError, U256};
pub use self::secp256k1::{RecoverableSignature, Secp256k1Error, Secp256k1Keypair};

// Re-export dependencies for use by other crates
pub use hex;
pub use num_bigint;
