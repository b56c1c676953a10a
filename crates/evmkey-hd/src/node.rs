//! BIP32 private child key derivation
//!
//! The walk goes master -> depth 1 -> ... -> final node; only the final
//! node's scalar leaves this module (as a [`PrivateKey`]).

use std::fmt;

use evmkey_crypto::{codec::u32_be, hash::hmac_sha512, secp256k1::tweak_add};
use evmkey_crypto::{Secp256k1Error, Secp256k1Keypair};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::key::PrivateKey;
use crate::path::{ChildIndex, DerivationPath, HARDENED_OFFSET};

/// HMAC key for the master node
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HdError {
    #[error("Seed produced an invalid master key")]
    InvalidMasterKey,
    #[error("No valid child key at or above index {index}")]
    InvalidChildKey { index: u32 },
    #[error("Child index {0} is out of range (max 2^31 - 1)")]
    IndexOutOfRange(u32),
    #[error("Maximum derivation depth exceeded")]
    MaxDepthExceeded,
    #[error(transparent)]
    Curve(#[from] Secp256k1Error),
}

/// How the parent public key is serialized into the HMAC input of a
/// non-hardened step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKeyEncoding {
    /// 65-byte `0x04 || x || y`; the wallet's historical derivation
    #[default]
    Uncompressed,
    /// 33-byte SEC1 compressed point, as written in BIP32
    Compressed,
}

/// A private node of the key tree: scalar plus chain code. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HdNode {
    private_key: [u8; 32],
    chain_code: [u8; 32],
    depth: u8,
    child_number: u32,
}

impl HdNode {
    /// `I = HMAC-SHA512("Bitcoin seed", seed)`; key = `I_L`, chain code = `I_R`
    pub fn master(seed: &[u8]) -> Result<Self, HdError> {
        let i = Zeroizing::new(hmac_sha512(MASTER_HMAC_KEY, &[seed]));

        let mut private_key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        private_key.copy_from_slice(&i[..32]);
        chain_code.copy_from_slice(&i[32..]);

        let node = Self {
            private_key,
            chain_code,
            depth: 0,
            child_number: 0,
        };
        // I_L must be in [1, n-1]
        Secp256k1Keypair::from_bytes(&node.private_key)
            .map_err(|_| HdError::InvalidMasterKey)?;
        Ok(node)
    }

    /// Derive the child at `index`. An index whose key is invalid
    /// (`I_L >= n` or a zero child) is skipped in favour of `index + 1`.
    pub fn derive_child(
        &self,
        index: u32,
        hardened: bool,
        encoding: ParentKeyEncoding,
    ) -> Result<Self, HdError> {
        if index >= HARDENED_OFFSET {
            return Err(HdError::IndexOutOfRange(index));
        }
        if self.depth == u8::MAX {
            return Err(HdError::MaxDepthExceeded);
        }

        let (used, child) =
            first_valid_index(index, |i| self.try_derive_child(i, hardened, encoding))?;
        if used != index {
            debug!(requested = index, used, "derived child at substitute index");
        }
        Ok(child)
    }

    /// Derive one step; `None` means the index is invalid under BIP32
    fn try_derive_child(
        &self,
        index: u32,
        hardened: bool,
        encoding: ParentKeyEncoding,
    ) -> Result<Option<Self>, HdError> {
        let child_number = if hardened { index | HARDENED_OFFSET } else { index };
        let ser_i = u32_be(child_number);

        let i = if hardened {
            // 0x00 || ser256(k_par) || ser32(i)
            Zeroizing::new(hmac_sha512(
                &self.chain_code,
                &[&[0u8], &self.private_key, &ser_i],
            ))
        } else {
            // serP(K_par) || ser32(i)
            let parent = Secp256k1Keypair::from_bytes(&self.private_key)?;
            let uncompressed;
            let compressed;
            let public: &[u8] = match encoding {
                ParentKeyEncoding::Uncompressed => {
                    uncompressed = parent.public_key_uncompressed();
                    &uncompressed
                }
                ParentKeyEncoding::Compressed => {
                    compressed = parent.public_key_compressed();
                    &compressed
                }
            };
            Zeroizing::new(hmac_sha512(&self.chain_code, &[public, &ser_i]))
        };

        let mut il = Zeroizing::new([0u8; 32]);
        il.copy_from_slice(&i[..32]);

        let Some(private_key) = tweak_add(&self.private_key, &il)? else {
            return Ok(None);
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Ok(Some(Self {
            private_key,
            chain_code,
            depth: self.depth + 1,
            child_number,
        }))
    }

    pub fn derive_step(
        &self,
        step: ChildIndex,
        encoding: ParentKeyEncoding,
    ) -> Result<Self, HdError> {
        self.derive_child(step.index, step.hardened, encoding)
    }

    /// Fold [`HdNode::derive_step`] over every step of `path`
    pub fn derive_path(
        &self,
        path: &DerivationPath,
        encoding: ParentKeyEncoding,
    ) -> Result<Self, HdError> {
        let mut node = self.clone();
        for step in path.steps() {
            node = node.derive_step(*step, encoding)?;
            debug!(depth = node.depth, "derived child node");
        }
        Ok(node)
    }

    pub fn private_key(&self) -> Result<PrivateKey, HdError> {
        PrivateKey::from_bytes(&self.private_key)
            .map_err(|_| HdError::Curve(Secp256k1Error::InvalidPrivateKey))
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Child number including the hardened bit; 0 for the master node
    pub fn child_number(&self) -> u32 {
        self.child_number
    }
}

impl fmt::Debug for HdNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdNode")
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

/// Try `start`, `start + 1`, ... until `derive` yields a node.
fn first_valid_index<T, F>(start: u32, mut derive: F) -> Result<(u32, T), HdError>
where
    F: FnMut(u32) -> Result<Option<T>, HdError>,
{
    let mut index = start;
    loop {
        if let Some(node) = derive(index)? {
            return Ok((index, node));
        }
        warn!(index, "invalid child key, trying next index");
        index += 1;
        if index >= HARDENED_OFFSET {
            return Err(HdError::InvalidChildKey { index: start });
        }
    }
}

/// Master node of the tree rooted at `seed`
pub fn master_key(seed: &[u8]) -> Result<HdNode, HdError> {
    HdNode::master(seed)
}

/// Master node from `seed`, walked down `path`
pub fn derive_path(
    seed: &[u8],
    path: &DerivationPath,
    encoding: ParentKeyEncoding,
) -> Result<HdNode, HdError> {
    master_key(seed)?.derive_path(path, encoding)
}

/// Private key at `path` below `seed`
pub fn derive_private_key(
    seed: &[u8],
    path: &DerivationPath,
    encoding: ParentKeyEncoding,
) -> Result<PrivateKey, HdError> {
    derive_path(seed, path, encoding)?.private_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::mnemonic::MnemonicPhrase;

    const BIP32_SEED_1: &str = "000102030405060708090a0b0c0d0e0f";

    fn seed(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str).unwrap()
    }

    #[test]
    fn test_bip32_vector_1_master() {
        let master = HdNode::master(&seed(BIP32_SEED_1)).unwrap();
        assert_eq!(
            hex::encode(master.private_key().unwrap().as_bytes()),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(master.chain_code()),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(master.depth(), 0);
    }

    #[test]
    fn test_bip32_vector_1_hardened_child() {
        // Hardened steps never touch the public key, so both encodings agree.
        for encoding in [ParentKeyEncoding::Uncompressed, ParentKeyEncoding::Compressed] {
            let path: DerivationPath = "m/0'".parse().unwrap();
            let node = derive_path(&seed(BIP32_SEED_1), &path, encoding).unwrap();
            assert_eq!(
                hex::encode(node.private_key().unwrap().as_bytes()),
                "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
            );
            assert_eq!(
                hex::encode(node.chain_code()),
                "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141"
            );
            assert_eq!(node.child_number(), 0x8000_0000);
        }
    }

    #[test]
    fn test_bip32_vector_1_normal_child_compressed() {
        let path: DerivationPath = "m/0'/1".parse().unwrap();
        let node = derive_path(&seed(BIP32_SEED_1), &path, ParentKeyEncoding::Compressed).unwrap();
        assert_eq!(
            hex::encode(node.private_key().unwrap().as_bytes()),
            "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368"
        );
        assert_eq!(
            hex::encode(node.chain_code()),
            "2a7857631386ba23dacac34180dd1983734e444fdbf774041578e9b6adb37c19"
        );
    }

    #[test]
    fn test_encodings_diverge_on_normal_steps() {
        let path: DerivationPath = "m/0'/1".parse().unwrap();
        let a = derive_path(&seed(BIP32_SEED_1), &path, ParentKeyEncoding::Uncompressed).unwrap();
        let b = derive_path(&seed(BIP32_SEED_1), &path, ParentKeyEncoding::Compressed).unwrap();
        assert_ne!(a.private_key().unwrap(), b.private_key().unwrap());
    }

    #[test]
    fn test_standard_account_vector() {
        let phrase = MnemonicPhrase::parse(
            "test test test test test test test test test test test junk",
        )
        .unwrap();
        let seed = phrase.to_seed("");
        let key = derive_private_key(
            seed.as_ref(),
            &DerivationPath::ethereum(),
            ParentKeyEncoding::Compressed,
        )
        .unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        );
        assert_eq!(
            Address::from_private_key(&key).unwrap().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = seed(BIP32_SEED_1);
        let path = DerivationPath::ethereum();
        let a = derive_private_key(&seed, &path, ParentKeyEncoding::Uncompressed).unwrap();
        let b = derive_private_key(&seed, &path, ParentKeyEncoding::Uncompressed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stepwise_fold_matches_path() {
        let seed = seed(BIP32_SEED_1);
        let encoding = ParentKeyEncoding::Uncompressed;
        let master = HdNode::master(&seed).unwrap();

        let manual = master
            .derive_child(44, true, encoding)
            .and_then(|n| n.derive_child(60, true, encoding))
            .and_then(|n| n.derive_child(0, true, encoding))
            .and_then(|n| n.derive_child(0, false, encoding))
            .and_then(|n| n.derive_child(0, false, encoding))
            .unwrap();

        // Splitting the path at any depth gives the same node
        let account: DerivationPath = "m/44'/60'/0'".parse().unwrap();
        let rest: DerivationPath = "m/0/0".parse().unwrap();
        let split = master
            .derive_path(&account, encoding)
            .and_then(|n| n.derive_path(&rest, encoding))
            .unwrap();

        let whole = derive_path(&seed, &DerivationPath::ethereum(), encoding).unwrap();

        assert_eq!(manual.private_key().unwrap(), whole.private_key().unwrap());
        assert_eq!(split.private_key().unwrap(), whole.private_key().unwrap());
        assert_eq!(whole.depth(), 5);
        assert_eq!(whole.child_number(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        let master = HdNode::master(&seed(BIP32_SEED_1)).unwrap();
        assert_eq!(
            master
                .derive_child(HARDENED_OFFSET, false, ParentKeyEncoding::Uncompressed)
                .err(),
            Some(HdError::IndexOutOfRange(HARDENED_OFFSET))
        );
    }

    #[test]
    fn test_invalid_index_is_skipped() {
        let (used, value) = first_valid_index(5, |i| Ok((i >= 7).then_some(i * 10))).unwrap();
        assert_eq!(used, 7);
        assert_eq!(value, 70);
    }

    #[test]
    fn test_exhausted_index_space() {
        let result = first_valid_index::<u32, _>(HARDENED_OFFSET - 2, |_| Ok(None));
        assert_eq!(
            result.err(),
            Some(HdError::InvalidChildKey {
                index: HARDENED_OFFSET - 2
            })
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let master = HdNode::master(&seed(BIP32_SEED_1)).unwrap();
        let printed = format!("{:?}", master);
        assert!(printed.contains("depth"));
        assert!(!printed.contains("e8f32e"));
    }
}
