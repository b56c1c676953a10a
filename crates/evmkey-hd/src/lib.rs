//! EvmKey HD Key Tree
//!
//! BIP39 mnemonics, BIP32/BIP44 private derivation along
//! `m/44'/60'/0'/0/0`, and EIP-55 account addresses.

pub mod address;
pub mod key;
pub mod mnemonic;
pub mod node;
pub mod path;

pub use address::{address_from, is_valid_address, public_key_from, Address, AddressError};
pub use key::{KeyError, PrivateKey};
pub use mnemonic::{MnemonicError, MnemonicPhrase, Seed, WordCount};
pub use node::{
    derive_path, derive_private_key, master_key, HdError, HdNode, ParentKeyEncoding,
};
pub use path::{ChildIndex, DerivationPath, PathError, ETHEREUM_PATH};
