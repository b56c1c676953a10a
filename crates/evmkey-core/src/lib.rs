//! EvmKey Core
//!
//! Wallet operations on top of the HD key tree and the chain layer:
//! create and restore wallets, sign transfers, and orchestrate a remote
//! node, a history indexer and secure storage through [`WalletKeyManager`].

mod config;
mod error;
mod manager;
pub mod wallet;

pub use config::{ConfigError, WalletConfig};
pub use error::WalletError;
pub use manager::{TokenInfo, WalletKeyManager};
pub use wallet::{CreatedWallet, RestoredWallet};

// Re-exports for convenience
pub use evmkey_chain::{
    AbiArg, CallRequest, Direction, HistoryEntry, HistoryProvider, KnownSelectors, NodeClient,
    RawTransaction, SecureStorage, SignedTransaction, TokenTransfer, TransactionRecord, U256,
};
pub use evmkey_hd::{
    Address, DerivationPath, MnemonicPhrase, ParentKeyEncoding, PrivateKey, WordCount,
};
