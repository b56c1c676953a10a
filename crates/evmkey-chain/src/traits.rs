//! Collaborator traits
//!
//! The wallet never talks to a node or a keystore directly; callers inject
//! implementations of these traits. Their errors are opaque to the wallet
//! and passed through unchanged.

use evmkey_crypto::U256;
use evmkey_hd::Address;

use crate::history::TransactionRecord;

/// Opaque collaborator error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Parameters of a gas estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

/// Encrypted at-rest storage for a single private key
pub trait SecureStorage: Send + Sync {
    /// Store `key`, replacing whatever was stored before
    fn save(&self, key: &[u8]) -> Result<(), BoxError>;

    /// Stored key, or `None` if nothing is stored
    fn load(&self) -> Result<Option<Vec<u8>>, BoxError>;

    fn clear(&self) -> Result<(), BoxError>;
}

/// A remote node of the chain
pub trait NodeClient: Send + Sync {
    /// Read-only contract call at the latest block
    fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, BoxError>;

    /// Submit a signed transaction; returns its hash as reported by the node
    fn broadcast(&self, raw: &[u8]) -> Result<String, BoxError>;

    /// Pending transaction count of `address`
    fn get_nonce(&self, address: &Address) -> Result<u64, BoxError>;

    fn get_gas_price(&self) -> Result<U256, BoxError>;

    fn estimate_gas(&self, request: &CallRequest) -> Result<u64, BoxError>;

    /// Native balance in wei
    fn get_balance(&self, address: &Address) -> Result<U256, BoxError>;
}

/// An indexing service holding per-account transaction lists
pub trait HistoryProvider: Send + Sync {
    /// Native transfers and contract calls sent from or to `address`
    fn normal_transactions(&self, address: &Address) -> Result<Vec<TransactionRecord>, BoxError>;

    /// Token transfer events involving `address`, optionally limited to
    /// one token contract. Records carry their [`TokenTransfer`] metadata.
    ///
    /// [`TokenTransfer`]: crate::history::TokenTransfer
    fn token_transfers(
        &self,
        address: &Address,
        contract: Option<&Address>,
    ) -> Result<Vec<TransactionRecord>, BoxError>;
}
