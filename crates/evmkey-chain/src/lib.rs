//! EvmKey Chain Layer
//!
//! Everything that speaks the chain's formats: RLP, the token ABI call
//! set, legacy EIP-155 transactions, unit conversion, account history,
//! and the traits the wallet uses to reach a node, an indexer and secure
//! storage.

pub mod abi;
pub mod history;
pub mod rlp;
pub mod traits;
pub mod transaction;
pub mod units;

pub use abi::{AbiArg, AbiError, AbiValue, ContractCall, KnownSelectors, ReturnKind};
pub use history::{Direction, HistoryEntry, TokenTransfer, TransactionRecord};
pub use traits::{BoxError, CallRequest, HistoryProvider, NodeClient, SecureStorage};
pub use transaction::{RawTransaction, SignedTransaction, TxError};
pub use units::{format_units, parse_units, to_wei, UnitsError, ETHER_DECIMALS};

pub use evmkey_crypto::U256;
