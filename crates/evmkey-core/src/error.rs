//! Wallet error taxonomy

use evmkey_chain::{AbiError, BoxError, TxError, UnitsError};
use evmkey_crypto::Secp256k1Error;
use evmkey_hd::{AddressError, HdError, KeyError, MnemonicError, PathError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] MnemonicError),
    #[error("Invalid derivation path: {0}")]
    Path(#[from] PathError),
    #[error("Key derivation failed: {0}")]
    Derivation(HdError),
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),
    #[error("Invalid private key: {0}")]
    Key(#[from] KeyError),
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
    #[error("Transaction error: {0}")]
    Transaction(TxError),
    #[error("Invalid amount: {0}")]
    Units(#[from] UnitsError),
    #[error("Cryptographic failure: {0}")]
    Crypto(#[from] Secp256k1Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Node request '{operation}' failed: {source}")]
    Node {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("History request '{operation}' failed: {source}")]
    History {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("Secure storage '{operation}' failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl WalletError {
    /// Signing or key-validity failure, as opposed to bad input or a
    /// collaborator failure
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, WalletError::Crypto(_))
    }

    pub(crate) fn node(operation: &'static str) -> impl FnOnce(BoxError) -> Self {
        move |source| WalletError::Node { operation, source }
    }

    pub(crate) fn history(operation: &'static str) -> impl FnOnce(BoxError) -> Self {
        move |source| WalletError::History { operation, source }
    }

    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(BoxError) -> Self {
        move |source| WalletError::Storage { operation, source }
    }
}

impl From<HdError> for WalletError {
    fn from(e: HdError) -> Self {
        match e {
            HdError::Curve(inner) => WalletError::Crypto(inner),
            other => WalletError::Derivation(other),
        }
    }
}

impl From<TxError> for WalletError {
    fn from(e: TxError) -> Self {
        match e {
            TxError::SigningFailed(msg) => WalletError::Crypto(Secp256k1Error::SigningFailed(msg)),
            other => WalletError::Transaction(other),
        }
    }
}
