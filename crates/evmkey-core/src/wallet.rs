//! Wallet operations
//!
//! Stateless functions: every call takes what it needs and returns owned
//! results. Keys and phrases are zeroized when the returned values drop.

use evmkey_chain::abi::{self, AbiArg};
use evmkey_chain::{RawTransaction, U256};
use evmkey_hd::{mnemonic, node, Address, MnemonicPhrase, PrivateKey, WordCount};
use tracing::{debug, info};

use crate::config::WalletConfig;
use crate::error::WalletError;

/// A freshly generated wallet. The phrase must be shown to the user once
/// and is the only backup of the key.
#[derive(Debug)]
pub struct CreatedWallet {
    pub key: PrivateKey,
    pub phrase: MnemonicPhrase,
    pub address: Address,
}

#[derive(Debug)]
pub struct RestoredWallet {
    pub key: PrivateKey,
    pub address: Address,
}

/// Generate a phrase from OS entropy and derive its account key
pub fn create_wallet(
    config: &WalletConfig,
    word_count: WordCount,
) -> Result<CreatedWallet, WalletError> {
    let (_entropy, phrase) = mnemonic::generate(word_count);
    let key = key_from_phrase(config, &phrase, "")?;
    let address = derive_address(&key)?;

    info!(%address, words = word_count.words(), "created wallet");
    Ok(CreatedWallet {
        key,
        phrase,
        address,
    })
}

/// Rebuild the account key from a backup phrase
pub fn restore_wallet(config: &WalletConfig, phrase: &str) -> Result<RestoredWallet, WalletError> {
    restore_wallet_with_passphrase(config, phrase, "")
}

/// [`restore_wallet`] for phrases protected by a BIP39 passphrase
pub fn restore_wallet_with_passphrase(
    config: &WalletConfig,
    phrase: &str,
    passphrase: &str,
) -> Result<RestoredWallet, WalletError> {
    let phrase = MnemonicPhrase::parse(phrase)?;
    let key = key_from_phrase(config, &phrase, passphrase)?;
    let address = derive_address(&key)?;

    info!(%address, "restored wallet");
    Ok(RestoredWallet { key, address })
}

fn key_from_phrase(
    config: &WalletConfig,
    phrase: &MnemonicPhrase,
    passphrase: &str,
) -> Result<PrivateKey, WalletError> {
    let seed = phrase.to_seed(passphrase);
    let path = config.derivation_path()?;
    debug!(%path, encoding = ?config.parent_key_encoding, "deriving account key");
    Ok(node::derive_private_key(
        seed.as_ref(),
        &path,
        config.parent_key_encoding,
    )?)
}

pub fn derive_address(key: &PrivateKey) -> Result<Address, WalletError> {
    Ok(Address::from_private_key(key)?)
}

/// Signed, serialized value transfer ready for broadcast
pub fn sign_native_transfer(
    key: &PrivateKey,
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value_wei: U256,
    chain_id: u64,
) -> Result<Vec<u8>, WalletError> {
    let tx = RawTransaction::native_transfer(nonce, gas_price, gas_limit, to, value_wei)?;
    Ok(tx.sign(key, chain_id)?.serialize())
}

/// Signed, serialized zero-value contract call ready for broadcast
#[allow(clippy::too_many_arguments)]
pub fn sign_contract_call(
    key: &PrivateKey,
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    contract: Address,
    selector: [u8; 4],
    args: &[AbiArg],
    chain_id: u64,
) -> Result<Vec<u8>, WalletError> {
    let data = abi::encode_call(selector, args)?;
    let tx = RawTransaction::contract_call(nonce, gas_price, gas_limit, contract, data)?;
    Ok(tx.sign(key, chain_id)?.serialize())
}

pub fn encode_balance_query(owner: &Address) -> Vec<u8> {
    abi::encode_balance_of(owner)
}

pub fn decode_balance(data: &[u8]) -> Result<U256, WalletError> {
    Ok(abi::decode_uint(data)?)
}

pub fn encode_transfer_call(to: &Address, amount: &U256) -> Result<Vec<u8>, WalletError> {
    Ok(abi::encode_transfer(to, amount)?)
}

pub fn decode_decimals(data: &[u8]) -> Result<u8, WalletError> {
    Ok(abi::decode_uint8(data)?)
}

pub fn decode_symbol(data: &[u8]) -> Result<String, WalletError> {
    Ok(abi::decode_string(data)?)
}

pub fn decode_name(data: &[u8]) -> Result<String, WalletError> {
    Ok(abi::decode_string(data)?)
}
