//! Wallet orchestration over injected collaborators

use evmkey_chain::abi::{self, AbiArg, ContractCall, KnownSelectors};
use evmkey_chain::history::{self, HistoryEntry};
use evmkey_chain::units;
use evmkey_chain::{CallRequest, HistoryProvider, NodeClient, SecureStorage, U256};
use evmkey_crypto::encoding;
use evmkey_hd::{Address, PrivateKey};
use num_traits::Zero;
use serde::Serialize;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::wallet::{self, CreatedWallet, RestoredWallet};

/// Token metadata read from the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub contract: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Owns the wallet configuration plus a node client, a history indexer
/// and a secure store, and runs the multi-step flows (send, balance, token
/// lookup, history) over them.
pub struct WalletKeyManager<N: NodeClient, S: SecureStorage, H: HistoryProvider> {
    config: WalletConfig,
    node: N,
    storage: S,
    history: H,
}

impl<N: NodeClient, S: SecureStorage, H: HistoryProvider> WalletKeyManager<N, S, H> {
    pub fn new(
        config: WalletConfig,
        node: N,
        storage: S,
        history: H,
    ) -> Result<Self, WalletError> {
        config.validate()?;
        Ok(Self {
            config,
            node,
            storage,
            history,
        })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn create_wallet(&self) -> Result<CreatedWallet, WalletError> {
        wallet::create_wallet(&self.config, self.config.word_count)
    }

    pub fn restore_wallet(&self, phrase: &str) -> Result<RestoredWallet, WalletError> {
        wallet::restore_wallet(&self.config, phrase)
    }

    pub fn derive_address(&self, key: &PrivateKey) -> Result<Address, WalletError> {
        wallet::derive_address(key)
    }

    /// Hand the raw key bytes to secure storage
    pub fn persist_key(&self, key: &PrivateKey) -> Result<(), WalletError> {
        self.storage
            .save(key.as_bytes())
            .map_err(WalletError::storage("save"))?;
        debug!("private key persisted");
        Ok(())
    }

    /// Stored key, or `None` when nothing has been persisted
    pub fn load_key(&self) -> Result<Option<PrivateKey>, WalletError> {
        let Some(bytes) = self.storage.load().map_err(WalletError::storage("load"))? else {
            return Ok(None);
        };
        let bytes = Zeroizing::new(bytes);
        Ok(Some(PrivateKey::from_slice(&bytes)?))
    }

    pub fn forget_key(&self) -> Result<(), WalletError> {
        self.storage.clear().map_err(WalletError::storage("clear"))?;
        info!("private key removed from storage");
        Ok(())
    }

    /// Send `amount_ether` of the native currency to `to`; returns the
    /// transaction hash reported by the node.
    pub fn send_native(
        &self,
        key: &PrivateKey,
        to: &Address,
        amount_ether: &str,
    ) -> Result<String, WalletError> {
        let value = units::to_wei(amount_ether)?;
        let from = wallet::derive_address(key)?;

        let nonce = self.node.get_nonce(&from).map_err(WalletError::node("get_nonce"))?;
        let gas_price = self.node.get_gas_price().map_err(WalletError::node("get_gas_price"))?;

        let raw = wallet::sign_native_transfer(
            key,
            nonce,
            gas_price,
            self.config.native_gas_limit,
            *to,
            value,
            self.config.chain_id,
        )?;
        self.broadcast(&raw, &from, to)
    }

    /// Send `amount` whole tokens (scaled by `decimals`) of `token` to `to`
    pub fn send_token(
        &self,
        key: &PrivateKey,
        token: &Address,
        to: &Address,
        amount: &str,
        decimals: u8,
    ) -> Result<String, WalletError> {
        let value = units::parse_units(amount, decimals)?;
        let args = [AbiArg::Address(*to), AbiArg::Uint256(value)];
        let data = abi::encode_call(KnownSelectors::TRANSFER, &args)?;
        let from = wallet::derive_address(key)?;

        let nonce = self.node.get_nonce(&from).map_err(WalletError::node("get_nonce"))?;
        let gas_price = self.node.get_gas_price().map_err(WalletError::node("get_gas_price"))?;
        let request = CallRequest {
            from,
            to: *token,
            value: U256::zero(),
            data,
        };
        let gas_limit = self
            .node
            .estimate_gas(&request)
            .map_err(WalletError::node("estimate_gas"))?;
        debug!(gas_limit, "estimated token transfer gas");

        let raw = wallet::sign_contract_call(
            key,
            nonce,
            gas_price,
            gas_limit,
            *token,
            KnownSelectors::TRANSFER,
            &args,
            self.config.chain_id,
        )?;
        self.broadcast(&raw, &from, token)
    }

    fn broadcast(&self, raw: &[u8], from: &Address, to: &Address) -> Result<String, WalletError> {
        let hash = self.node.broadcast(raw).map_err(WalletError::node("broadcast"))?;
        info!(%from, %to, tx_hash = %hash, "transaction broadcast");
        Ok(hash)
    }

    /// Native balance in wei
    pub fn native_balance(&self, address: &Address) -> Result<U256, WalletError> {
        self.node
            .get_balance(address)
            .map_err(WalletError::node("get_balance"))
    }

    /// Token balance of `owner` in the token's base units
    pub fn token_balance(&self, token: &Address, owner: &Address) -> Result<U256, WalletError> {
        let reply = self.call(token, &ContractCall::balance_of(owner), "balanceOf")?;
        wallet::decode_balance(&reply)
    }

    pub fn token_info(&self, token: &Address) -> Result<TokenInfo, WalletError> {
        let name = wallet::decode_name(&self.call(token, &ContractCall::name(), "name")?)?;
        let symbol = wallet::decode_symbol(&self.call(token, &ContractCall::symbol(), "symbol")?)?;
        let decimals =
            wallet::decode_decimals(&self.call(token, &ContractCall::decimals(), "decimals")?)?;
        Ok(TokenInfo {
            contract: *token,
            name,
            symbol,
            decimals,
        })
    }

    fn call(
        &self,
        token: &Address,
        call: &ContractCall,
        operation: &'static str,
    ) -> Result<Vec<u8>, WalletError> {
        debug!(%token, selector = %encoding::encode_hex_prefixed(&call.selector), "contract call");
        self.node
            .call(token, &call.calldata())
            .map_err(WalletError::node(operation))
    }

    /// Native and token transfers of `address`, newest first
    pub fn history(&self, address: &Address) -> Result<Vec<HistoryEntry>, WalletError> {
        let mut records = self
            .history
            .normal_transactions(address)
            .map_err(WalletError::history("normal_transactions"))?;
        records.extend(
            self.history
                .token_transfers(address, None)
                .map_err(WalletError::history("token_transfers"))?,
        );
        Ok(self.entries(address, records))
    }

    /// Transfers of one token involving `address`, newest first
    pub fn token_history(
        &self,
        address: &Address,
        token: &Address,
    ) -> Result<Vec<HistoryEntry>, WalletError> {
        let records = self
            .history
            .token_transfers(address, Some(token))
            .map_err(WalletError::history("token_transfers"))?;
        Ok(self.entries(address, records))
    }

    fn entries(
        &self,
        address: &Address,
        mut records: Vec<history::TransactionRecord>,
    ) -> Vec<HistoryEntry> {
        history::sort_newest_first(&mut records);
        debug!(%address, count = records.len(), "history fetched");
        records
            .iter()
            .map(|record| record.entry(address, self.config.display_precision))
            .collect()
    }

    /// Native balance rendered with the configured precision
    pub fn format_native(&self, wei: &U256) -> String {
        units::format_ether(wei, self.config.display_precision)
    }

    /// Token amount rendered with the configured precision
    pub fn format_token(&self, amount: &U256, decimals: u8) -> String {
        units::format_units(amount, decimals, self.config.display_precision)
    }
}
