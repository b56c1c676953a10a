//! Account transaction history
//!
//! Records come from an indexer (see [`crate::traits::HistoryProvider`]);
//! this module only classifies and renders them relative to one wallet.

use std::cmp::Reverse;

use evmkey_crypto::U256;
use evmkey_hd::Address;
use serde::Serialize;

use crate::units::{self, ETHER_DECIMALS};

/// Symbol shown for native currency transfers
pub const NATIVE_SYMBOL: &str = "ETH";

/// Which way value moved, seen from the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    Unknown,
}

/// Token metadata attached to a token transfer event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub contract: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// One indexed transaction or token transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    /// Wei, or token base units when `token` is set
    pub value: U256,
    pub gas_price: U256,
    pub gas_used: u64,
    pub timestamp: u64,
    pub block_number: u64,
    pub is_error: bool,
    pub token: Option<TokenTransfer>,
}

impl TransactionRecord {
    /// A transfer from the wallet to itself counts as sent
    pub fn direction(&self, wallet: &Address) -> Direction {
        if self.from == *wallet {
            Direction::Sent
        } else if self.to.as_ref() == Some(wallet) {
            Direction::Received
        } else {
            Direction::Unknown
        }
    }

    /// Token decimals, or 18 for native transfers and tokens reporting 0
    pub fn decimals(&self) -> u8 {
        match &self.token {
            Some(token) if token.decimals != 0 => token.decimals,
            _ => ETHER_DECIMALS,
        }
    }

    pub fn symbol(&self) -> &str {
        self.token
            .as_ref()
            .map_or(NATIVE_SYMBOL, |token| token.symbol.as_str())
    }

    /// Value in whole units, rounded half-up to `precision` digits
    pub fn format_value(&self, precision: u8) -> String {
        units::format_units(&self.value, self.decimals(), precision)
    }

    /// The other side of the transfer, if known
    pub fn counterparty(&self, wallet: &Address) -> Option<Address> {
        match self.direction(wallet) {
            Direction::Sent => self.to,
            Direction::Received => Some(self.from),
            Direction::Unknown => None,
        }
    }

    pub fn entry(&self, wallet: &Address, precision: u8) -> HistoryEntry {
        HistoryEntry {
            hash: self.hash.clone(),
            direction: self.direction(wallet),
            counterparty: self.counterparty(wallet),
            amount: self.format_value(precision),
            symbol: self.symbol().to_string(),
            block_number: self.block_number,
            timestamp: self.timestamp,
            failed: self.is_error,
        }
    }
}

/// Display row of the wallet's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub direction: Direction,
    pub counterparty: Option<Address>,
    pub amount: String,
    pub symbol: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub failed: bool,
}

/// Newest first: by block, then timestamp
pub fn sort_newest_first(records: &mut [TransactionRecord]) {
    records.sort_by_key(|r| Reverse((r.block_number, r.timestamp)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Address {
        Address::from_bytes([0x11; 20])
    }

    fn record(from: Address, to: Option<Address>, value: u64) -> TransactionRecord {
        TransactionRecord {
            hash: "0xabc".into(),
            from,
            to,
            value: U256::from(value),
            gas_price: U256::from(1u8),
            gas_used: 21_000,
            timestamp: 1_700_000_000,
            block_number: 100,
            is_error: false,
            token: None,
        }
    }

    fn usdc() -> TokenTransfer {
        TokenTransfer {
            contract: Address::from_bytes([0xa0; 20]),
            name: "USD Coin".into(),
            symbol: "USDC".into(),
            decimals: 6,
        }
    }

    #[test]
    fn test_direction() {
        let other = Address::from_bytes([0x22; 20]);
        let third = Address::from_bytes([0x33; 20]);

        assert_eq!(record(wallet(), Some(other), 1).direction(&wallet()), Direction::Sent);
        assert_eq!(record(other, Some(wallet()), 1).direction(&wallet()), Direction::Received);
        assert_eq!(record(other, Some(third), 1).direction(&wallet()), Direction::Unknown);
        assert_eq!(record(other, None, 1).direction(&wallet()), Direction::Unknown);
        assert_eq!(record(wallet(), Some(wallet()), 1).direction(&wallet()), Direction::Sent);
        assert_eq!(record(wallet(), None, 1).direction(&wallet()), Direction::Sent);
    }

    #[test]
    fn test_counterparty() {
        let other = Address::from_bytes([0x22; 20]);
        assert_eq!(record(wallet(), Some(other), 1).counterparty(&wallet()), Some(other));
        assert_eq!(record(other, Some(wallet()), 1).counterparty(&wallet()), Some(other));
        assert_eq!(record(other, None, 1).counterparty(&wallet()), None);
    }

    #[test]
    fn test_native_value_rounds_half_up() {
        let other = Address::from_bytes([0x22; 20]);
        // 0.12345 ETH
        let r = record(other, Some(wallet()), 123_450_000_000_000_000);
        assert_eq!(r.format_value(4), "0.1235");
        assert_eq!(r.symbol(), "ETH");
        assert_eq!(r.decimals(), 18);
    }

    #[test]
    fn test_token_value_uses_token_decimals() {
        let other = Address::from_bytes([0x22; 20]);
        let mut r = record(wallet(), Some(other), 2_500_050);
        r.token = Some(usdc());
        assert_eq!(r.format_value(4), "2.5001");
        assert_eq!(r.symbol(), "USDC");

        // zero decimals falls back to ether scaling
        r.token = Some(TokenTransfer { decimals: 0, ..usdc() });
        assert_eq!(r.decimals(), 18);
    }

    #[test]
    fn test_entry_serializes() {
        let other = Address::from_bytes([0x22; 20]);
        let mut r = record(other, Some(wallet()), 1_000_000_000_000_000_000);
        r.is_error = true;
        let json = serde_json::to_value(r.entry(&wallet(), 4)).unwrap();
        assert_eq!(json["direction"], "received");
        assert_eq!(json["amount"], "1.0000");
        assert_eq!(json["counterparty"], other.to_string());
        assert_eq!(json["failed"], true);
    }

    #[test]
    fn test_sort_newest_first() {
        let other = Address::from_bytes([0x22; 20]);
        let mut records = vec![
            record(other, Some(wallet()), 1),
            record(other, Some(wallet()), 2),
            record(other, Some(wallet()), 3),
        ];
        records[0].block_number = 5;
        records[1].block_number = 9;
        records[2].block_number = 9;
        records[2].timestamp += 10;

        sort_newest_first(&mut records);
        let values: Vec<_> = records.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, [U256::from(3u8), U256::from(2u8), U256::from(1u8)]);
    }
}
