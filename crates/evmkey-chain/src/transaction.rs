//! Legacy transactions with EIP-155 replay protection
//!
//! Signing payload: `RLP([nonce, gasPrice, gasLimit, to, value, data,
//! chainId, 0, 0])`. Broadcast form: `RLP([nonce, gasPrice, gasLimit, to,
//! value, data, v, r, s])` with `v = recovery_id + 2 * chainId + 35`.

use evmkey_crypto::{
    codec, encoding, hash::keccak256, secp256k1, RecoverableSignature, Secp256k1Error, U256,
};
use evmkey_hd::{Address, PrivateKey};
use num_traits::Zero;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::rlp;

/// Largest chain id whose `v` still fits in a u64
const MAX_CHAIN_ID: u64 = (u64::MAX - 36) / 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),
    #[error("Contract call needs a gas limit; estimate it first")]
    GasEstimationRequired,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Value does not fit in 256 bits")]
    ValueOverflow,
    #[error("Invalid chain id {0}")]
    InvalidChainId(u64),
}

impl From<Secp256k1Error> for TxError {
    fn from(e: Secp256k1Error) -> Self {
        TxError::SigningFailed(e.to_string())
    }
}

/// Parse a recipient, reporting failures as [`TxError::InvalidRecipient`]
pub fn parse_recipient(input: &str) -> Result<Address, TxError> {
    input
        .parse()
        .map_err(|_| TxError::InvalidRecipient(input.to_string()))
}

fn check_chain_id(chain_id: u64) -> Result<(), TxError> {
    if chain_id == 0 || chain_id > MAX_CHAIN_ID {
        return Err(TxError::InvalidChainId(chain_id));
    }
    Ok(())
}

/// An unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

impl RawTransaction {
    /// Plain value transfer with empty data
    pub fn native_transfer(
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Address,
        value: U256,
    ) -> Result<Self, TxError> {
        let tx = Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data: Vec::new(),
        };
        tx.check_ranges()?;
        Ok(tx)
    }

    /// Zero-value call into `contract`
    pub fn contract_call(
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        contract: Address,
        data: Vec<u8>,
    ) -> Result<Self, TxError> {
        if gas_limit == 0 {
            return Err(TxError::GasEstimationRequired);
        }
        let tx = Self {
            nonce,
            gas_price,
            gas_limit,
            to: contract,
            value: U256::zero(),
            data,
        };
        tx.check_ranges()?;
        Ok(tx)
    }

    fn check_ranges(&self) -> Result<(), TxError> {
        codec::check_u256(&self.gas_price).map_err(|_| TxError::ValueOverflow)?;
        codec::check_u256(&self.value).map_err(|_| TxError::ValueOverflow)?;
        Ok(())
    }

    /// The six transaction fields, RLP-encoded but not yet wrapped in a list
    fn encoded_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_u64(self.nonce),
            rlp::encode_uint(&self.gas_price),
            rlp::encode_u64(self.gas_limit),
            rlp::encode_bytes(self.to.as_bytes()),
            rlp::encode_uint(&self.value),
            rlp::encode_bytes(&self.data),
        ]
    }

    /// EIP-155 signing payload
    pub fn signing_payload(&self, chain_id: u64) -> Result<Vec<u8>, TxError> {
        check_chain_id(chain_id)?;
        self.check_ranges()?;
        let mut items = self.encoded_fields();
        items.push(rlp::encode_u64(chain_id));
        items.push(rlp::encode_u64(0));
        items.push(rlp::encode_u64(0));
        Ok(rlp::encode_list(&items))
    }

    pub fn signing_hash(&self, chain_id: u64) -> Result<[u8; 32], TxError> {
        Ok(keccak256(&self.signing_payload(chain_id)?))
    }

    pub fn sign(self, key: &PrivateKey, chain_id: u64) -> Result<SignedTransaction, TxError> {
        let hash = self.signing_hash(chain_id)?;
        debug!(nonce = self.nonce, chain_id, "signing transaction");

        let signature = key.keypair()?.sign_prehash(&hash)?;
        let v = signature.recovery_id as u64 + 2 * chain_id + 35;

        let signed = SignedTransaction {
            tx: self,
            v,
            r: signature.r,
            s: signature.s,
        };
        debug!(hash = %encoding::encode_hex_prefixed(&signed.hash()), "transaction signed");
        Ok(signed)
    }
}

/// `keccak256(RLP(tx || chainId || 0 || 0))`
pub fn signing_hash(tx: &RawTransaction, chain_id: u64) -> Result<[u8; 32], TxError> {
    tx.signing_hash(chain_id)
}

/// Sign `tx` for `chain_id`; the signature is always low-S
pub fn sign(
    tx: RawTransaction,
    key: &PrivateKey,
    chain_id: u64,
) -> Result<SignedTransaction, TxError> {
    tx.sign(key, chain_id)
}

/// A transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: RawTransaction,
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignedTransaction {
    /// Broadcast bytes; `r` and `s` go out as minimal integers
    pub fn serialize(&self) -> Vec<u8> {
        let mut items = self.tx.encoded_fields();
        items.push(rlp::encode_u64(self.v));
        items.push(rlp::encode_bytes(codec::trim_leading_zeros(&self.r)));
        items.push(rlp::encode_bytes(codec::trim_leading_zeros(&self.s)));
        rlp::encode_list(&items)
    }

    /// Transaction hash as the network will report it
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.serialize())
    }

    pub fn raw_hex(&self) -> String {
        encoding::encode_hex_prefixed(&self.serialize())
    }

    pub fn hash_hex(&self) -> String {
        encoding::encode_hex_prefixed(&self.hash())
    }

    /// Sender address recovered from `(v, r, s)`
    pub fn recover_signer(&self, chain_id: u64) -> Result<Address, TxError> {
        check_chain_id(chain_id)?;
        let recovery_id = self
            .v
            .checked_sub(2 * chain_id + 35)
            .filter(|id| *id <= 1)
            .ok_or(TxError::InvalidChainId(chain_id))?;

        let signature = RecoverableSignature {
            r: self.r,
            s: self.s,
            recovery_id: recovery_id as u8,
        };
        let hash = self.tx.signing_hash(chain_id)?;
        let public_key = secp256k1::recover_public_key(&hash, &signature)?;
        Ok(Address::from_public_key(&public_key))
    }

    pub fn summary(&self) -> SignedSummary {
        SignedSummary {
            hash: self.hash_hex(),
            raw: self.raw_hex(),
            nonce: self.tx.nonce,
            to: self.tx.to,
            value: self.tx.value.to_string(),
            gas_price: self.tx.gas_price.to_string(),
            gas_limit: self.tx.gas_limit,
            v: self.v,
        }
    }
}

/// Printable view of a signed transaction
#[derive(Debug, Clone, Serialize)]
pub struct SignedSummary {
    pub hash: String,
    pub raw: String,
    pub nonce: u64,
    pub to: Address,
    pub value: String,
    pub gas_price: String,
    pub gas_limit: u64,
    pub v: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi;
    use evmkey_crypto::hex;

    const EIP155_SIGNED: &str = "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

    fn eip155_tx() -> RawTransaction {
        RawTransaction::native_transfer(
            9,
            U256::from(20_000_000_000u64),
            21_000,
            "0x3535353535353535353535353535353535353535".parse().unwrap(),
            U256::from(1_000_000_000_000_000_000u64),
        )
        .unwrap()
    }

    fn eip155_key() -> PrivateKey {
        PrivateKey::from_bytes(&[0x46u8; 32]).unwrap()
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_tx();
        assert_eq!(
            hex::encode(tx.signing_payload(1).unwrap()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(signing_hash(&tx, 1).unwrap()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_transaction() {
        let signed = sign(eip155_tx(), &eip155_key(), 1).unwrap();
        assert_eq!(signed.v, 37);
        assert_eq!(hex::encode(signed.serialize()), EIP155_SIGNED);
        assert_eq!(signed.raw_hex(), format!("0x{}", EIP155_SIGNED));
        assert_eq!(signed.hash(), keccak256(&hex::decode(EIP155_SIGNED).unwrap()));
    }

    #[test]
    fn test_v_tracks_chain_id() {
        for chain_id in [1u64, 5, 56, 137, 11_155_111] {
            let signed = eip155_tx().sign(&eip155_key(), chain_id).unwrap();
            let recovery_id = signed.v - 2 * chain_id - 35;
            assert!(recovery_id <= 1, "chain {}", chain_id);
        }
    }

    #[test]
    fn test_signatures_are_low_s() {
        let key = eip155_key();
        for nonce in 0..16 {
            let mut tx = eip155_tx();
            tx.nonce = nonce;
            let signed = tx.sign(&key, 1).unwrap();
            let sig = RecoverableSignature {
                r: signed.r,
                s: signed.s,
                recovery_id: 0,
            };
            assert!(sig.is_low_s());
        }
    }

    #[test]
    fn test_recover_signer() {
        let key = eip155_key();
        let signed = eip155_tx().sign(&key, 1).unwrap();
        assert_eq!(
            signed.recover_signer(1).unwrap(),
            Address::from_private_key(&key).unwrap()
        );
        // wrong chain id: v no longer decodes to a recovery id
        assert_eq!(signed.recover_signer(5), Err(TxError::InvalidChainId(5)));
    }

    #[test]
    fn test_contract_call() {
        let token: Address = "0xdac17f958d2ee523a2206206994597c13d831ec7".parse().unwrap();
        let to: Address = "0x3535353535353535353535353535353535353535".parse().unwrap();
        let data = abi::encode_transfer(&to, &U256::from(1_000_000u32)).unwrap();

        let tx = RawTransaction::contract_call(3, U256::from(1u8), 60_000, token, data.clone())
            .unwrap();
        assert!(tx.value.is_zero());
        assert_eq!(tx.data, data);

        let signed = tx.sign(&eip155_key(), 1).unwrap();
        assert_eq!(
            signed.recover_signer(1).unwrap(),
            Address::from_private_key(&eip155_key()).unwrap()
        );
    }

    #[test]
    fn test_contract_call_needs_gas_limit() {
        let token = Address::from_bytes([0x11; 20]);
        assert_eq!(
            RawTransaction::contract_call(0, U256::from(1u8), 0, token, vec![0xa9]),
            Err(TxError::GasEstimationRequired)
        );
    }

    #[test]
    fn test_value_overflow() {
        let too_big = codec::u256_max() + 1u8;
        assert_eq!(
            RawTransaction::native_transfer(0, U256::from(1u8), 21_000, Address::ZERO, too_big),
            Err(TxError::ValueOverflow)
        );
    }

    #[test]
    fn test_invalid_chain_id() {
        assert_eq!(
            eip155_tx().signing_hash(0),
            Err(TxError::InvalidChainId(0))
        );
        assert_eq!(
            eip155_tx().sign(&eip155_key(), u64::MAX).err(),
            Some(TxError::InvalidChainId(u64::MAX))
        );
    }

    #[test]
    fn test_parse_recipient() {
        assert!(parse_recipient("0x3535353535353535353535353535353535353535").is_ok());
        assert_eq!(
            parse_recipient("0x35"),
            Err(TxError::InvalidRecipient("0x35".into()))
        );
    }

    #[test]
    fn test_summary_serializes() {
        let signed = eip155_tx().sign(&eip155_key(), 1).unwrap();
        let json = serde_json::to_value(signed.summary()).unwrap();
        assert_eq!(json["nonce"], 9);
        assert_eq!(json["v"], 37);
        assert_eq!(json["to"], "0x3535353535353535353535353535353535353535");
        assert_eq!(json["value"], "1000000000000000000");
    }
}
