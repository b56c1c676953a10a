//! Contract ABI for the token call set
//!
//! Calldata is `selector || slot*`, one 32-byte slot per static argument.
//! Return data is decoded for the three shapes the wallet reads back:
//! `uint256`, `uint8` and `string`.

use evmkey_crypto::{codec, encoding, hash::keccak256, CodecError, U256};
use evmkey_hd::Address;
use num_traits::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

const SLOT: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Malformed return data: need {expected} bytes, got {actual}")]
    MalformedReturnData { expected: usize, actual: usize },
    #[error("Returned string is not valid UTF-8")]
    InvalidUtf8,
    #[error("Value does not fit the target type")]
    ValueOverflow,
}

impl From<CodecError> for AbiError {
    fn from(_: CodecError) -> Self {
        AbiError::ValueOverflow
    }
}

/// First four bytes of `keccak256(signature)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn selector_hex(signature: &str) -> String {
    encoding::encode_hex_prefixed(&selector(signature))
}

/// Selectors of the token calls the wallet makes
pub struct KnownSelectors;

impl KnownSelectors {
    pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31]; // balanceOf(address)
    pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb]; // transfer(address,uint256)
    pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67]; // decimals()
    pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41]; // symbol()
    pub const NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03]; // name()
    pub const TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd]; // totalSupply()
}

/// A static call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiArg {
    Address(Address),
    Uint256(U256),
}

impl AbiArg {
    fn encode_slot(&self) -> Result<[u8; SLOT], AbiError> {
        match self {
            AbiArg::Address(address) => Ok(address_slot(address)),
            AbiArg::Uint256(value) => Ok(codec::to_be_32(value)?),
        }
    }
}

/// `selector || encode(arg_1) || ... || encode(arg_n)`
pub fn encode_call(selector: [u8; 4], args: &[AbiArg]) -> Result<Vec<u8>, AbiError> {
    let mut data = Vec::with_capacity(4 + SLOT * args.len());
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&arg.encode_slot()?);
    }
    Ok(data)
}

pub fn encode_balance_of(owner: &Address) -> Vec<u8> {
    static_call(KnownSelectors::BALANCE_OF, &[address_slot(owner)])
}

pub fn encode_transfer(to: &Address, amount: &U256) -> Result<Vec<u8>, AbiError> {
    encode_call(
        KnownSelectors::TRANSFER,
        &[AbiArg::Address(*to), AbiArg::Uint256(amount.clone())],
    )
}

pub fn encode_decimals() -> Vec<u8> {
    KnownSelectors::DECIMALS.to_vec()
}

pub fn encode_symbol() -> Vec<u8> {
    KnownSelectors::SYMBOL.to_vec()
}

pub fn encode_name() -> Vec<u8> {
    KnownSelectors::NAME.to_vec()
}

fn address_slot(address: &Address) -> [u8; SLOT] {
    let mut slot = [0u8; SLOT];
    slot[12..].copy_from_slice(address.as_bytes());
    slot
}

fn static_call(selector: [u8; 4], slots: &[[u8; SLOT]]) -> Vec<u8> {
    let mut data = selector.to_vec();
    for slot in slots {
        data.extend_from_slice(slot);
    }
    data
}

/// The 32-byte word starting at `offset`
fn word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset
        .checked_add(SLOT)
        .ok_or(AbiError::MalformedReturnData {
            expected: usize::MAX,
            actual: data.len(),
        })?;
    data.get(offset..end).ok_or(AbiError::MalformedReturnData {
        expected: end,
        actual: data.len(),
    })
}

/// A word used as an offset or length; anything past `usize` cannot index
/// the buffer anyway.
fn word_as_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    codec::from_be(word(data, offset)?)
        .to_usize()
        .ok_or(AbiError::MalformedReturnData {
            expected: usize::MAX,
            actual: data.len(),
        })
}

/// First return slot as an unsigned 256-bit integer
pub fn decode_uint(data: &[u8]) -> Result<U256, AbiError> {
    Ok(codec::from_be(word(data, 0)?))
}

/// First return slot as `uint8`
pub fn decode_uint8(data: &[u8]) -> Result<u8, AbiError> {
    decode_uint(data)?.to_u8().ok_or(AbiError::ValueOverflow)
}

/// Dynamic `string`: head slot holds the offset, the slot at the offset
/// holds the byte length, the bytes follow.
pub fn decode_string(data: &[u8]) -> Result<String, AbiError> {
    let offset = word_as_usize(data, 0)?;
    let len = word_as_usize(data, offset)?;

    let start = offset + SLOT;
    let end = start.checked_add(len).ok_or(AbiError::MalformedReturnData {
        expected: usize::MAX,
        actual: data.len(),
    })?;
    let bytes = data.get(start..end).ok_or(AbiError::MalformedReturnData {
        expected: end,
        actual: data.len(),
    })?;

    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Shape of a call's return data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    Uint256,
    Uint8,
    String,
}

impl ReturnKind {
    pub fn decode(self, data: &[u8]) -> Result<AbiValue, AbiError> {
        match self {
            ReturnKind::Uint256 => decode_uint(data).map(AbiValue::Uint256),
            ReturnKind::Uint8 => decode_uint8(data).map(AbiValue::Uint8),
            ReturnKind::String => decode_string(data).map(AbiValue::String),
        }
    }
}

impl std::str::FromStr for ReturnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uint256" | "uint" => Ok(ReturnKind::Uint256),
            "uint8" => Ok(ReturnKind::Uint8),
            "string" => Ok(ReturnKind::String),
            other => Err(format!("unsupported return type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint256(U256),
    Uint8(u8),
    String(String),
}

impl std::fmt::Display for AbiValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbiValue::Uint256(v) => write!(f, "{}", v),
            AbiValue::Uint8(v) => write!(f, "{}", v),
            AbiValue::String(v) => f.write_str(v),
        }
    }
}

/// Encoded calldata plus the shape of what comes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub selector: [u8; 4],
    pub encoded_args: Vec<u8>,
    pub returns: ReturnKind,
}

impl ContractCall {
    pub fn new(
        selector: [u8; 4],
        args: &[AbiArg],
        returns: ReturnKind,
    ) -> Result<Self, AbiError> {
        let data = encode_call(selector, args)?;
        Ok(Self {
            selector,
            encoded_args: data[4..].to_vec(),
            returns,
        })
    }

    pub fn balance_of(owner: &Address) -> Self {
        Self {
            selector: KnownSelectors::BALANCE_OF,
            encoded_args: address_slot(owner).to_vec(),
            returns: ReturnKind::Uint256,
        }
    }

    pub fn decimals() -> Self {
        Self::no_args(KnownSelectors::DECIMALS, ReturnKind::Uint8)
    }

    pub fn symbol() -> Self {
        Self::no_args(KnownSelectors::SYMBOL, ReturnKind::String)
    }

    pub fn name() -> Self {
        Self::no_args(KnownSelectors::NAME, ReturnKind::String)
    }

    fn no_args(selector: [u8; 4], returns: ReturnKind) -> Self {
        Self {
            selector,
            encoded_args: Vec::new(),
            returns,
        }
    }

    /// Full calldata: selector followed by the argument slots
    pub fn calldata(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.encoded_args.len());
        data.extend_from_slice(&self.selector);
        data.extend_from_slice(&self.encoded_args);
        data
    }

    pub fn decode(&self, data: &[u8]) -> Result<AbiValue, AbiError> {
        self.returns.decode(data)
    }
}
