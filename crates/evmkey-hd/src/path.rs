//! BIP32 derivation paths

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Standard account path for this chain family (BIP44, coin type 60)
pub const ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";

/// Bit set on hardened child numbers
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Derivation path must start with 'm': {0}")]
    MissingRoot(String),
    #[error("Invalid path segment '{0}'")]
    InvalidSegment(String),
    #[error("Path index {0} is out of range (max 2^31 - 1)")]
    IndexOutOfRange(u32),
}

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildIndex {
    pub index: u32,
    pub hardened: bool,
}

impl ChildIndex {
    pub fn new(index: u32, hardened: bool) -> Result<Self, PathError> {
        if index >= HARDENED_OFFSET {
            return Err(PathError::IndexOutOfRange(index));
        }
        Ok(Self { index, hardened })
    }

    /// Child number as serialized into the HMAC input
    pub fn to_u32(self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Ordered list of child steps below the master node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    /// `m/44'/60'/0'/0/0`
    pub fn ethereum() -> Self {
        Self::with_address_index(ChildIndex {
            index: 0,
            hardened: false,
        })
    }

    /// `m/44'/60'/0'/0/{address_index}`
    pub fn account(address_index: u32) -> Result<Self, PathError> {
        Ok(Self::with_address_index(ChildIndex::new(
            address_index,
            false,
        )?))
    }

    fn with_address_index(last: ChildIndex) -> Self {
        Self(vec![
            ChildIndex { index: 44, hardened: true },
            ChildIndex { index: 60, hardened: true },
            ChildIndex { index: 0, hardened: true },
            ChildIndex { index: 0, hardened: false },
            last,
        ])
    }

    pub fn steps(&self) -> &[ChildIndex] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self::ethereum()
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    /// Parse "m/44'/60'/0'/0/0"; `'`, `h` and `H` mark hardened steps
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split('/');

        match parts.next() {
            Some("m") | Some("M") => {}
            _ => return Err(PathError::MissingRoot(s.to_string())),
        }

        let mut steps = Vec::new();
        for seg in parts {
            let hardened = seg.ends_with('\'') || seg.ends_with('h') || seg.ends_with('H');
            let digits = if hardened { &seg[..seg.len() - 1] } else { seg };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PathError::InvalidSegment(seg.to_string()));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| PathError::InvalidSegment(seg.to_string()))?;
            steps.push(ChildIndex::new(index, hardened)?);
        }

        Ok(Self(steps))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for step in &self.0 {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}
