//! BIP39 mnemonic codec: entropy <-> words, checksum validation and seed
//! stretching
//!
//! Uses the English dictionary shipped with the `bip39` crate; the packing,
//! checksum and PBKDF2 steps are done here so each failure maps to its own
//! error kind.

use std::fmt;
use std::str::FromStr;

use bip39::Language;
use evmkey_crypto::hash::{pbkdf2_hmac_sha512, sha256};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// PBKDF2 iteration count fixed by BIP39
const PBKDF2_ROUNDS: u32 = 2048;

const BITS_PER_WORD: usize = 11;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Mnemonic must have 12 or 24 words, got {0}")]
    InvalidWordCount(usize),
    #[error("Word #{position} '{word}' is not in the dictionary")]
    UnknownWord { position: usize, word: String },
    #[error("Mnemonic checksum mismatch")]
    ChecksumMismatch,
    #[error("Entropy must be 16 or 32 bytes, got {0}")]
    InvalidEntropyLength(usize),
}

/// Supported phrase lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum WordCount {
    #[default]
    Twelve,
    TwentyFour,
}

impl WordCount {
    pub fn words(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    pub fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }

    /// `ENT / 32`
    pub fn checksum_bits(self) -> usize {
        self.entropy_bytes() * 8 / 32
    }

    fn from_entropy_len(len: usize) -> Result<Self, MnemonicError> {
        match len {
            16 => Ok(WordCount::Twelve),
            32 => Ok(WordCount::TwentyFour),
            other => Err(MnemonicError::InvalidEntropyLength(other)),
        }
    }
}

impl TryFrom<usize> for WordCount {
    type Error = MnemonicError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        match count {
            12 => Ok(WordCount::Twelve),
            24 => Ok(WordCount::TwentyFour),
            other => Err(MnemonicError::InvalidWordCount(other)),
        }
    }
}

impl From<WordCount> for usize {
    fn from(count: WordCount) -> usize {
        count.words()
    }
}

/// 64-byte BIP39 seed. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// A validated 12- or 24-word phrase (normalized, lowercase). Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MnemonicPhrase {
    words: Vec<String>,
}

impl MnemonicPhrase {
    /// Parse and validate user input. Whitespace runs collapse and words are
    /// NFKD-normalized and lowercased before lookup.
    pub fn parse(input: &str) -> Result<Self, MnemonicError> {
        let words: Vec<String> = input
            .split_whitespace()
            .map(|w| w.nfkd().collect::<String>().to_lowercase())
            .collect();
        let phrase = Self { words };
        phrase.entropy()?;
        Ok(phrase)
    }

    /// Build from an explicit word list (e.g. one word per input field)
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self, MnemonicError> {
        let joined = Zeroizing::new(
            words
                .iter()
                .map(|w| w.as_ref())
                .collect::<Vec<_>>()
                .join(" "),
        );
        Self::parse(&joined)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> WordCount {
        // Length was checked when the phrase was built.
        if self.words.len() == 24 {
            WordCount::TwentyFour
        } else {
            WordCount::Twelve
        }
    }

    /// Words joined by single spaces
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.words.join(" "))
    }

    /// Recover the entropy this phrase encodes
    pub fn entropy(&self) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
        let count = WordCount::try_from(self.words.len())?;

        let mut indices = Zeroizing::new(Vec::with_capacity(self.words.len()));
        for (i, word) in self.words.iter().enumerate() {
            let index = word_index(word).ok_or_else(|| MnemonicError::UnknownWord {
                position: i + 1,
                word: word.clone(),
            })?;
            indices.push(index);
        }

        // 132 or 264 bits -> 17 or 33 bytes
        let total_bits = indices.len() * BITS_PER_WORD;
        let mut packed = Zeroizing::new(vec![0u8; (total_bits + 7) / 8]);
        for (w, &index) in indices.iter().enumerate() {
            for b in 0..BITS_PER_WORD {
                if index & (1 << (BITS_PER_WORD - 1 - b)) != 0 {
                    let bit = w * BITS_PER_WORD + b;
                    packed[bit / 8] |= 0x80 >> (bit % 8);
                }
            }
        }

        let ent_bytes = count.entropy_bytes();
        let cs_bits = count.checksum_bits();
        let entropy = Zeroizing::new(packed[..ent_bytes].to_vec());

        let expected = sha256(&entropy)[0] >> (8 - cs_bits);
        let actual = packed[ent_bytes] >> (8 - cs_bits);
        if expected != actual {
            return Err(MnemonicError::ChecksumMismatch);
        }

        Ok(entropy)
    }

    /// Stretch into the 64-byte seed (PBKDF2-HMAC-SHA512, 2048 rounds,
    /// salt "mnemonic" + passphrase, both NFKD-normalized)
    pub fn to_seed(&self, passphrase: &str) -> Seed {
        let password = Zeroizing::new(self.phrase().nfkd().collect::<String>());
        let salt = Zeroizing::new(format!("mnemonic{}", passphrase.nfkd().collect::<String>()));
        Seed(pbkdf2_hmac_sha512(
            password.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
        ))
    }
}

impl FromStr for MnemonicPhrase {
    type Err = MnemonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MnemonicPhrase(<{} words>)", self.words.len())
    }
}

fn word_index(word: &str) -> Option<u16> {
    // The English list is sorted, so a binary search finds the index.
    Language::English
        .word_list()
        .binary_search(&word)
        .ok()
        .map(|i| i as u16)
}

/// Encode 16 or 32 bytes of entropy as a phrase
pub fn from_entropy(entropy: &[u8]) -> Result<MnemonicPhrase, MnemonicError> {
    let count = WordCount::from_entropy_len(entropy.len())?;
    Ok(encode_words(entropy, count))
}

fn encode_words(entropy: &[u8], count: WordCount) -> MnemonicPhrase {
    let dictionary = Language::English.word_list();

    // entropy || first byte of SHA-256(entropy); only the top ENT/32 bits of
    // the extra byte are read.
    let mut bits = Zeroizing::new(Vec::with_capacity(entropy.len() + 1));
    bits.extend_from_slice(entropy);
    bits.push(sha256(entropy)[0]);

    let words = (0..count.words())
        .map(|w| {
            let mut index = 0usize;
            for b in 0..BITS_PER_WORD {
                let bit = w * BITS_PER_WORD + b;
                let set = bits[bit / 8] & (0x80 >> (bit % 8)) != 0;
                index = (index << 1) | set as usize;
            }
            dictionary[index].to_string()
        })
        .collect();

    MnemonicPhrase { words }
}

/// Fresh entropy from the OS CSPRNG and its phrase
pub fn generate(count: WordCount) -> (Zeroizing<Vec<u8>>, MnemonicPhrase) {
    generate_with(&mut OsRng, count)
}

/// Same as [`generate`] with a caller-supplied RNG
pub fn generate_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    count: WordCount,
) -> (Zeroizing<Vec<u8>>, MnemonicPhrase) {
    let mut entropy = Zeroizing::new(vec![0u8; count.entropy_bytes()]);
    rng.fill_bytes(&mut entropy);
    let phrase = encode_words(&entropy, count);
    (entropy, phrase)
}

/// Check word count, dictionary membership and checksum
pub fn validate(input: &str) -> Result<(), MnemonicError> {
    MnemonicPhrase::parse(input).map(|_| ())
}

pub fn is_valid(input: &str) -> bool {
    validate(input).is_ok()
}

/// Entropy encoded by a valid phrase
pub fn to_entropy(input: &str) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    MnemonicPhrase::parse(input)?.entropy()
}

/// Seed for `phrase` under `passphrase` (empty string for none)
pub fn to_seed(phrase: &MnemonicPhrase, passphrase: &str) -> Seed {
    phrase.to_seed(passphrase)
}
