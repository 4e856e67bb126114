//! BIP39 mnemonic generation and validation.
//!
//! 12/15/18/21/24 words drawn from the 2048-word English dictionary. Each
//! word carries 11 bits; the last `ENT/32` bits of the sequence are the
//! leading bits of `SHA-256(entropy)`, so a phrase with a single wrong word
//! fails the checksum even when every word is in the dictionary.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Number of words in the dictionary.
const WORD_LIST_SIZE: usize = 2048;

/// Bits encoded by each word.
const BITS_PER_WORD: usize = 11;

/// Default entropy for a new wallet.
pub const DEFAULT_ENTROPY_BITS: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("expected 12, 15, 18, 21 or 24 words, got {0}")]
    WrongWordCount(usize),

    #[error("unknown word \"{word}\" at position {position}")]
    UnknownWord { word: String, position: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("unsupported entropy size: {0} bits (use 128, 160, 192, 224 or 256)")]
    UnsupportedEntropy(usize),

    #[error("secure random source unavailable: {0}")]
    Entropy(String),
}

/// Supported phrase lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordCount {
    /// 12 words (128-bit entropy)
    Twelve = 12,
    /// 15 words (160-bit entropy)
    Fifteen = 15,
    /// 18 words (192-bit entropy)
    Eighteen = 18,
    /// 21 words (224-bit entropy)
    TwentyOne = 21,
    /// 24 words (256-bit entropy)
    TwentyFour = 24,
}

impl WordCount {
    pub const ALL: [WordCount; 5] = [
        WordCount::Twelve,
        WordCount::Fifteen,
        WordCount::Eighteen,
        WordCount::TwentyOne,
        WordCount::TwentyFour,
    ];

    /// Entropy bytes behind this many words.
    #[inline]
    pub const fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::Fifteen => 20,
            WordCount::Eighteen => 24,
            WordCount::TwentyOne => 28,
            WordCount::TwentyFour => 32,
        }
    }

    #[inline]
    pub const fn entropy_bits(self) -> usize {
        self.entropy_bytes() * 8
    }

    #[inline]
    pub const fn checksum_bits(self) -> usize {
        self.entropy_bits() / 32
    }

    pub fn from_words(count: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| *w as usize == count)
    }

    pub fn from_entropy_bits(bits: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.entropy_bits() == bits)
    }
}

/// The BIP39 English dictionary.
pub fn wordlist() -> &'static [&'static str; WORD_LIST_SIZE] {
    bip39::Language::English.word_list()
}

/// Index of a word in the dictionary (the list is sorted).
fn find_word(word: &str) -> Option<usize> {
    wordlist().binary_search(&word).ok()
}

/// Whether `word` is in the dictionary.
pub fn is_valid_word(word: &str) -> bool {
    find_word(&word.to_lowercase()).is_some()
}

/// A validated BIP39 phrase.
///
/// The phrase is overwritten on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    phrase: String,
    #[zeroize(skip)]
    word_count: WordCount,
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &(self.word_count as usize))
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

impl Mnemonic {
    /// Generate a fresh phrase from the OS random source.
    pub fn generate(word_count: WordCount) -> Result<Self, MnemonicError> {
        let size = word_count.entropy_bytes();
        let mut entropy = [0u8; 32];
        let filled = OsRng.try_fill_bytes(&mut entropy[..size]);
        let result = filled
            .map_err(|e| MnemonicError::Entropy(e.to_string()))
            .and_then(|_| entropy_to_mnemonic(&entropy[..size]));
        entropy.zeroize();
        result
    }

    /// Parse and fully validate a phrase: word count, dictionary, checksum.
    ///
    /// Whitespace and letter case are normalised.
    pub fn parse(phrase: &str) -> Result<Self, MnemonicError> {
        let lowered = Zeroizing::new(phrase.to_lowercase());
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let word_count =
            WordCount::from_words(words.len()).ok_or(MnemonicError::WrongWordCount(words.len()))?;

        let mut indices = Vec::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let idx = find_word(word).ok_or_else(|| MnemonicError::UnknownWord {
                word: word.to_string(),
                position: i + 1,
            })?;
            indices.push(idx as u16);
        }

        indices_to_entropy(&indices, word_count)?;

        Ok(Self {
            phrase: words.join(" "),
            word_count,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> Vec<&str> {
        self.phrase.split_whitespace().collect()
    }

    pub fn word_count(&self) -> usize {
        self.word_count as usize
    }

    pub fn entropy_bits(&self) -> usize {
        self.word_count.entropy_bits()
    }

    /// Recover the entropy this phrase encodes.
    pub fn to_entropy(&self) -> Zeroizing<Vec<u8>> {
        let indices: Vec<u16> = self
            .phrase
            .split_whitespace()
            .filter_map(|w| find_word(w).map(|i| i as u16))
            .collect();
        // The phrase was validated on construction.
        indices_to_entropy(&indices, self.word_count).unwrap_or_else(|_| Zeroizing::new(Vec::new()))
    }
}

impl PartialEq for Mnemonic {
    fn eq(&self, other: &Self) -> bool {
        self.phrase == other.phrase
    }
}

impl Eq for Mnemonic {}

impl std::str::FromStr for Mnemonic {
    type Err = MnemonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Generate a phrase with `entropy_bits` of entropy (128 gives 12 words).
pub fn generate(entropy_bits: usize) -> Result<Mnemonic, MnemonicError> {
    let word_count = WordCount::from_entropy_bits(entropy_bits)
        .ok_or(MnemonicError::UnsupportedEntropy(entropy_bits))?;
    Mnemonic::generate(word_count)
}

/// Validate a phrase without keeping it.
pub fn validate(phrase: &str) -> bool {
    Mnemonic::parse(phrase).is_ok()
}

/// Deterministic phrase for the given entropy (16, 20, 24, 28 or 32 bytes).
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<Mnemonic, MnemonicError> {
    let word_count = WordCount::from_entropy_bits(entropy.len() * 8)
        .ok_or(MnemonicError::UnsupportedEntropy(entropy.len() * 8))?;

    // entropy || first checksum byte; at most 8 checksum bits are used.
    let mut bits = Zeroizing::new(Vec::with_capacity(entropy.len() + 1));
    bits.extend_from_slice(entropy);
    bits.push(Sha256::digest(entropy)[0]);

    let list = wordlist();
    let words: Vec<&str> = (0..word_count as usize)
        .map(|i| list[read_bits(&bits, i * BITS_PER_WORD, BITS_PER_WORD)])
        .collect();

    Ok(Mnemonic {
        phrase: words.join(" "),
        word_count,
    })
}

/// Read `count` bits starting at bit `offset` (MSB first).
fn read_bits(data: &[u8], offset: usize, count: usize) -> usize {
    let mut value = 0usize;
    for bit in offset..offset + count {
        let b = (data[bit / 8] >> (7 - (bit % 8))) & 1;
        value = (value << 1) | b as usize;
    }
    value
}

/// Rebuild entropy from word indices and verify the checksum bits.
fn indices_to_entropy(
    indices: &[u16],
    word_count: WordCount,
) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    let total_bits = indices.len() * BITS_PER_WORD;
    let mut bits = Zeroizing::new(vec![0u8; (total_bits + 7) / 8]);
    for (i, &idx) in indices.iter().enumerate() {
        for j in 0..BITS_PER_WORD {
            if (idx >> (BITS_PER_WORD - 1 - j)) & 1 == 1 {
                let bit = i * BITS_PER_WORD + j;
                bits[bit / 8] |= 1 << (7 - (bit % 8));
            }
        }
    }

    let ent_bytes = word_count.entropy_bytes();
    let cs_bits = word_count.checksum_bits();
    let entropy = Zeroizing::new(bits[..ent_bytes].to_vec());

    let provided = read_bits(&bits, ent_bytes * 8, cs_bits) as u8;
    let expected = Sha256::digest(&entropy[..])[0] >> (8 - cs_bits);
    if provided != expected {
        return Err(MnemonicError::ChecksumMismatch);
    }

    Ok(entropy)
}
