//! Bitcoin/Solana Base58 encoding/decoding.
//!
//! Unlike block-based Base58 variants, this treats the whole input as one
//! big-endian integer and repeatedly divides by 58. Each leading zero byte
//! is carried through as a leading `'1'` character, so the encoding is an
//! exact inverse for every byte string, including zero-prefixed ones.

use thiserror::Error;

/// Base58 alphabet (Bitcoin / Solana).
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Character standing in for a leading zero byte.
const ZERO_CHAR: u8 = ALPHABET[0];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Base58Error {
    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("decoded length {actual} does not match expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Build reverse alphabet lookup table at compile time.
const fn build_reverse_alphabet() -> [u8; 128] {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 58 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static REVERSE_ALPHABET: [u8; 128] = build_reverse_alphabet();

/// Encode binary data to Base58.
pub fn encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|&&b| b == 0).count();

    // Base58 digits, least significant first. log(256)/log(58) ≈ 1.366.
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for &byte in &data[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut result = Vec::with_capacity(zeros + digits.len());
    result.resize(zeros, ZERO_CHAR);
    result.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize]));

    // SAFETY: all bytes are valid ASCII from ALPHABET
    unsafe { String::from_utf8_unchecked(result) }
}

/// Decode a Base58 string to binary data.
pub fn decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
    let bytes = encoded.as_bytes();
    let zeros = bytes.iter().take_while(|&&c| c == ZERO_CHAR).count();

    // Base-256 digits, least significant first.
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len() * 733 / 1000 + 1);
    for (i, &ch) in bytes.iter().enumerate().skip(zeros) {
        let value = if ch < 128 { REVERSE_ALPHABET[ch as usize] } else { 0xFF };
        if value == 0xFF {
            // Report the full char, not the UTF-8 byte.
            let c = encoded[i..].chars().next().unwrap_or(ch as char);
            return Err(Base58Error::InvalidCharacter(c, i));
        }

        let mut carry = value as u32;
        for byte in out.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            out.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut result = vec![0u8; zeros];
    result.extend(out.iter().rev());
    Ok(result)
}

/// Decode a Base58 string that must hold exactly `N` bytes.
pub fn decode_array<const N: usize>(encoded: &str) -> Result<[u8; N], Base58Error> {
    let decoded = decode(encoded)?;
    if decoded.len() != N {
        return Err(Base58Error::InvalidLength {
            expected: N,
            actual: decoded.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&decoded);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_roundtrip() {
        let data = vec![0u8; 32];
        let encoded = encode(&data);
        assert_eq!(encoded, "1".repeat(32));
        assert_eq!(decode(&encoded).unwrap(), data);

        let data = (0..64u8).collect::<Vec<_>>();
        let encoded = encode(&data);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_every_length_with_zero_prefixes() {
        for len in 0..=64usize {
            for zeros in [0usize, 1, 3] {
                let zeros = zeros.min(len);
                let mut data = vec![0u8; zeros];
                data.extend((zeros..len).map(|i| (i as u8).wrapping_mul(37).wrapping_add(11)));
                let encoded = encode(&data);
                assert_eq!(decode(&encoded).unwrap(), data, "len {} zeros {}", len, zeros);
            }
        }
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(b"Hello World!"), "2NEpo7TZRRrLZSi2U");
        assert_eq!(encode(&[0x00, 0x00, 0x28, 0x7f, 0xb4, 0xcd]), "11233QC4");
        assert_eq!(encode(&[0x61]), "2g");
        assert_eq!(encode(&[0x00]), "1");
        assert_eq!(decode("2NEpo7TZRRrLZSi2U").unwrap(), b"Hello World!");
    }

    #[test]
    fn test_base58_empty() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(decode("abc0"), Err(Base58Error::InvalidCharacter('0', 3)));
        assert_eq!(decode("Il"), Err(Base58Error::InvalidCharacter('I', 0)));
        assert!(matches!(decode("2gé"), Err(Base58Error::InvalidCharacter('é', 2))));
    }

    #[test]
    fn test_decode_array_length() {
        let key = [7u8; 32];
        let encoded = encode(&key);
        assert_eq!(decode_array::<32>(&encoded).unwrap(), key);
        assert_eq!(
            decode_array::<32>("2g"),
            Err(Base58Error::InvalidLength { expected: 32, actual: 1 })
        );
    }
}
