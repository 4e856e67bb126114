//! BIP39 seed derivation.
//!
//! seed = PBKDF2-HMAC-SHA512(NFKD(mnemonic), "mnemonic" || NFKD(passphrase), 2048)

use pbkdf2::pbkdf2_hmac;
use qnet_types::constants::SEED_SIZE;
use qnet_types::Mnemonic;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const SEED_ITERATIONS: u32 = 2048;
const SALT_PREFIX: &str = "mnemonic";

/// A 64-byte BIP39 seed. Wiped on drop; never cloned or printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_SIZE]);

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }
}

/// Derive the seed for a validated mnemonic and optional passphrase.
pub fn to_seed(mnemonic: &Mnemonic, passphrase: &str) -> Seed {
    phrase_to_seed(mnemonic.phrase(), passphrase)
}

/// Derive the seed from a raw phrase. No dictionary or checksum checks.
pub fn phrase_to_seed(phrase: &str, passphrase: &str) -> Seed {
    let password: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
    let salt: Zeroizing<String> =
        Zeroizing::new(format!("{}{}", SALT_PREFIX, passphrase.nfkd().collect::<String>()));

    let mut out = [0u8; SEED_SIZE];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), SEED_ITERATIONS, &mut out);
    Seed(out)
}
