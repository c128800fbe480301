//! The crypto base wraps the algorithms used for encryption and decryption (both
//! symmetric and asymmetric) as well as signing and hashing of data.
//!
//! Specific algorithms are wrapped in descriptive interfaces so the envelope
//! layer never has to know which RSA padding or which AES width is in play.
//! [SymmetricKey] is an enum over key sizes, [AsymmetricKey] hides the RSA
//! details behind encrypt/decrypt/sign/verify.

use rand::{rngs::OsRng, RngCore, SeedableRng};

mod asymmetric_key;
mod hash;
mod symmetric_key;

pub use asymmetric_key::*;
pub use hash::*;
pub use symmetric_key::*;

/// Default modulus size for freshly generated keypairs.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Default symmetric key size (AES-256).
pub const DEFAULT_SYMMETRIC_BITS: usize = 256;

/// How many PBKDF2 rounds to use when the caller doesn't have an opinion.
pub const PBKDF2_DEFAULT_ITERATIONS: u32 = 1000;

/// The shortest salt we'll accept for password-based key derivation.
pub const PBKDF2_MIN_SALT_LEN: usize = 8;

/// Length of the random nonce prepended to every symmetric ciphertext.
pub const GCM_NONCE_LEN: usize = 16;

/// Length of the authentication tag appended to every symmetric ciphertext.
pub const GCM_TAG_LEN: usize = 16;

/// Length of the PSS salt drawn from the randomness source when signing.
pub const PSS_SALT_LEN: usize = 32;

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random bytes. Use this if
/// you want a nice, strong random number generator, you don't want to wire one up yourself, and
/// your platform provides good entropy.
///
/// This can be used as an input to any function here that accepts `&mut rng`. Otherwise, you can
/// bring your own RNG that implements [`RngCore`] and [`rand::CryptoRng`].
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}
