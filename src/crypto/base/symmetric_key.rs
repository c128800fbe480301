use crate::{
    crypto::base::{GCM_NONCE_LEN, GCM_TAG_LEN, PBKDF2_MIN_SALT_LEN},
    error::{Error, Result},
    util::ser::BinarySecret,
};
use aes_gcm::{
    aead::{consts::U16, Aead, AeadCore, KeyInit, Nonce},
    aes::{Aes128, Aes192, Aes256},
    AesGcm,
};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

type Aes128Gcm16 = AesGcm<Aes128, U16>;
type Aes192Gcm16 = AesGcm<Aes192, U16>;
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// A symmetric encryption key.
///
/// All variants are AES-GCM with a 16-byte nonce and a 16-byte tag, and all of
/// them produce ciphertext blobs laid out as `nonce || ciphertext || tag`, so
/// a blob carries everything needed to open it except the key.
#[derive(Debug, Clone)]
pub enum SymmetricKey {
    /// AES-128-GCM
    Aes128Gcm(BinarySecret<16>),
    /// AES-192-GCM
    Aes192Gcm(BinarySecret<24>),
    /// AES-256-GCM
    Aes256Gcm(BinarySecret<32>),
}

impl SymmetricKey {
    /// Create a new random key. `bits` must be one of 128, 192, or 256.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<Self> {
        let mut randbuf = [0u8; 32];
        let len = Self::byte_len(bits)?;
        rng.fill_bytes(&mut randbuf[0..len]);
        let key = Self::from_bytes(&randbuf[0..len]);
        randbuf.zeroize();
        key
    }

    /// Rebuild a key from its raw bytes. The key size is implied by the
    /// length (16, 24, or 32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = match bytes.len() {
            16 => Self::Aes128Gcm(BinarySecret::new(bytes.try_into().map_err(|_| Error::BadLength)?)),
            24 => Self::Aes192Gcm(BinarySecret::new(bytes.try_into().map_err(|_| Error::BadLength)?)),
            32 => Self::Aes256Gcm(BinarySecret::new(bytes.try_into().map_err(|_| Error::BadLength)?)),
            len => Err(Error::CryptoBadKeySize(len * 8))?,
        };
        Ok(key)
    }

    /// Derive a key from a password using PBKDF2-HMAC-SHA256.
    ///
    /// The salt has to be at least [PBKDF2_MIN_SALT_LEN] bytes. Store it next
    /// to whatever you encrypt: the same password, salt, and iteration count
    /// always produce the same key.
    pub fn derive_from_password(password: &[u8], salt: &[u8], iterations: u32, bits: usize) -> Result<Self> {
        if salt.len() < PBKDF2_MIN_SALT_LEN {
            Err(Error::CryptoBadSalt)?;
        }
        if iterations == 0 {
            Err(Error::CryptoKDFFailed)?;
        }
        let len = Self::byte_len(bits)?;
        let mut derived = [0u8; 32];
        pbkdf2::pbkdf2::<hmac::Hmac<Sha256>>(password, salt, iterations, &mut derived[0..len])
            .map_err(|_| Error::CryptoKDFFailed)?;
        let key = Self::from_bytes(&derived[0..len]);
        derived.zeroize();
        key
    }

    fn byte_len(bits: usize) -> Result<usize> {
        match bits {
            128 | 192 | 256 => Ok(bits / 8),
            _ => Err(Error::CryptoBadKeySize(bits)),
        }
    }

    /// The key size in bits.
    pub fn bits(&self) -> usize {
        self.as_bytes().len() * 8
    }

    /// The raw key bytes. This is what gets wrapped for each recipient of an
    /// envelope, so handle with care.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Aes128Gcm(key) => key.expose_secret(),
            Self::Aes192Gcm(key) => key.expose_secret(),
            Self::Aes256Gcm(key) => key.expose_secret(),
        }
    }

    /// Encrypt a value with a fresh random nonce.
    pub fn encrypt<R: RngCore + CryptoRng>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; GCM_NONCE_LEN];
        rng.fill_bytes(&mut nonce);
        self.encrypt_with_nonce(&nonce, plaintext)
    }

    /// Encrypt a value with a caller-chosen nonce. Never reuse a nonce under
    /// the same key; this mostly exists for reproducing test vectors.
    pub fn encrypt_with_nonce(&self, nonce: &[u8; GCM_NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
        let sealed = match self {
            Self::Aes128Gcm(key) => seal::<Aes128Gcm16>(key.expose_secret(), nonce, plaintext),
            Self::Aes192Gcm(key) => seal::<Aes192Gcm16>(key.expose_secret(), nonce, plaintext),
            Self::Aes256Gcm(key) => seal::<Aes256Gcm16>(key.expose_secret(), nonce, plaintext),
        }?;
        let mut blob = Vec::with_capacity(GCM_NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce[..]);
        blob.extend_from_slice(&sealed[..]);
        Ok(blob)
    }

    /// Decrypt a `nonce || ciphertext || tag` blob. Any tampering (or the wrong
    /// key) fails with [Error::CryptoAuthenticationFailed] and returns nothing.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < GCM_NONCE_LEN + GCM_TAG_LEN {
            Err(Error::CryptoAuthenticationFailed)?;
        }
        let (nonce, sealed) = blob.split_at(GCM_NONCE_LEN);
        match self {
            Self::Aes128Gcm(key) => open::<Aes128Gcm16>(key.expose_secret(), nonce, sealed),
            Self::Aes192Gcm(key) => open::<Aes192Gcm16>(key.expose_secret(), nonce, sealed),
            Self::Aes256Gcm(key) => open::<Aes256Gcm16>(key.expose_secret(), nonce, sealed),
        }
    }
}

fn seal<C>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U16>,
{
    let cipher = C::new_from_slice(key).map_err(|_| Error::CryptoBadKeySize(key.len() * 8))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| Error::CryptoEncryptionFailed)
}

fn open<C>(key: &[u8], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U16>,
{
    let cipher = C::new_from_slice(key).map_err(|_| Error::CryptoBadKeySize(key.len() * 8))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), sealed)
        .map_err(|_| Error::CryptoAuthenticationFailed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        crypto::base::{sha256, PBKDF2_DEFAULT_ITERATIONS},
        util::{
            ser::{hex_decode, hex_encode},
            test::{self, INVITE_REGISTRATION_PACKED_HEX},
        },
    };

    #[test]
    fn symmetric_roundtrip_all_sizes() {
        let mut rng = test::rng();
        for bits in [128, 192, 256] {
            let key = SymmetricKey::generate(&mut rng, bits).unwrap();
            assert_eq!(key.bits(), bits);
            let blob = key.encrypt(&mut rng, b"HI HUNGRY IM DAD").unwrap();
            assert_eq!(blob.len(), GCM_NONCE_LEN + 16 + GCM_TAG_LEN);
            assert_eq!(key.decrypt(&blob).unwrap(), b"HI HUNGRY IM DAD");
            let rebuilt = SymmetricKey::from_bytes(key.as_bytes()).unwrap();
            assert_eq!(rebuilt.decrypt(&blob).unwrap(), b"HI HUNGRY IM DAD");
        }
    }

    #[test]
    fn symmetric_bad_sizes() {
        let mut rng = test::rng();
        assert_eq!(SymmetricKey::generate(&mut rng, 64).err(), Some(Error::CryptoBadKeySize(64)));
        assert_eq!(SymmetricKey::from_bytes(&[0u8; 20]).err(), Some(Error::CryptoBadKeySize(160)));
    }

    #[test]
    fn symmetric_every_flipped_byte_fails() {
        let mut rng = test::rng();
        let key = SymmetricKey::generate(&mut rng, 256).unwrap();
        let blob = key.encrypt(&mut rng, b"get a job").unwrap();
        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x01;
            assert_eq!(key.decrypt(&tampered).err(), Some(Error::CryptoAuthenticationFailed));
        }
    }

    #[test]
    fn symmetric_wrong_key_or_short_blob_fails() {
        let mut rng = test::rng();
        let key1 = SymmetricKey::generate(&mut rng, 256).unwrap();
        let key2 = SymmetricKey::generate(&mut rng, 256).unwrap();
        let blob = key1.encrypt(&mut rng, b"").unwrap();
        assert_eq!(blob.len(), 32);
        assert_eq!(key1.decrypt(&blob).unwrap(), Vec::<u8>::new());
        assert_eq!(key2.decrypt(&blob).err(), Some(Error::CryptoAuthenticationFailed));
        assert_eq!(key1.decrypt(&blob[0..31]).err(), Some(Error::CryptoAuthenticationFailed));
    }

    #[test]
    fn symmetric_reference_vector() {
        let key = SymmetricKey::from_bytes(
            &hex_decode("2ecdf1b6fbc85c51b052ea665a0e946400681d5a7baa69378f9a6275dd236b59").unwrap(),
        )
        .unwrap();
        let plaintext = hex_decode(INVITE_REGISTRATION_PACKED_HEX).unwrap();
        let blob = key.encrypt_with_nonce(&[0u8; GCM_NONCE_LEN], &plaintext).unwrap();
        assert_eq!(&blob[0..16], &[0u8; 16]);
        assert_eq!(hex_encode(&blob[16..24]), "9430a343dc2323e7");
        assert_eq!(
            hex_encode(sha256(&blob)),
            "5d70fb71241e9d65104166ca520e047206ad1303dfa62742a246eadfcf9d7c4b"
        );
        // and the zero rng gives the same nonce
        let blob2 = key.encrypt(&mut test::ZeroRng, &plaintext).unwrap();
        assert_eq!(blob, blob2);
    }

    #[test]
    fn symmetric_password_derivation() {
        let key = SymmetricKey::derive_from_password(b"correct horse", b"NaClNaCl", PBKDF2_DEFAULT_ITERATIONS, 256).unwrap();
        assert_eq!(
            hex_encode(key.as_bytes()),
            "0c5447c8fef936184ff4a7e6050570dc344c4e5a654710f69b4fd7e82508a568"
        );
        let key128 = SymmetricKey::derive_from_password(b"correct horse", b"NaClNaCl", PBKDF2_DEFAULT_ITERATIONS, 128).unwrap();
        assert_eq!(hex_encode(key128.as_bytes()), "0c5447c8fef936184ff4a7e6050570dc");
        assert_eq!(
            SymmetricKey::derive_from_password(b"correct horse", b"NaCl", PBKDF2_DEFAULT_ITERATIONS, 256).err(),
            Some(Error::CryptoBadSalt)
        );
        assert_eq!(
            SymmetricKey::derive_from_password(b"correct horse", b"NaClNaCl", 1000, 100).err(),
            Some(Error::CryptoBadKeySize(100))
        );
    }

    #[test]
    fn symmetric_debug_redacts() {
        let key = SymmetricKey::from_bytes(&[7u8; 16]).unwrap();
        assert_eq!(format!("{:?}", key), "Aes128Gcm(BinarySecret<16>(<redacted>))");
    }
}
