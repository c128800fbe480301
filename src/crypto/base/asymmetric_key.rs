use crate::{
    address::Address,
    crypto::base::PSS_SALT_LEN,
    error::{Error, Result},
    util::ser::{hex_decode, hex_encode},
};
use rand::{CryptoRng, RngCore};
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey},
    traits::PublicKeyParts,
    Oaep, Pss, RsaPrivateKey, RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Bytes of padding overhead OAEP (with SHA-1) takes out of every block.
const OAEP_SHA1_OVERHEAD: usize = 2 * 20 + 2;

/// An asymmetric keypair, used both for wrapping envelope keys (OAEP) and for
/// signing (PSS). The secret half is optional: peers' keys are public-only.
///
/// The secret half never gets serialized into anything that leaves this
/// process except through [AsymmetricKey::export_private].
#[derive(Clone, PartialEq)]
pub enum AsymmetricKey {
    /// RSA. OAEP uses SHA-1 for the label hash and MGF1, PSS uses SHA-256 with
    /// a 32-byte salt.
    Rsa {
        /// The public key
        public: RsaPublicKey,
        /// The private key, if we have it
        secret: Option<RsaPrivateKey>,
    },
}

impl AsymmetricKey {
    /// Create a new RSA keypair with the given modulus size.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<Self> {
        let secret = RsaPrivateKey::new(rng, bits).map_err(|_| Error::KeygenFailed)?;
        Ok(Self::from_private(secret))
    }

    fn from_private(secret: RsaPrivateKey) -> Self {
        Self::Rsa {
            public: secret.to_public_key(),
            secret: Some(secret),
        }
    }

    /// Import a private key from PEM. Both PKCS#1 (`BEGIN RSA PRIVATE KEY`)
    /// and PKCS#8 (`BEGIN PRIVATE KEY`) are accepted.
    pub fn import_private(pem: &str) -> Result<Self> {
        let secret = match RsaPrivateKey::from_pkcs1_pem(pem) {
            Ok(secret) => secret,
            Err(pkcs1_err) => RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|pkcs8_err| Error::KeyImportFailed(format!("pkcs1: {}, pkcs8: {}", pkcs1_err, pkcs8_err)))?,
        };
        Ok(Self::from_private(secret))
    }

    /// Export the private key as PKCS#1 PEM. Fails on a public-only key.
    pub fn export_private(&self) -> Result<Zeroizing<String>> {
        match self {
            Self::Rsa { secret: Some(secret), .. } => secret.to_pkcs1_pem(LineEnding::LF).map_err(|_| Error::KeyExportFailed),
            Self::Rsa { secret: None, .. } => Err(Error::CryptoKeyMissing),
        }
    }

    /// Import a public key from DER `SubjectPublicKeyInfo` bytes.
    pub fn import_public_der(der: &[u8]) -> Result<Self> {
        let public = RsaPublicKey::from_public_key_der(der).map_err(|e| Error::KeyImportFailed(e.to_string()))?;
        Ok(Self::Rsa { public, secret: None })
    }

    /// Import a public key from hex-encoded DER, which is how public keys
    /// travel inside message bodies.
    pub fn import_public_hex(hex: &str) -> Result<Self> {
        let der = hex_decode(hex).map_err(|e| Error::KeyImportFailed(e.to_string()))?;
        Self::import_public_der(&der)
    }

    /// Strip the secret half, if any.
    pub fn public_only(&self) -> Self {
        match self {
            Self::Rsa { public, .. } => Self::Rsa {
                public: public.clone(),
                secret: None,
            },
        }
    }

    /// Whether we hold the secret half.
    pub fn has_private(&self) -> bool {
        match self {
            Self::Rsa { secret, .. } => secret.is_some(),
        }
    }

    /// The public half.
    pub fn public_key(&self) -> &RsaPublicKey {
        match self {
            Self::Rsa { public, .. } => public,
        }
    }

    /// DER `SubjectPublicKeyInfo` of the public half. Addresses are derived
    /// from exactly these bytes.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let doc = self.public_key().to_public_key_der().map_err(|_| Error::KeyExportFailed)?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Lowercase hex of [public_key_der][AsymmetricKey::public_key_der].
    pub fn public_key_hex(&self) -> Result<String> {
        Ok(hex_encode(self.public_key_der()?))
    }

    /// The address this key is known by.
    pub fn address(&self) -> Result<Address> {
        Ok(Address::derive(&self.public_key_der()?))
    }

    /// Modulus size in bytes.
    pub fn size(&self) -> usize {
        self.public_key().size()
    }

    /// The largest payload [encrypt][AsymmetricKey::encrypt] accepts.
    pub fn max_encrypt_len(&self) -> usize {
        self.size().saturating_sub(OAEP_SHA1_OVERHEAD)
    }

    /// OAEP-encrypt a (small) payload to this key.
    pub fn encrypt<R: RngCore + CryptoRng>(&self, rng: &mut R, data: &[u8]) -> Result<Vec<u8>> {
        let max = self.max_encrypt_len();
        if data.len() > max {
            Err(Error::CryptoPayloadTooLarge { size: data.len(), max })?;
        }
        self.public_key()
            .encrypt(rng, Oaep::new::<Sha1>(), data)
            .map_err(|_| Error::CryptoEncryptionFailed)
    }

    /// OAEP-decrypt with the secret half.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa { secret: Some(secret), .. } => secret
                .decrypt(Oaep::new::<Sha1>(), data)
                .map_err(|_| Error::CryptoDecryptionFailed),
            Self::Rsa { secret: None, .. } => Err(Error::CryptoKeyMissing),
        }
    }

    /// PSS-sign the SHA-256 of a message. The salt and blinding factor come
    /// from `rng`.
    pub fn sign<R: RngCore + CryptoRng>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa { secret: Some(secret), .. } => {
                let digest = Sha256::digest(message);
                secret
                    .sign_with_rng(rng, Pss::new_with_salt::<Sha256>(PSS_SALT_LEN), digest.as_slice())
                    .map_err(|_| Error::CryptoSignatureFailed)
            }
            Self::Rsa { secret: None, .. } => Err(Error::CryptoKeyMissing),
        }
    }

    /// Check a signature. Malformed signatures are just `false`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(message);
        self.public_key()
            .verify(Pss::new_with_salt::<Sha256>(PSS_SALT_LEN), digest.as_slice(), signature)
            .is_ok()
    }
}

impl std::fmt::Debug for AsymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { public, secret } => f
                .debug_struct("Rsa")
                .field("bits", &(public.size() * 8))
                .field("secret", &secret.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}
