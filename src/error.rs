//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while encoding, encrypting, signing, or opening
//! envelopes.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// An address string isn't valid base58, has the wrong length, the wrong
    /// prefix, or a bad checksum.
    #[error("address is invalid")]
    AddressInvalid,

    /// A public key was presented for an address it does not derive.
    #[error("public key does not match the claimed address {0}")]
    AddressMismatch(String),

    /// An attachment's hashes or container signature don't check out.
    #[error("attachment failed verification")]
    AttachmentVerificationFailed,

    /// Bad length on some data (generally a slice -> array conversion)
    #[error("bad length")]
    BadLength,

    /// An AEAD tag did not verify: the ciphertext was tampered with, or the
    /// wrong key was used. No plaintext is ever returned in this case.
    #[error("authenticated decryption failed")]
    CryptoAuthenticationFailed,

    /// Bad key size given for a symmetric key.
    #[error("unsupported symmetric key size: {0} bits")]
    CryptoBadKeySize(usize),

    /// Bad salt given to a cryptographic function.
    #[error("incorrect salt given for kdf")]
    CryptoBadSalt,

    /// Asymmetric (OAEP) decryption failed on padding or format.
    #[error("asymmetric decryption failed")]
    CryptoDecryptionFailed,

    /// Asymmetric encryption failed for a reason other than size.
    #[error("asymmetric encryption failed")]
    CryptoEncryptionFailed,

    /// Could not generate key from password
    #[error("key derivation from password failed")]
    CryptoKDFFailed,

    /// A private key is missing from a crypto operation
    #[error("crypto key missing")]
    CryptoKeyMissing,

    /// The data handed to asymmetric encryption exceeds what the modulus can
    /// hold after padding.
    #[error("payload of {size} bytes exceeds the {max} byte limit for this key")]
    CryptoPayloadTooLarge {
        /// How big the payload was
        size: usize,
        /// The largest payload this key accepts
        max: usize,
    },

    /// Failed to produce a signature
    #[error("failed to create a signature")]
    CryptoSignatureFailed,

    /// An error while decoding raw msgpack bytes.
    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// A date string isn't a valid ISO-8601 `YYYY-MM-DD` calendar date.
    #[error("invalid date: {0}")]
    EncodingBadDate(String),

    /// The same record field or mapping key showed up more than once.
    #[error("duplicate field or key: {0}")]
    EncodingDuplicate(String),

    /// A record is missing a field its type requires.
    #[error("{record}: missing field {field}")]
    EncodingMissingField {
        /// The record being decoded
        record: &'static str,
        /// The missing field
        field: &'static str,
    },

    /// Decoding found a different wire type than the target type declares.
    #[error("type mismatch: expected {expected}, found {found}")]
    EncodingTypeMismatch {
        /// What the target type wanted
        expected: &'static str,
        /// What was actually on the wire
        found: String,
    },

    /// Data was left over after decoding a complete value.
    #[error("trailing bytes after value")]
    EncodingTrailingBytes,

    /// A record carries a field its type does not declare.
    #[error("{record}: unknown field {field}")]
    EncodingUnknownField {
        /// The record being decoded
        record: &'static str,
        /// The unexpected field
        field: String,
    },

    /// An enumeration name doesn't match any variant.
    #[error("{enumeration}: unknown variant {variant}")]
    EncodingUnknownVariant {
        /// The enumeration being decoded
        enumeration: &'static str,
        /// The unknown name
        variant: String,
    },

    /// The same address was named as a recipient more than once.
    #[error("recipient {0} appears more than once")]
    EnvelopeDuplicateRecipient(String),

    /// We're trying to decrypt a private envelope that has no ACL entry for
    /// our address.
    #[error("address {0} is not a recipient of this envelope")]
    EnvelopeNotARecipient(String),

    /// Opening an envelope failed. This deliberately does not say *why*, so a
    /// sender can't learn anything by watching which step failed.
    #[error("failed to open envelope")]
    EnvelopeOpenFailed,

    /// We tried to seal an envelope for an address we have no public key for.
    #[error("no public key known for recipient {0}")]
    EnvelopeUnknownRecipient(String),

    /// Importing a key failed.
    #[error("key import failed: {0}")]
    KeyImportFailed(String),

    /// Exporting a key failed.
    #[error("key export failed")]
    KeyExportFailed,

    /// Keygen failed
    #[error("keygen failed")]
    KeygenFailed,

    /// An error while engaging in msgpack serialization.
    #[error("msgpack serialization error: {0}")]
    SerializeMsgPack(String),

    /// An error while engaging in yaml serialization.
    #[error("yaml serialization error")]
    SerializeYaml(#[from] serde_yaml::Error),

    /// A body type tag with no registered body shape.
    #[error("unknown body type: {0}")]
    UnknownBodyType(String),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // serde_yaml::Error is not eq-able, so we compare the rendered debug
        // output. good enough for tests, which is where this gets used.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
