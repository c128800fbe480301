//! Helpful serialization tools.
//!
//! The canonical wire format lives in [crate::canonical]. What's here are the
//! byte containers that format distinguishes from text, plus hex helpers for
//! the places where binary needs to be read by humans (public keys travel as
//! hex, and YAML dumps of envelopes show bytes as hex).

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Deref, DerefMut};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Convert bytes to lowercase hex
pub fn hex_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode(bytes.as_ref())
}

/// Convert hex (either case) to bytes
pub fn hex_decode<T: AsRef<[u8]>>(hex_str: T) -> Result<Vec<u8>> {
    hex::decode(hex_str.as_ref()).map_err(|e| Error::Deserialize(format!("bad hex: {}", e)))
}

pub(crate) mod human_bytes {
    use super::{hex_decode, hex_encode};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex_encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            hex_decode(s).map_err(de::Error::custom)
        } else {
            <Vec<u8>>::deserialize(deserializer)
        }
    }
}

/// A fixed-length byte string. Encodes as binary (never as text or a list of
/// integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binary<const N: usize>([u8; N]);

impl<const N: usize> Binary<N> {
    /// Wrap a byte array
    pub fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Try to build from a slice, failing if the length is off.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self> {
        let arr: [u8; N] = slice.try_into().map_err(|_| Error::BadLength)?;
        Ok(Self(arr))
    }
}

impl<const N: usize> Deref for Binary<N> {
    type Target = [u8; N];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for Binary<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl<const N: usize> Serialize for Binary<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        human_bytes::serialize(&self.0[..], serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for Binary<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let vec = human_bytes::deserialize(deserializer)?;
        Self::try_from_slice(&vec).map_err(serde::de::Error::custom)
    }
}

/// A variable-length byte string. This is the type to reach for whenever a
/// field is "bytes" rather than "text"; the canonical encoding keeps the two
/// apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinaryVec(Vec<u8>);

impl BinaryVec {
    /// Consume and return the inner bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for BinaryVec {
    type Target = Vec<u8>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BinaryVec {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<[u8]> for BinaryVec {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<Vec<u8>> for BinaryVec {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for BinaryVec {
    fn from(slice: &[u8]) -> Self {
        Self(Vec::from(slice))
    }
}

impl<const N: usize> From<&[u8; N]> for BinaryVec {
    fn from(arr: &[u8; N]) -> Self {
        Self(Vec::from(&arr[..]))
    }
}

impl Serialize for BinaryVec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        human_bytes::serialize(self.0.as_slice(), serializer)
    }
}

impl<'de> Deserialize<'de> for BinaryVec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self(human_bytes::deserialize(deserializer)?))
    }
}

/// Holds secret key bytes. Wiped on drop, and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BinarySecret<const N: usize>([u8; N]);

impl<const N: usize> BinarySecret<N> {
    /// Take ownership of some secret bytes
    pub fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Grab the secret bytes. Try not to hold on to them.
    pub fn expose_secret(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> std::fmt::Debug for BinarySecret<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BinarySecret<{}>(<redacted>)", N)
    }
}
