//! Addresses are the names identities go by on the wire.
//!
//! An address is derived from a public key (DER `SubjectPublicKeyInfo`):
//!
//! ```text
//! payload  = ADDRESS_PREFIX || RIPEMD160(SHA256(der))     (22 bytes)
//! checksum = last 4 bytes of SHA256(SHA256(payload))
//! address  = base58(payload || checksum)                  (26 bytes raw)
//! ```
//!
//! Addresses are compared by value, and the only way to check that a public
//! key belongs to an address is to derive it again and compare.

use crate::{
    canonical::{Canonical, Value},
    crypto::base::{hash160, sha256d},
    error::{Error, Result},
};
use serde_derive::{Deserialize, Serialize};
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// The fixed version prefix every address starts with.
pub const ADDRESS_PREFIX: [u8; 2] = [0x01, 0x00];

/// How many raw bytes sit under the base58.
pub const ADDRESS_RAW_LEN: usize = ADDRESS_PREFIX.len() + 20 + 4;

/// A checksummed identity string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

fn checksum(payload: &[u8]) -> [u8; 4] {
    let hash = sha256d(payload);
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&hash[28..32]);
    arr
}

impl Address {
    /// Derive the address of a DER-encoded public key.
    pub fn derive(public_key_der: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(ADDRESS_RAW_LEN);
        raw.extend_from_slice(&ADDRESS_PREFIX[..]);
        raw.extend_from_slice(&hash160(public_key_der)[..]);
        let check = checksum(&raw);
        raw.extend_from_slice(&check[..]);
        Self(bs58::encode(raw).into_string())
    }

    /// Parse and validate an address string (base58, length, prefix, and
    /// checksum).
    pub fn parse(text: &str) -> Result<Self> {
        let raw = bs58::decode(text).into_vec().map_err(|_| Error::AddressInvalid)?;
        if raw.len() != ADDRESS_RAW_LEN || raw[0..2] != ADDRESS_PREFIX[..] {
            Err(Error::AddressInvalid)?;
        }
        let (payload, check) = raw.split_at(ADDRESS_RAW_LEN - 4);
        if !bool::from(checksum(payload).ct_eq(check)) {
            Err(Error::AddressInvalid)?;
        }
        Ok(Self(String::from(text)))
    }

    /// Whether this address is the one `public_key_der` derives to.
    pub fn matches(&self, public_key_der: &[u8]) -> bool {
        let derived = Self::derive(public_key_der);
        bool::from(derived.0.as_bytes().ct_eq(self.0.as_bytes()))
    }

    /// The address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Addresses go over the wire as plain text. Decoding doesn't re-validate the
/// checksum: a body can legitimately carry an address we can't vouch for, and
/// anything that matters gets checked against a key anyway.
impl Canonical for Address {
    fn to_struct(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_struct(value: Value) -> Result<Self> {
        Ok(Self(String::from_struct(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{
        ser::hex_decode,
        test::{self, REFERENCE_ADDRESS, REFERENCE_PUBKEY_HEX},
    };

    #[test]
    fn address_derive_reference() {
        let der = hex_decode(REFERENCE_PUBKEY_HEX).unwrap();
        let addr = Address::derive(&der);
        assert_eq!(addr.as_str(), REFERENCE_ADDRESS);
        assert!(addr.matches(&der));
        assert_eq!(Address::parse(REFERENCE_ADDRESS).unwrap(), addr);
    }

    #[test]
    fn address_shape() {
        let mut rng = test::rng();
        for _ in 0..3 {
            let key = test::small_key(&mut rng);
            let addr = key.address().unwrap();
            let raw = bs58::decode(addr.as_str()).into_vec().unwrap();
            assert_eq!(raw.len(), 26);
            assert_eq!(&raw[0..2], &ADDRESS_PREFIX);
            assert_eq!(&checksum(&raw[0..22]), &raw[22..26]);
            assert!(Address::parse(addr.as_str()).is_ok());
        }
    }

    #[test]
    fn address_golden_vector_addresses_validate() {
        for addr in [
            "2nPfgysH5URwM6mcknqwNEgbCi9C36oQsdZ",
            "2n9hLLzhpn4ueRHYoJBtcR7JkmtcV4omzLK",
            REFERENCE_ADDRESS,
        ] {
            assert!(Address::parse(addr).is_ok(), "{}", addr);
        }
    }

    #[test]
    fn address_rejects_garbage() {
        // bad checksum (last char changed)
        assert_eq!(Address::parse("2n4gSd2aVC6Dep5ECS4NRCw3AG2p73r7DcN").err(), Some(Error::AddressInvalid));
        // not base58 (0 and l)
        assert_eq!(Address::parse("0l").err(), Some(Error::AddressInvalid));
        // too short
        assert_eq!(Address::parse("2n4gSd2aVC6Dep5").err(), Some(Error::AddressInvalid));
        assert_eq!(Address::parse("").err(), Some(Error::AddressInvalid));
    }

    #[test]
    fn address_mismatched_key() {
        let mut rng = test::rng();
        let other = test::small_key(&mut rng);
        let addr = Address::parse(REFERENCE_ADDRESS).unwrap();
        assert!(!addr.matches(&other.public_key_der().unwrap()));
    }

    #[test]
    fn address_is_text_on_the_wire() {
        let addr = Address::parse(REFERENCE_ADDRESS).unwrap();
        let packed = addr.pack().unwrap();
        assert_eq!(packed[0], 0xd9);
        assert_eq!(packed[1] as usize, REFERENCE_ADDRESS.len());
        assert_eq!(Address::unpack(&packed).unwrap(), addr);
    }
}
