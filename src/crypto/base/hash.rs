use crate::{
    error::{Error, Result},
    util::ser::Binary,
};
use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// A SHA-256 digest. Message hashes, dossier hashes, container hashes and
/// metadata hashes are all one of these.
pub type Sha256Hash = Binary<32>;

/// SHA-256 of a message.
pub fn sha256(message: &[u8]) -> Sha256Hash {
    let mut arr = [0u8; 32];
    arr.copy_from_slice(Sha256::digest(message).as_slice());
    Binary::new(arr)
}

/// SHA-256 applied twice. Used for address checksums.
pub fn sha256d(message: &[u8]) -> Sha256Hash {
    sha256(sha256(message).as_ref())
}

/// RIPEMD-160 of SHA-256 of a message: the 20-byte core of an address.
pub fn hash160(message: &[u8]) -> [u8; 20] {
    let mut arr = [0u8; 20];
    arr.copy_from_slice(Ripemd160::digest(sha256(message).as_ref()).as_slice());
    arr
}

/// Hash a piece of metadata under a salt (HMAC-SHA256 keyed by the salt), so
/// the hash can be published without making the value guessable.
pub fn metahash(salt: &[u8], value: &[u8]) -> Result<Sha256Hash> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(salt).map_err(|_| Error::CryptoBadSalt)?;
    mac.update(value);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(mac.finalize().into_bytes().as_slice());
    Ok(Binary::new(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ser::{hex_decode, hex_encode};

    #[test]
    fn sha256_known() {
        assert_eq!(
            hex_encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex_encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn hash160_known() {
        // RIPEMD160(SHA256(""))
        assert_eq!(hex_encode(hash160(b"")), "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb");
    }

    #[test]
    fn metahash_is_hmac() {
        // RFC 4231 test case 2
        let hash = metahash(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hash.as_ref(),
            hex_decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843").unwrap().as_slice()
        );
        let other_salt = metahash(b"Jeff", b"what do ya want for nothing?").unwrap();
        assert_ne!(hash, other_salt);
    }
}
