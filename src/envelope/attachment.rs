use crate::{
    crypto::base::{sha256, AsymmetricKey, Sha256Hash, SymmetricKey},
    error::{Error, Result},
    util::ser::BinaryVec,
};
use getset;
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::warn;

/// A document sent alongside a message, encrypted on its own under a container
/// key (which the message itself carries, e.g. in an
/// [Assertion][crate::body::Assertion]).
///
/// The sender signs the hash of the encrypted container, so anyone holding the
/// sender's public key can check the container without being able to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct Attachment {
    /// SHA-256 of `object_container`
    container_hash: Sha256Hash,
    /// The sender's signature over `container_hash`
    container_sig: BinaryVec,
    /// The encrypted document
    object_container: BinaryVec,
    /// SHA-256 of the plaintext document
    object_hash: Sha256Hash,
    /// Salted hashes of the metadata this document backs up
    metahashes: Vec<Sha256Hash>,
}

fn hashes_match(a: &Sha256Hash, b: &Sha256Hash) -> bool {
    a.as_ref().ct_eq(b.as_ref()).into()
}

impl Attachment {
    /// Encrypt a document under `container_key` and sign the result.
    pub fn make<R: RngCore + CryptoRng>(
        rng: &mut R,
        sender_key: &AsymmetricKey,
        container_key: &SymmetricKey,
        data: &[u8],
        metahashes: Vec<Sha256Hash>,
    ) -> Result<Self> {
        let object_container = container_key.encrypt(rng, data)?;
        let container_hash = sha256(&object_container);
        let container_sig = sender_key.sign(rng, container_hash.as_ref())?;
        Ok(Self {
            container_hash,
            container_sig: BinaryVec::from(container_sig),
            object_container: BinaryVec::from(object_container),
            object_hash: sha256(data),
            metahashes,
        })
    }

    /// Check the container hash and the sender's signature over it. Doesn't
    /// need the container key.
    pub fn verify_container(&self, sender_key: &AsymmetricKey) -> bool {
        hashes_match(&sha256(&self.object_container), &self.container_hash)
            && sender_key.verify(self.container_hash.as_ref(), &self.container_sig)
    }

    /// Verify and decrypt the document. Nothing is returned unless the
    /// container hash, the signature, and the plaintext hash all check out.
    pub fn open(&self, container_key: &SymmetricKey, sender_key: &AsymmetricKey) -> Result<Vec<u8>> {
        if !self.verify_container(sender_key) {
            warn!("attachment container failed verification");
            Err(Error::AttachmentVerificationFailed)?;
        }
        let data = container_key.decrypt(&self.object_container)?;
        if !hashes_match(&sha256(&data), &self.object_hash) {
            warn!("attachment object hash mismatch");
            Err(Error::AttachmentVerificationFailed)?;
        }
        Ok(data)
    }
}

canonical_record! {
    Attachment {
        container_hash: "containerHash",
        container_sig: "containerSig",
        object_container: "objectContainer",
        object_hash: "objectHash",
        metahashes: "Metahashes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::tests_support,
        canonical::Canonical,
        crypto::base::DEFAULT_SYMMETRIC_BITS,
        util::test,
    };

    #[test]
    fn attachment_make_open() {
        let mut rng = test::rng();
        let sender = test::reference_key();
        let container_key = SymmetricKey::generate(&mut rng, DEFAULT_SYMMETRIC_BITS).unwrap();
        let metahashes = tests_support::assertion().metahashes().unwrap();
        let doc = b"%PDF-1.4 passport scan";
        let attachment = Attachment::make(&mut rng, &sender, &container_key, doc, metahashes.clone()).unwrap();

        assert_eq!(attachment.container_hash(), &sha256(attachment.object_container()));
        assert_eq!(attachment.object_hash(), &sha256(doc));
        assert_eq!(attachment.metahashes(), &metahashes);
        assert!(attachment.verify_container(&sender.public_only()));
        assert_eq!(attachment.open(&container_key, &sender.public_only()).unwrap(), doc.to_vec());

        let packed = attachment.pack().unwrap();
        assert_eq!(Attachment::unpack(&packed).unwrap(), attachment);
    }

    #[test]
    fn attachment_tampered() {
        let mut rng = test::rng();
        let sender = test::reference_key();
        let container_key = SymmetricKey::generate(&mut rng, DEFAULT_SYMMETRIC_BITS).unwrap();
        let attachment = Attachment::make(&mut rng, &sender, &container_key, b"hello", vec![]).unwrap();

        let mut swapped = attachment.clone();
        swapped.object_container[20] ^= 1;
        assert_eq!(swapped.open(&container_key, &sender).err(), Some(Error::AttachmentVerificationFailed));

        // rehashing doesn't help without the sender's key
        swapped.container_hash = sha256(&swapped.object_container);
        assert_eq!(swapped.open(&container_key, &sender).err(), Some(Error::AttachmentVerificationFailed));

        let mut wrong_object = attachment.clone();
        wrong_object.object_hash = sha256(b"goodbye");
        assert_eq!(wrong_object.open(&container_key, &sender).err(), Some(Error::AttachmentVerificationFailed));

        let impostor = test::small_key(&mut rng);
        assert!(!attachment.verify_container(&impostor));

        let other_key = SymmetricKey::generate(&mut rng, DEFAULT_SYMMETRIC_BITS).unwrap();
        assert_eq!(attachment.open(&other_key, &sender).err(), Some(Error::CryptoAuthenticationFailed));
    }
}
