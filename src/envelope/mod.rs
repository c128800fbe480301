//! Envelopes: the signed, selectively encrypted containers every message
//! travels in.
//!
//! Building an envelope packs the [Message], signs the packed plaintext, and
//! (if there are recipients) encrypts it once under a fresh symmetric key that
//! then gets wrapped separately for each recipient's public key. The wrapped
//! keys make up the envelope's ACL. An empty ACL means the message is public
//! and its bytes are the plaintext packing.
//!
//! Every envelope also carries a dossier hash, which ties it to the
//! relationship it belongs to without revealing that relationship's salt.
//!
//! On the receiving end, [Envelope::decrypt] only decrypts. [Envelope::open]
//! is what you generally want: it decrypts, looks up the sender, checks the
//! signature and message hash, and only then hands over the message.

use crate::{
    address::Address,
    body::MessageBody,
    canonical::Canonical,
    crypto::base::{sha256, AsymmetricKey, Sha256Hash, SymmetricKey, DEFAULT_SYMMETRIC_BITS},
    error::{Error, Result},
    relationship::{PublicKeyResolver, Relationship, Salt, SaltStore},
    util::ser::{hex_encode, BinaryVec},
};
use getset;
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

mod attachment;
mod message;

pub use attachment::*;
pub use message::*;

/// Hash binding an envelope to its dossier:
/// `SHA256(sender ":" service ":" receiver ":" receiverID ":" || salt)`, with
/// absent receiver parts left empty.
pub fn dossier_hash(sender: &Address, service_id: u64, receiver: Option<&Address>, receiver_id: Option<u64>, salt: &Salt) -> Sha256Hash {
    let mut preimage = format!(
        "{}:{}:{}:{}:",
        sender,
        service_id,
        receiver.map(|a| a.as_str()).unwrap_or_default(),
        // an ID of 0 renders as "0" here, some other implementations leave it empty
        receiver_id.map(|id| id.to_string()).unwrap_or_default(),
    )
    .into_bytes();
    preimage.extend_from_slice(salt.as_ref());
    sha256(&preimage)
}

/// A sealed message. Never modified once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct Envelope {
    /// SHA-256 of `message` (as it travels, encrypted or not)
    message_hash: Sha256Hash,
    /// Binds the envelope to its dossier, see [dossier_hash]
    dossier_hash: Sha256Hash,
    /// Who sent it
    sender_addr: Address,
    /// The sender's signature over the packed plaintext message
    message_sig: BinaryVec,
    /// The packed message, encrypted unless the ACL is empty
    message: BinaryVec,
    /// Each recipient's wrapped copy of the message key
    acl: BTreeMap<Address, BinaryVec>,
    /// Separately encrypted documents
    attachments: Vec<Attachment>,
    /// The message this one supersedes, if any
    replaces_msg_hash: Option<Sha256Hash>,
}

canonical_record! {
    Envelope {
        message_hash: "messageHash",
        dossier_hash: "dossierHash",
        sender_addr: "senderAddr",
        message_sig: "messageSig",
        message: "message",
        acl: "ACL",
        attachments: "attachements",
        replaces_msg_hash: "replacesMsgHash",
    }
}

impl Envelope {
    /// Whether anyone can read this envelope.
    pub fn is_public(&self) -> bool {
        self.acl.is_empty()
    }

    /// Whether `address` has an ACL entry.
    pub fn is_recipient(&self, address: &Address) -> bool {
        self.acl.contains_key(address)
    }

    /// Decrypt (or, for public envelopes, just decode) the message.
    ///
    /// This does NOT check the signature. See [Envelope::open] for that.
    pub fn decrypt(&self, address: &Address, key: &AsymmetricKey) -> Result<Message> {
        let plaintext = if self.is_public() {
            self.message.to_vec()
        } else {
            let wrapped = self
                .acl
                .get(address)
                .ok_or_else(|| Error::EnvelopeNotARecipient(address.to_string()))?;
            let key_bytes = Zeroizing::new(key.decrypt(wrapped)?);
            let message_key = SymmetricKey::from_bytes(&key_bytes)?;
            message_key.decrypt(&self.message)?
        };
        let message = Message::unpack(&plaintext)?;
        debug!(message_hash = %hex_encode(self.message_hash), body_type = %message.body_type(), "decrypted envelope");
        Ok(message)
    }

    /// Check that this envelope came from `sender_key` and carries `message`:
    /// the sender address derives from the key, the message hash matches the
    /// carried bytes, and the signature verifies over the packed message.
    pub fn verify(&self, sender_key: &AsymmetricKey, message: &Message) -> bool {
        let sender_matches = sender_key
            .public_key_der()
            .map(|der| self.sender_addr.matches(&der))
            .unwrap_or(false);
        let hash_matches: bool = sha256(&self.message).as_ref().ct_eq(self.message_hash.as_ref()).into();
        let sig_matches = message
            .pack()
            .map(|packed| sender_key.verify(&packed, &self.message_sig))
            .unwrap_or(false);
        sender_matches && hash_matches && sig_matches
    }

    /// Decrypt, find the sender's key, and verify. The message is only
    /// returned if all of that succeeds.
    ///
    /// Apart from [Error::EnvelopeNotARecipient] (the ACL is public anyway),
    /// every failure comes back as [Error::EnvelopeOpenFailed].
    pub fn open<P: PublicKeyResolver>(&self, address: &Address, key: &AsymmetricKey, resolver: &P) -> Result<Message> {
        if !self.is_public() && !self.is_recipient(address) {
            Err(Error::EnvelopeNotARecipient(address.to_string()))?;
        }
        let message = self.decrypt(address, key).map_err(|e| {
            warn!(sender = %self.sender_addr, error = %e, "failed to decrypt envelope");
            Error::EnvelopeOpenFailed
        })?;
        let sender_key = resolver.resolve(&self.sender_addr).ok_or_else(|| {
            warn!(sender = %self.sender_addr, "no public key for envelope sender");
            Error::EnvelopeOpenFailed
        })?;
        if !self.verify(&sender_key, &message) {
            warn!(sender = %self.sender_addr, "envelope failed verification");
            Err(Error::EnvelopeOpenFailed)?;
        }
        Ok(message)
    }

    /// SHA-256 of the packed envelope. This is the envelope's ID.
    pub fn hash(&self) -> Result<Sha256Hash> {
        Ok(sha256(&self.pack()?))
    }

    /// Serialize this envelope to YAML, for people to look at.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Collects everything an envelope needs, then seals it.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    service_id: u64,
    consumer_id: Option<u64>,
    body: MessageBody,
    recipients: Vec<(Address, u64)>,
    attachments: Vec<Attachment>,
    replaces_msg_hash: Option<Sha256Hash>,
    symmetric_bits: usize,
}

impl EnvelopeBuilder {
    /// Start an envelope for `body`, sent under `service_id`.
    pub fn new<B: Into<MessageBody>>(service_id: u64, body: B) -> Self {
        Self {
            service_id,
            consumer_id: None,
            body: body.into(),
            recipients: Vec::new(),
            attachments: Vec::new(),
            replaces_msg_hash: None,
            symmetric_bits: DEFAULT_SYMMETRIC_BITS,
        }
    }

    /// Add a recipient, along with their ID within the service. The first
    /// recipient is the one the dossier is bound to.
    pub fn to(mut self, address: Address, receiver_id: u64) -> Self {
        self.recipients.push((address, receiver_id));
        self
    }

    /// Set the consumer ID explicitly. Defaults to the first recipient's ID.
    pub fn consumer_id(mut self, consumer_id: u64) -> Self {
        self.consumer_id = Some(consumer_id);
        self
    }

    /// Attach a document.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Mark this envelope as replacing an earlier one.
    pub fn replaces(mut self, message_hash: Sha256Hash) -> Self {
        self.replaces_msg_hash = Some(message_hash);
        self
    }

    /// Use a different message key size (128, 192, or 256).
    pub fn symmetric_bits(mut self, bits: usize) -> Self {
        self.symmetric_bits = bits;
        self
    }

    /// Seal the envelope. Every recipient's public key must be known to
    /// `resolver`.
    pub fn build<R, P>(self, rng: &mut R, sender_key: &AsymmetricKey, salts: &SaltStore, resolver: &P) -> Result<Envelope>
    where
        R: RngCore + CryptoRng,
        P: PublicKeyResolver,
    {
        let mut seen = BTreeSet::new();
        if let Some((address, _)) = self.recipients.iter().find(|(address, _)| !seen.insert(address)) {
            Err(Error::EnvelopeDuplicateRecipient(address.to_string()))?;
        }
        let sender_addr = sender_key.address()?;
        let (receiver, receiver_id) = match self.recipients.first() {
            Some((address, id)) => (Some(address.clone()), Some(*id)),
            None => (None, None),
        };
        let relationship = Relationship::new(sender_addr.clone(), self.service_id, receiver.clone(), receiver_id);
        let dossier_salt = salts.dossier_salt(rng, &relationship);

        let message = Message::new(self.service_id, self.consumer_id.or(receiver_id), dossier_salt, self.body);
        let serialized = message.pack()?;
        let message_sig = sender_key.sign(rng, &serialized)?;

        let mut acl = BTreeMap::new();
        let sealed = if self.recipients.is_empty() {
            serialized
        } else {
            let recipient_keys = self
                .recipients
                .iter()
                .map(|(address, _)| {
                    resolver
                        .resolve(address)
                        .map(|key| (address.clone(), key))
                        .ok_or_else(|| Error::EnvelopeUnknownRecipient(address.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            let message_key = SymmetricKey::generate(rng, self.symmetric_bits)?;
            for (address, key) in recipient_keys {
                let wrapped = key.encrypt(rng, message_key.as_bytes())?;
                acl.insert(address, BinaryVec::from(wrapped));
            }
            message_key.encrypt(rng, &serialized)?
        };

        let message_hash = sha256(&sealed);
        let dossier_hash = dossier_hash(&sender_addr, self.service_id, receiver.as_ref(), receiver_id, &dossier_salt);
        debug!(
            sender = %sender_addr,
            recipients = acl.len(),
            body_type = %message.body_type(),
            message_hash = %hex_encode(message_hash),
            "built envelope"
        );
        Ok(Envelope {
            message_hash,
            dossier_hash,
            sender_addr,
            message_sig: BinaryVec::from(message_sig),
            message: BinaryVec::from(sealed),
            acl,
            attachments: self.attachments,
            replaces_msg_hash: self.replaces_msg_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::{tests_support, BodyType},
        crypto::base::metahash,
        relationship::AddressBook,
        util::test,
    };

    struct Party {
        key: AsymmetricKey,
        address: Address,
    }

    fn party<R: RngCore + CryptoRng>(rng: &mut R, book: &AddressBook) -> Party {
        let key = test::small_key(rng);
        let address = book.register(&key).unwrap();
        Party { key, address }
    }

    fn sender(book: &AddressBook) -> Party {
        let key = test::reference_key();
        let address = book.register(&key).unwrap();
        Party { key, address }
    }

    #[test]
    fn envelope_fan_out() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let recipients = (0..3).map(|_| party(&mut rng, &book)).collect::<Vec<_>>();

        let mut builder = EnvelopeBuilder::new(7, tests_support::registration_request());
        for (i, r) in recipients.iter().enumerate() {
            builder = builder.to(r.address.clone(), 100 + i as u64);
        }
        let envelope = builder.build(&mut rng, &alice.key, &salts, &book).unwrap();

        assert_eq!(envelope.acl().len(), 3);
        assert!(!envelope.is_public());
        assert_eq!(envelope.sender_addr(), &alice.address);
        assert_eq!(envelope.message_hash(), &sha256(envelope.message()));

        let messages = recipients
            .iter()
            .map(|r| envelope.decrypt(&r.address, &r.key).unwrap())
            .collect::<Vec<_>>();
        for message in &messages {
            assert_eq!(message, &messages[0]);
            assert!(envelope.verify(&alice.key.public_only(), message));
        }
        let message = &messages[0];
        assert_eq!(message.service_id(), &7);
        assert_eq!(message.consumer_id(), &Some(100));
        assert_eq!(message.body_type(), &BodyType::RegistrationRequest);
        assert_eq!(message.body(), &MessageBody::from(tests_support::registration_request()));
    }

    #[test]
    fn envelope_duplicate_recipient() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);
        let carol = party(&mut rng, &book);

        let res = EnvelopeBuilder::new(1, tests_support::assertion())
            .to(bob.address.clone(), 1)
            .to(carol.address.clone(), 2)
            .to(bob.address.clone(), 3)
            .build(&mut rng, &alice.key, &salts, &book);
        assert_eq!(res.err(), Some(Error::EnvelopeDuplicateRecipient(bob.address.to_string())));
        // rejected before any dossier salt gets handed out
        assert!(salts.is_empty());
    }

    #[test]
    fn envelope_public() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);

        let envelope = EnvelopeBuilder::new(1, tests_support::service_registration())
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        assert!(envelope.is_public());
        assert!(envelope.acl().is_empty());

        // anyone can read it, with any key
        let message = envelope.decrypt(&bob.address, &bob.key).unwrap();
        assert_eq!(message.consumer_id(), &None);
        assert_eq!(envelope.message().as_ref(), message.pack().unwrap().as_slice());
        assert_eq!(envelope.open(&bob.address, &bob.key, &book).unwrap(), message);
    }

    #[test]
    fn envelope_not_a_recipient() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);
        let eve = party(&mut rng, &book);

        let envelope = EnvelopeBuilder::new(1, tests_support::assertion())
            .to(bob.address.clone(), 1)
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        assert_eq!(envelope.decrypt(&eve.address, &eve.key).err(), Some(Error::EnvelopeNotARecipient(eve.address.to_string())));
        assert_eq!(envelope.open(&eve.address, &eve.key, &book).err(), Some(Error::EnvelopeNotARecipient(eve.address.to_string())));
        // claiming bob's address doesn't help either
        assert!(envelope.decrypt(&bob.address, &eve.key).is_err());
        assert_eq!(envelope.open(&bob.address, &eve.key, &book).err(), Some(Error::EnvelopeOpenFailed));
    }

    #[test]
    fn envelope_unknown_recipient() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let stranger = test::small_key(&mut rng).address().unwrap();

        let res = EnvelopeBuilder::new(1, tests_support::attestation())
            .to(stranger.clone(), 1)
            .build(&mut rng, &alice.key, &salts, &book);
        assert_eq!(res.err(), Some(Error::EnvelopeUnknownRecipient(stranger.to_string())));
    }

    #[test]
    fn envelope_tampered() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);

        let envelope = EnvelopeBuilder::new(1, tests_support::assertion())
            .to(bob.address.clone(), 1)
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        assert!(envelope.open(&bob.address, &bob.key, &book).is_ok());

        let mut flipped = envelope.clone();
        flipped.message[40] ^= 0x80;
        assert_eq!(flipped.decrypt(&bob.address, &bob.key).err(), Some(Error::CryptoAuthenticationFailed));
        assert_eq!(flipped.open(&bob.address, &bob.key, &book).err(), Some(Error::EnvelopeOpenFailed));

        let mut bad_sig = envelope.clone();
        bad_sig.message_sig[5] ^= 1;
        let message = bad_sig.decrypt(&bob.address, &bob.key).unwrap();
        assert!(!bad_sig.verify(&alice.key, &message));
        assert_eq!(bad_sig.open(&bob.address, &bob.key, &book).err(), Some(Error::EnvelopeOpenFailed));

        let mut bad_hash = envelope.clone();
        bad_hash.message_hash = sha256(b"something else");
        assert_eq!(bad_hash.open(&bob.address, &bob.key, &book).err(), Some(Error::EnvelopeOpenFailed));

        // bob's key doesn't derive to alice's address
        assert!(!envelope.verify(&bob.key, &message));

        // a sender we've never heard of can't be verified
        let strangers = AddressBook::new();
        strangers.register(&bob.key).unwrap();
        assert_eq!(envelope.open(&bob.address, &bob.key, &strangers).err(), Some(Error::EnvelopeOpenFailed));
    }

    #[test]
    fn envelope_dossier_binding() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);

        let build = |rng: &mut rand_chacha::ChaCha20Rng, receiver_id: u64| {
            EnvelopeBuilder::new(9, tests_support::assertion())
                .to(bob.address.clone(), receiver_id)
                .build(rng, &alice.key, &salts, &book)
                .unwrap()
        };
        let env1 = build(&mut rng, 1);
        let env2 = build(&mut rng, 1);
        let env3 = build(&mut rng, 2);
        assert_eq!(env1.dossier_hash(), env2.dossier_hash());
        assert_ne!(env1.dossier_hash(), env3.dossier_hash());
        assert_ne!(env1.message_hash(), env2.message_hash());
        assert_eq!(salts.len(), 2);

        let message = env1.decrypt(&bob.address, &bob.key).unwrap();
        let mut preimage = format!("{}:9:{}:1:", alice.address, bob.address).into_bytes();
        preimage.extend_from_slice(message.dossier_salt().as_ref());
        assert_eq!(env1.dossier_hash(), &sha256(&preimage));
        assert_eq!(
            env1.dossier_hash(),
            &dossier_hash(&alice.address, 9, Some(&bob.address), Some(1), message.dossier_salt())
        );

        let mut zero = format!("{}:9:{}:0:", alice.address, bob.address).into_bytes();
        zero.extend_from_slice(message.dossier_salt().as_ref());
        assert_eq!(dossier_hash(&alice.address, 9, Some(&bob.address), Some(0), message.dossier_salt()), sha256(&zero));

        let public = EnvelopeBuilder::new(9, tests_support::assertion())
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        let message = public.decrypt(&bob.address, &bob.key).unwrap();
        let mut preimage = format!("{}:9:::", alice.address).into_bytes();
        preimage.extend_from_slice(message.dossier_salt().as_ref());
        assert_eq!(public.dossier_hash(), &sha256(&preimage));
    }

    #[test]
    fn envelope_with_attachment() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);

        let assertion = tests_support::assertion();
        let container_key = SymmetricKey::from_bytes(assertion.container_key()).unwrap();
        let attachment = Attachment::make(&mut rng, &alice.key, &container_key, b"id card", assertion.metahashes().unwrap()).unwrap();
        let envelope = EnvelopeBuilder::new(2, assertion.clone())
            .to(bob.address.clone(), 5)
            .attach(attachment)
            .replaces(sha256(b"previous"))
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        assert_eq!(envelope.replaces_msg_hash(), &Some(sha256(b"previous")));

        let message = envelope.open(&bob.address, &bob.key, &book).unwrap();
        let received = match message.into_body() {
            MessageBody::Assertion(a) => a,
            other => panic!("unexpected body {:?}", other),
        };
        let key = SymmetricKey::from_bytes(received.container_key()).unwrap();
        let sender_key = book.public_key(envelope.sender_addr()).unwrap();
        let doc = envelope.attachments()[0].open(&key, &sender_key).unwrap();
        assert_eq!(doc, b"id card".to_vec());
        let name = &received.meta()["Name"];
        assert!(envelope.attachments()[0]
            .metahashes()
            .contains(&metahash(name.meta_salt(), name.meta_value().as_bytes()).unwrap()));
    }

    #[test]
    fn envelope_pack_and_hash() {
        let mut rng = test::rng();
        let book = AddressBook::new();
        let salts = SaltStore::new();
        let alice = sender(&book);
        let bob = party(&mut rng, &book);
        let carol = party(&mut rng, &book);

        let envelope = EnvelopeBuilder::new(4, tests_support::reference_invite_registration())
            .to(bob.address.clone(), 1)
            .to(carol.address.clone(), 2)
            .symmetric_bits(128)
            .build(&mut rng, &alice.key, &salts, &book)
            .unwrap();
        let packed = envelope.pack().unwrap();
        let unpacked = Envelope::unpack(&packed).unwrap();
        assert_eq!(unpacked, envelope);
        assert_eq!(unpacked.hash().unwrap(), sha256(&packed));
        assert_eq!(unpacked.hash().unwrap(), envelope.hash().unwrap());
        assert!(unpacked.open(&carol.address, &carol.key, &book).is_ok());

        let yaml = envelope.to_yaml().unwrap();
        assert!(yaml.contains(alice.address.as_str()));
    }
}
