//! Relationship state: the salts that bind envelopes to a dossier, and the
//! book of public keys we know peers by.
//!
//! Both are explicit objects handed to the envelope layer by reference. They
//! can be shared between threads; every lookup-or-create happens under one
//! lock, and the first write for a given key wins.

use crate::{
    address::Address,
    body::RegistrationRequest,
    crypto::base::AsymmetricKey,
    error::{Error, Result},
    util::ser::Binary,
};
use parking_lot::{Mutex, RwLock};
use rand::{CryptoRng, RngCore};
use std::collections::HashMap;
use tracing::{trace, warn};

/// Length of a dossier (or metadata) salt.
pub const DOSSIER_SALT_LEN: usize = 40;

/// A dossier or metadata salt.
pub type Salt = Binary<DOSSIER_SALT_LEN>;

/// Identifies a dossier: who is talking to whom, under which service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, getset::Getters)]
#[getset(get = "pub")]
pub struct Relationship {
    /// The sending party
    sender: Address,
    /// The service the conversation belongs to
    service_id: u64,
    /// The receiving party (absent for public messages)
    receiver: Option<Address>,
    /// The receiving party's ID within the service
    receiver_id: Option<u64>,
}

impl Relationship {
    /// Create a new relationship key.
    pub fn new(sender: Address, service_id: u64, receiver: Option<Address>, receiver_id: Option<u64>) -> Self {
        Self {
            sender,
            service_id,
            receiver,
            receiver_id,
        }
    }
}

fn random_salt<R: RngCore + CryptoRng>(rng: &mut R) -> Salt {
    let mut randbuf = [0u8; DOSSIER_SALT_LEN];
    rng.fill_bytes(&mut randbuf);
    Binary::new(randbuf)
}

/// Remembers the salt of every relationship we've sent on, so all envelopes in
/// a dossier hash the same way.
#[derive(Debug, Default)]
pub struct SaltStore {
    dossier: Mutex<HashMap<Relationship, Salt>>,
    metadata: Mutex<HashMap<String, Salt>>,
}

impl SaltStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the salt for a relationship, creating it on first use. The same
    /// relationship always gets the same salt for the life of the store.
    pub fn dossier_salt<R: RngCore + CryptoRng>(&self, rng: &mut R, relationship: &Relationship) -> Salt {
        let mut salts = self.dossier.lock();
        *salts.entry(relationship.clone()).or_insert_with(|| {
            trace!(sender = %relationship.sender, service_id = relationship.service_id, "created dossier salt");
            random_salt(rng)
        })
    }

    /// Get the salt for a metadata value, creating it on first use. Salting
    /// the same value twice gives the same metahash.
    pub fn metadata_salt<R: RngCore + CryptoRng>(&self, rng: &mut R, value: &str) -> Salt {
        let mut salts = self.metadata.lock();
        *salts.entry(String::from(value)).or_insert_with(|| {
            trace!("created metadata salt");
            random_salt(rng)
        })
    }

    /// Restore a previously persisted dossier salt. Returns `false` (and keeps
    /// the existing salt) if the relationship already has one.
    pub fn insert(&self, relationship: Relationship, salt: Salt) -> bool {
        let mut salts = self.dossier.lock();
        if salts.contains_key(&relationship) {
            warn!(sender = %relationship.sender, service_id = relationship.service_id, "ignoring conflicting dossier salt");
            return false;
        }
        salts.insert(relationship, salt);
        true
    }

    /// How many dossiers we have salts for.
    pub fn len(&self) -> usize {
        self.dossier.lock().len()
    }

    /// Whether we have no dossier salts at all.
    pub fn is_empty(&self) -> bool {
        self.dossier.lock().is_empty()
    }
}

/// Turns a recipient address into the public key to wrap an envelope key for.
pub trait PublicKeyResolver {
    /// Find the public key for an address, if we know it.
    fn resolve(&self, address: &Address) -> Option<AsymmetricKey>;
}

impl PublicKeyResolver for HashMap<Address, AsymmetricKey> {
    fn resolve(&self, address: &Address) -> Option<AsymmetricKey> {
        self.get(address).map(|k| k.public_only())
    }
}

/// The public keys we know, by address.
#[derive(Debug, Default)]
pub struct AddressBook {
    keys: RwLock<HashMap<Address, AsymmetricKey>>,
}

impl AddressBook {
    /// Create an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a public key under the address it derives to, and return that
    /// address. If the address is already known the existing key is kept.
    pub fn register(&self, key: &AsymmetricKey) -> Result<Address> {
        let address = key.address()?;
        let mut keys = self.keys.write();
        if keys.contains_key(&address) {
            trace!(address = %address, "address already registered");
        } else {
            trace!(address = %address, "registered address");
            keys.insert(address.clone(), key.public_only());
        }
        Ok(address)
    }

    /// Add a public key someone claims belongs to `address`. Fails if the key
    /// doesn't derive to that address.
    pub fn register_claimed(&self, address: &Address, key: &AsymmetricKey) -> Result<()> {
        if !address.matches(&key.public_key_der()?) {
            warn!(address = %address, "public key does not match claimed address");
            Err(Error::AddressMismatch(address.to_string()))?;
        }
        self.register(key)?;
        Ok(())
    }

    /// Register the key carried in a registration request.
    pub fn register_request(&self, request: &RegistrationRequest) -> Result<Address> {
        self.register(&request.import_public_key()?)
    }

    /// Look up the public key for an address.
    pub fn public_key(&self, address: &Address) -> Option<AsymmetricKey> {
        self.keys.read().get(address).cloned()
    }

    /// Whether we know this address.
    pub fn contains(&self, address: &Address) -> bool {
        self.keys.read().contains_key(address)
    }

    /// How many addresses we know.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl PublicKeyResolver for AddressBook {
    fn resolve(&self, address: &Address) -> Option<AsymmetricKey> {
        self.public_key(address)
    }
}
