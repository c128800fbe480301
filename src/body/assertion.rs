//! Assertions are a consumer's claims about themselves, sent to whoever needs
//! to check them. The actual documents travel as attachments encrypted under
//! `containerKey`; the assertion carries the key and salted metadata.

use crate::{
    address::Address,
    crypto::base::{metahash, Sha256Hash},
    error::Result,
    util::{ser::BinaryVec, Date},
};
use getset;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One salted metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct AssertionMetadata {
    /// The salt (40 bytes, or empty for unsalted)
    meta_salt: BinaryVec,
    /// The value itself
    meta_value: String,
}

impl AssertionMetadata {
    /// Create a new metadata entry.
    pub fn new<S: Into<String>>(meta_salt: BinaryVec, meta_value: S) -> Self {
        Self {
            meta_salt,
            meta_value: meta_value.into(),
        }
    }

    /// The salted hash of this value, suitable for publishing.
    pub fn metahash(&self) -> Result<Sha256Hash> {
        metahash(&self.meta_salt, self.meta_value.as_bytes())
    }
}

canonical_record! {
    AssertionMetadata {
        meta_salt: "MetaSalt",
        meta_value: "MetaValue",
    }
}

/// A claim about a subject, with the key to its supporting documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Assertion {
    /// Who the assertion is about
    subject_addr: Address,
    /// When the assertion stops being valid
    valid_until: Date,
    /// How long the recipient may keep it
    retain_until: Date,
    /// Symmetric key for the attached containers
    container_key: BinaryVec,
    /// Metadata by type (`Name`, `Surname`, ...)
    meta: BTreeMap<String, AssertionMetadata>,
}

impl Assertion {
    /// Create a new assertion.
    pub fn new(
        subject_addr: Address,
        valid_until: Date,
        retain_until: Date,
        container_key: BinaryVec,
        meta: BTreeMap<String, AssertionMetadata>,
    ) -> Self {
        Self {
            subject_addr,
            valid_until,
            retain_until,
            container_key,
            meta,
        }
    }

    /// Salted hashes of every metadata value, ordered by metadata type. These
    /// are what attachments list as their metahashes.
    pub fn metahashes(&self) -> Result<Vec<Sha256Hash>> {
        self.meta.values().map(|m| m.metahash()).collect()
    }
}

canonical_record! {
    Assertion {
        subject_addr: "subjectAddr",
        valid_until: "validUntil",
        retain_until: "retainUntil",
        container_key: "containerKey",
        meta: "Meta",
    }
}
