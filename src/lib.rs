//! Welcome to the Teleferic core, the part of the Teleferic protocol that every
//! implementation has to agree on byte for byte.
//!
//! Teleferic lets independent identities (people, services, attestation
//! entities) exchange signed messages that are encrypted for exactly the
//! parties that need to read them. A consumer registers with a service, sends
//! it assertions about themselves along with the documents that back them up,
//! and attestation entities check those assertions and send back what they
//! found. All of that travels as [envelopes][envelope::Envelope].
//!
//! This crate covers:
//!
//! 1. Deterministic [canonical encoding][canonical] of structured values, so a
//! message packed here hashes and verifies identically everywhere else.
//! 1. [Addresses][address::Address], checksummed identities derived from a
//! public key.
//! 1. The [crypto] primitives: RSA keypairs for wrapping keys and signing, and
//! AES-GCM keys for the bulk encryption.
//! 1. The closed set of [message bodies][body].
//! 1. The [relationship] state a party keeps: dossier salts and the public keys
//! of its peers.
//! 1. [Envelopes][envelope], which tie everything together: one message,
//! signed once, encrypted once, and wrapped separately for each recipient.
//!
//! Transport and storage are not handled here. Randomness is always passed in,
//! and any shared state is an explicit object you hand to the functions that
//! need it.

#[macro_use]
pub mod canonical;
pub mod error;
pub mod util;
pub mod address;
pub mod crypto;
pub mod body;
pub mod relationship;
pub mod envelope;
