//! The crypto module contains our cryptographic primitives for key generation,
//! signing, hashing, and encrypting message content.
//!
//! Envelope sealing and opening lives in [crate::envelope]; this module only
//! knows about keys and bytes.

pub mod base;
