#![deny(missing_docs)]

//! # certreg-core: Foundational Types for the Certificate Registry
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies: only `serde` and `thiserror`
//! from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`Address`] and a
//!    [`CertificateId`] are distinct types, validated at construction and on
//!    deserialization.
//!
//! 2. **Immutable records.** A [`Certificate`] exposes accessors only; the
//!    single permitted mutation is the one-way [`Certificate::revoke`].
//!
//! 3. **Safe integers.** Every integer that leaves the registry fits in an
//!    IEEE-754 double without loss ([`MAX_SAFE_INTEGER`]).

pub mod certificate;
pub mod error;
pub mod identity;

pub use certificate::{Certificate, CertificateDraft, MAX_NAME_LEN};
pub use error::ValidationError;
pub use identity::{
    check_integer_range, check_safe_integer, Address, CertificateId, MAX_ADDRESS_LEN,
    MAX_SAFE_INTEGER,
};
