#![deny(missing_docs)]

//! # certreg-ledger: The Certificate Ledger
//!
//! An admin-gated ledger that issues, revokes and verifies certificates,
//! keyed by student address.
//!
//! ## Components
//!
//! | Component | Module |
//! |---|---|
//! | AdminSet, AccessGate | [`admin`] |
//! | CertificateStore | [`store`] |
//! | Issuance (`newCertificate`) | [`issuance`] |
//! | Revocation (`revokeCertificate`) | [`revocation`] |
//! | Verification and queries | [`query`] |
//! | Mutation journal | [`journal`] |
//! | The aggregate owning all of the above | [`registry`] |
//!
//! ## Operation surface
//!
//! | Operation | Method | Access |
//! |---|---|---|
//! | `addAdmin` | [`CertificateRegistry::add_admin`] | admin |
//! | `isAdmin` | [`CertificateRegistry::is_admin`] | any |
//! | `newCertificate` | [`CertificateRegistry::new_certificate`] | admin |
//! | `revokeCertificate` | [`CertificateRegistry::revoke_certificate`] | admin |
//! | `verifyCertificate` | [`CertificateRegistry::verify_certificate`] | any |
//! | `getCertificatesByAddress` | [`CertificateRegistry::certificates_by_address`] | any |
//!
//! The registry is a plain single-threaded value. Hosts that share it across
//! threads wrap it in one lock: exclusive for mutations, shared for reads.

pub mod admin;
pub mod error;
pub mod issuance;
pub mod journal;
pub mod query;
pub mod registry;
pub mod revocation;
pub mod store;

pub use admin::{AccessGate, AdminSet};
pub use error::{JournalError, LedgerError};
pub use issuance::issued_id;
pub use journal::{verify_chain, ChainReport, Journal, JournalEntry, LedgerEvent, GENESIS_HASH};
pub use registry::CertificateRegistry;
pub use store::CertificateStore;
