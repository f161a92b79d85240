//! # API Route Modules
//!
//! - `admins`: grant admin rights, query admin membership.
//! - `certificates`: issue, revoke, verify, and look up certificates.
//! - `journal`: read and integrity-check the mutation journal.

pub mod admins;
pub mod certificates;
pub mod journal;
