//! # Ledger Errors
//!
//! [`LedgerError`] is the error taxonomy of every ledger operation.
//! [`JournalError`] covers integrity failures of the mutation journal, which
//! only arise when entries come from outside (replay, persistence).

use certreg_core::{Address, CertificateId, ValidationError};
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller is not a member of the admin set.
    #[error("caller {caller} is not an admin")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// No certificate has the given identifier.
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// An argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The next identifier would exceed the safe integer range.
    #[error("certificate identifier space exhausted")]
    CapacityExhausted,

    /// A bootstrap was attempted on a ledger that already has an admin seed.
    #[error("ledger is already bootstrapped")]
    AlreadyBootstrapped,

    /// A journal entry failed an integrity check.
    #[error("journal integrity error: {0}")]
    Journal(#[from] JournalError),
}

/// Integrity failures of journal entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// The entry's sequence number is not the next one.
    #[error("expected journal sequence {expected}, got {actual}")]
    OutOfSequence {
        /// The sequence number the journal expects next.
        expected: u64,
        /// The sequence number the entry carries.
        actual: u64,
    },

    /// The entry's `previous_hash` is not the current head hash.
    #[error("journal entry {seq} does not link to the journal head")]
    BrokenLink {
        /// Sequence number of the offending entry.
        seq: u64,
    },

    /// The entry's stored hash does not match its contents.
    #[error("journal entry {seq} hash does not match its contents")]
    HashMismatch {
        /// Sequence number of the offending entry.
        seq: u64,
    },

    /// The first entry is not a bootstrap, or the journal is empty.
    #[error("journal does not begin with a bootstrap entry")]
    MissingGenesis,

    /// A non-bootstrap entry carries no caller, or a bootstrap carries one.
    #[error("journal entry {seq} has an invalid caller attribution")]
    InvalidCaller {
        /// Sequence number of the offending entry.
        seq: u64,
    },

    /// An issuance entry names an identifier other than the next one.
    #[error("issuance entry {seq} allocates id {actual}, expected {expected}")]
    IdMismatch {
        /// Sequence number of the offending entry.
        seq: u64,
        /// The identifier the store would allocate.
        expected: CertificateId,
        /// The identifier the entry carries.
        actual: CertificateId,
    },

    /// The entry could not be encoded for hashing.
    #[error("journal entry {seq} could not be encoded: {reason}")]
    Encoding {
        /// Sequence number of the offending entry.
        seq: u64,
        /// Encoder message.
        reason: String,
    },
}
