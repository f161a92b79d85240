//! # Ledger Journal
//!
//! Every committed mutation is recorded as a [`JournalEntry`]. Entries are
//! numbered densely from 0 and chained: each entry stores the hash of its
//! predecessor, and its own hash is SHA-256 over
//!
//! ```text
//! previous_hash \n seq \n recorded_at \n caller \n kind \n payload-json
//! ```
//!
//! hex-encoded. The first entry links to [`GENESIS_HASH`] and is always a
//! [`LedgerEvent::Bootstrap`]. Replaying the journal in order rebuilds the
//! ledger exactly, which is how persisted state is restored.
//!
//! Idempotent no-ops (re-adding an admin, re-revoking a certificate) commit
//! nothing and therefore write no entry.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use certreg_core::{Address, CertificateDraft, CertificateId};

use crate::error::JournalError;

/// `previous_hash` of the first journal entry.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A committed ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// The bootstrap admin seeded at ledger creation. Entry 0 only.
    Bootstrap {
        /// The seeded admin.
        admin: Address,
    },
    /// An admin added by an existing admin.
    AdminAdded {
        /// The new admin.
        admin: Address,
    },
    /// A certificate issued by the entry's caller.
    CertificateIssued {
        /// Identifier allocated to the record.
        id: CertificateId,
        /// Validated certificate content.
        draft: CertificateDraft,
    },
    /// A valid certificate marked invalid.
    CertificateRevoked {
        /// The revoked record.
        id: CertificateId,
    },
}

impl LedgerEvent {
    /// Stable snake_case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bootstrap { .. } => "bootstrap",
            Self::AdminAdded { .. } => "admin_added",
            Self::CertificateIssued { .. } => "certificate_issued",
            Self::CertificateRevoked { .. } => "certificate_revoked",
        }
    }
}

/// One hash-chained journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Dense sequence number, 0 for the bootstrap.
    pub seq: u64,
    /// Commit time, millisecond precision.
    pub recorded_at: DateTime<Utc>,
    /// The account that made the call. `None` only for the bootstrap.
    pub caller: Option<Address>,
    /// The committed mutation.
    pub event: LedgerEvent,
    /// Hash of the preceding entry, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// Hex SHA-256 of this entry.
    pub entry_hash: String,
}

impl JournalEntry {
    /// Build an entry and compute its hash.
    pub fn seal(
        seq: u64,
        recorded_at: DateTime<Utc>,
        caller: Option<Address>,
        event: LedgerEvent,
        previous_hash: String,
    ) -> Result<Self, JournalError> {
        let mut entry = Self {
            seq,
            recorded_at,
            caller,
            event,
            previous_hash,
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// Recompute the hash from the entry's contents.
    pub fn compute_hash(&self) -> Result<String, JournalError> {
        let payload = serde_json::to_string(&self.event).map_err(|e| JournalError::Encoding {
            seq: self.seq,
            reason: e.to_string(),
        })?;
        let caller = self.caller.as_ref().map(Address::as_str).unwrap_or("");
        let input = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.previous_hash,
            self.seq,
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            caller,
            self.event.kind(),
            payload,
        );
        Ok(sha256_hex(&input))
    }
}

/// Commit timestamp with the millisecond precision the journal stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// The in-memory journal owned by the registry.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number of the next entry.
    pub fn next_seq(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.seq + 1)
    }

    /// Hash the next entry must link to.
    pub fn head_hash(&self) -> &str {
        self.entries
            .last()
            .map_or(GENESIS_HASH, |e| e.entry_hash.as_str())
    }

    /// Up to `limit` entries starting at sequence `from`.
    pub fn entries(&self, from: u64, limit: usize) -> &[JournalEntry] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        let end = start.saturating_add(limit).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Every entry in sequence order.
    pub fn all(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Check that `entry` is the correct continuation of this journal.
    pub(crate) fn check_next(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let expected = self.next_seq();
        if entry.seq != expected {
            return Err(JournalError::OutOfSequence {
                expected,
                actual: entry.seq,
            });
        }
        if entry.previous_hash != self.head_hash() {
            return Err(JournalError::BrokenLink { seq: entry.seq });
        }
        if entry.compute_hash()? != entry.entry_hash {
            return Err(JournalError::HashMismatch { seq: entry.seq });
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    /// Number of entries examined.
    pub total_entries: usize,
    /// Sequence number of the first entry that breaks the chain.
    pub first_broken: Option<u64>,
    /// `true` when every entry checks out.
    pub chain_valid: bool,
}

/// Recompute every hash and link of `entries`, in order.
pub fn verify_chain(entries: &[JournalEntry]) -> ChainReport {
    let mut previous = GENESIS_HASH;
    let mut first_broken = None;
    for (index, entry) in entries.iter().enumerate() {
        let in_sequence = u64::try_from(index).is_ok_and(|i| i == entry.seq);
        let linked = entry.previous_hash == previous;
        let hash_ok = entry.compute_hash().is_ok_and(|hash| hash == entry.entry_hash);
        if !(in_sequence && linked && hash_ok) {
            first_broken = Some(entry.seq);
            break;
        }
        previous = &entry.entry_hash;
    }
    ChainReport {
        total_entries: entries.len(),
        first_broken,
        chain_valid: first_broken.is_none(),
    }
}
