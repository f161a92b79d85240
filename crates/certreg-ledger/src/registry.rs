//! # Certificate Registry
//!
//! [`CertificateRegistry`] is the single aggregate owning the admin set, the
//! certificate store and the journal. Nothing outside this crate can reach
//! the containers directly; all state changes go through [`apply`].
//!
//! ## Commit protocol
//!
//! Every mutation is split in two phases:
//!
//! 1. `prepare_*` runs the access gate and argument validation against the
//!    current state and returns the [`JournalEntry`] that would commit the
//!    mutation, or `None` for an idempotent no-op. It never mutates.
//! 2. [`apply`] re-checks the entry against the journal head and the ledger
//!    rules, then commits it. All checks run before the first write, so a
//!    rejected entry leaves the registry untouched.
//!
//! A service that persists entries runs prepare, persists, then applies,
//! under one writer lock. The convenience methods (`add_admin`,
//! `new_certificate`, `revoke_certificate`) do both phases in one call.
//!
//! [`apply`]: CertificateRegistry::apply

use certreg_core::{Address, Certificate};

use crate::admin::AdminSet;
use crate::error::{JournalError, LedgerError};
use crate::journal::{self, Journal, JournalEntry, LedgerEvent};
use crate::store::CertificateStore;

/// The ledger: admin set, certificate store and journal.
#[derive(Debug, Clone)]
pub struct CertificateRegistry {
    pub(crate) admins: AdminSet,
    pub(crate) store: CertificateStore,
    pub(crate) journal: Journal,
}

impl CertificateRegistry {
    fn empty() -> Self {
        Self {
            admins: AdminSet::new(),
            store: CertificateStore::new(),
            journal: Journal::new(),
        }
    }

    /// Create a ledger whose only admin is `bootstrap_admin`.
    ///
    /// This is the one mutation exempt from the admin-only precondition; it
    /// is recorded as journal entry 0 with no caller.
    pub fn genesis(bootstrap_admin: Address) -> Result<Self, LedgerError> {
        let mut registry = Self::empty();
        let entry = JournalEntry::seal(
            0,
            journal::now(),
            None,
            LedgerEvent::Bootstrap {
                admin: bootstrap_admin,
            },
            journal::GENESIS_HASH.to_string(),
        )?;
        registry.apply(entry)?;
        Ok(registry)
    }

    /// Rebuild a ledger from a journal, checking every link and rule.
    ///
    /// # Errors
    ///
    /// Fails on an empty journal, a journal not starting with a bootstrap,
    /// a broken hash chain, or any entry the ledger would have rejected.
    pub fn replay(entries: impl IntoIterator<Item = JournalEntry>) -> Result<Self, LedgerError> {
        let mut registry = Self::empty();
        for entry in entries {
            registry.apply(entry)?;
        }
        if registry.journal.is_empty() {
            return Err(JournalError::MissingGenesis.into());
        }
        Ok(registry)
    }

    /// The bootstrap admin recorded in journal entry 0.
    pub fn bootstrap_admin(&self) -> Option<&Address> {
        match self.journal.all().first().map(|e| &e.event) {
            Some(LedgerEvent::Bootstrap { admin }) => Some(admin),
            _ => None,
        }
    }

    /// Commit a prepared or replayed journal entry.
    pub fn apply(&mut self, entry: JournalEntry) -> Result<(), LedgerError> {
        self.journal.check_next(&entry)?;
        self.check_event(entry.seq, entry.caller.as_ref(), &entry.event)?;
        self.commit_event(entry.caller.as_ref(), &entry.event);
        self.journal.push(entry);
        Ok(())
    }

    /// Validate `event` as if `caller` made it now. Never mutates.
    fn check_event(
        &self,
        seq: u64,
        caller: Option<&Address>,
        event: &LedgerEvent,
    ) -> Result<(), LedgerError> {
        if let LedgerEvent::Bootstrap { .. } = event {
            if !self.journal.is_empty() {
                return Err(LedgerError::AlreadyBootstrapped);
            }
            if caller.is_some() {
                return Err(JournalError::InvalidCaller { seq }.into());
            }
            return Ok(());
        }

        if self.journal.is_empty() {
            return Err(JournalError::MissingGenesis.into());
        }
        let caller = caller.ok_or(JournalError::InvalidCaller { seq })?;
        self.admins.gate().check(caller)?;

        match event {
            LedgerEvent::Bootstrap { .. } | LedgerEvent::AdminAdded { .. } => Ok(()),
            LedgerEvent::CertificateIssued { id, draft } => {
                draft.validate()?;
                let expected = self.store.next_id()?;
                if *id != expected {
                    return Err(JournalError::IdMismatch {
                        seq,
                        expected,
                        actual: *id,
                    }
                    .into());
                }
                Ok(())
            }
            LedgerEvent::CertificateRevoked { id } => {
                if self.store.contains(*id) {
                    Ok(())
                } else {
                    Err(LedgerError::NotFound(*id))
                }
            }
        }
    }

    /// Write a checked event into the admin set or store.
    fn commit_event(&mut self, caller: Option<&Address>, event: &LedgerEvent) {
        match event {
            LedgerEvent::Bootstrap { admin } | LedgerEvent::AdminAdded { admin } => {
                self.admins.insert(admin.clone());
            }
            LedgerEvent::CertificateIssued { id, draft } => {
                if let Some(issuer) = caller {
                    self.store
                        .append(Certificate::issue(*id, draft.clone(), issuer.clone()));
                }
            }
            LedgerEvent::CertificateRevoked { id } => {
                // Existence was checked; a repeat revocation changes nothing.
                let _ = self.store.revoke(*id);
            }
        }
    }

    /// Seal `event` as the next journal entry, attributed to `caller`.
    pub(crate) fn seal(
        &self,
        caller: &Address,
        event: LedgerEvent,
    ) -> Result<JournalEntry, LedgerError> {
        let seq = self.journal.next_seq();
        self.check_event(seq, Some(caller), &event)?;
        Ok(JournalEntry::seal(
            seq,
            journal::now(),
            Some(caller.clone()),
            event,
            self.journal.head_hash().to_string(),
        )?)
    }

    // -- AdminSet ------------------------------------------------------------

    /// Prepare `addAdmin`. `Ok(None)` when `candidate` is already an admin.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] when `caller` is not an admin.
    pub fn prepare_add_admin(
        &self,
        caller: &Address,
        candidate: Address,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        self.admins.gate().check(caller)?;
        if self.admins.contains(&candidate) {
            return Ok(None);
        }
        self.seal(caller, LedgerEvent::AdminAdded { admin: candidate })
            .map(Some)
    }

    /// `addAdmin`: grant admin rights to `candidate`. Idempotent.
    pub fn add_admin(&mut self, caller: &Address, candidate: Address) -> Result<(), LedgerError> {
        if let Some(entry) = self.prepare_add_admin(caller, candidate)? {
            self.apply(entry)?;
        }
        Ok(())
    }

    /// `isAdmin`: current membership of `address`.
    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    /// The current admin set.
    pub fn admins(&self) -> &AdminSet {
        &self.admins
    }

    /// The journal of every committed mutation.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::CertificateDraft;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn genesis_seeds_exactly_one_admin() {
        let registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        assert!(registry.is_admin(&addr("0xA0")));
        assert_eq!(registry.admins().len(), 1);
        assert_eq!(registry.bootstrap_admin(), Some(&addr("0xA0")));
        assert_eq!(registry.journal().len(), 1);
        assert_eq!(registry.journal().all()[0].caller, None);
    }

    #[test]
    fn bootstrap_cannot_be_repeated() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        let entry = JournalEntry::seal(
            1,
            journal::now(),
            None,
            LedgerEvent::Bootstrap { admin: addr("0xEve") },
            registry.journal().head_hash().to_string(),
        )
        .unwrap();
        assert_eq!(registry.apply(entry), Err(LedgerError::AlreadyBootstrapped));
        assert!(!registry.is_admin(&addr("0xEve")));
    }

    #[test]
    fn admin_can_add_admin() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xAdmin2")).unwrap();
        assert!(registry.is_admin(&addr("0xAdmin2")));
        assert_eq!(registry.journal().len(), 2);
    }

    #[test]
    fn non_admin_cannot_add_admin() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        let err = registry.add_admin(&addr("0xB"), addr("0xB")).unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: addr("0xB") });
        assert!(!registry.is_admin(&addr("0xB")));
        assert_eq!(registry.journal().len(), 1);
    }

    #[test]
    fn re_adding_admin_is_a_silent_no_op() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xAdmin2")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xAdmin2")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xA0")).unwrap();
        assert_eq!(registry.admins().len(), 2);
        assert_eq!(registry.journal().len(), 2);
    }

    #[test]
    fn replay_rebuilds_identical_state() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xA1")).unwrap();
        let draft =
            CertificateDraft::new("Alice", "CS101", 2024, 95, addr("0xStudent1")).unwrap();
        let id = registry.new_certificate(&addr("0xA1"), draft).unwrap();
        registry.revoke_certificate(&addr("0xA0"), id).unwrap();

        let replayed = CertificateRegistry::replay(registry.journal().all().to_vec()).unwrap();
        assert_eq!(replayed.admins(), registry.admins());
        assert_eq!(
            replayed.certificates_by_address(&addr("0xStudent1")),
            registry.certificates_by_address(&addr("0xStudent1"))
        );
        assert_eq!(replayed.journal().head_hash(), registry.journal().head_hash());
    }

    #[test]
    fn replay_rejects_empty_journal() {
        let err = CertificateRegistry::replay(Vec::new()).unwrap_err();
        assert_eq!(err, LedgerError::Journal(JournalError::MissingGenesis));
    }

    #[test]
    fn replay_rejects_journal_without_bootstrap() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xA1")).unwrap();
        let tail = registry.journal().all()[1..].to_vec();
        assert!(CertificateRegistry::replay(tail).is_err());
    }

    #[test]
    fn replay_rejects_tampered_entry() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        registry.add_admin(&addr("0xA0"), addr("0xA1")).unwrap();
        let mut entries = registry.journal().all().to_vec();
        entries[1].event = LedgerEvent::AdminAdded { admin: addr("0xMallory") };
        assert_eq!(
            CertificateRegistry::replay(entries).unwrap_err(),
            LedgerError::Journal(JournalError::HashMismatch { seq: 1 })
        );
    }

    #[test]
    fn replay_rejects_entry_from_non_admin() {
        let registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        let forged = JournalEntry::seal(
            1,
            journal::now(),
            Some(addr("0xEve")),
            LedgerEvent::AdminAdded { admin: addr("0xEve") },
            registry.journal().head_hash().to_string(),
        )
        .unwrap();
        let mut entries = registry.journal().all().to_vec();
        entries.push(forged);
        assert_eq!(
            CertificateRegistry::replay(entries).unwrap_err(),
            LedgerError::Unauthorized { caller: addr("0xEve") }
        );
    }

    #[test]
    fn stale_prepared_entry_is_rejected() {
        let mut registry = CertificateRegistry::genesis(addr("0xA0")).unwrap();
        let first = registry
            .prepare_add_admin(&addr("0xA0"), addr("0xA1"))
            .unwrap()
            .unwrap();
        let second = registry
            .prepare_add_admin(&addr("0xA0"), addr("0xA2"))
            .unwrap()
            .unwrap();
        registry.apply(first).unwrap();
        assert!(matches!(
            registry.apply(second),
            Err(LedgerError::Journal(JournalError::OutOfSequence { .. }))
        ));
        assert!(!registry.is_admin(&addr("0xA2")));
    }
}
