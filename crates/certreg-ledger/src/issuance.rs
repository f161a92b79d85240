//! # Issuance
//!
//! `newCertificate`: an admin creates a record with the next sequential
//! identifier, `valid = true`, and itself as issuer. Duplicate
//! (student name, certificate name) pairs are allowed and form distinct
//! records. A rejected call allocates nothing.

use certreg_core::{Address, CertificateDraft, CertificateId};

use crate::error::LedgerError;
use crate::journal::{JournalEntry, LedgerEvent};
use crate::registry::CertificateRegistry;

impl CertificateRegistry {
    /// Prepare `newCertificate`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] when `caller` is not an admin.
    /// - [`LedgerError::InvalidArgument`] when the draft fails validation.
    /// - [`LedgerError::CapacityExhausted`] when no identifier is left.
    pub fn prepare_new_certificate(
        &self,
        caller: &Address,
        draft: CertificateDraft,
    ) -> Result<JournalEntry, LedgerError> {
        self.admins.gate().check(caller)?;
        draft.validate()?;
        let id = self.store.next_id()?;
        self.seal(caller, LedgerEvent::CertificateIssued { id, draft })
    }

    /// `newCertificate`: issue a certificate and return its identifier.
    pub fn new_certificate(
        &mut self,
        caller: &Address,
        draft: CertificateDraft,
    ) -> Result<CertificateId, LedgerError> {
        let entry = self.prepare_new_certificate(caller, draft)?;
        let id = issued_id(&entry).ok_or(LedgerError::CapacityExhausted)?;
        self.apply(entry)?;
        Ok(id)
    }
}

/// The identifier allocated by an issuance entry.
pub fn issued_id(entry: &JournalEntry) -> Option<CertificateId> {
    match &entry.event {
        LedgerEvent::CertificateIssued { id, .. } => Some(*id),
        _ => None,
    }
}
