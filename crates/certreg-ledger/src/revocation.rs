//! # Revocation
//!
//! `revokeCertificate`: an admin marks an existing record invalid. The
//! transition is one-way. Revoking an already-revoked record succeeds
//! without effect. The access check runs first, so a non-admin learns
//! nothing about which identifiers exist.

use certreg_core::{Address, CertificateId};

use crate::error::LedgerError;
use crate::journal::{JournalEntry, LedgerEvent};
use crate::registry::CertificateRegistry;

impl CertificateRegistry {
    /// Prepare `revokeCertificate`. `Ok(None)` when already revoked.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] when `caller` is not an admin.
    /// - [`LedgerError::NotFound`] when `id` does not exist.
    pub fn prepare_revoke_certificate(
        &self,
        caller: &Address,
        id: CertificateId,
    ) -> Result<Option<JournalEntry>, LedgerError> {
        self.admins.gate().check(caller)?;
        let certificate = self.store.get(id).ok_or(LedgerError::NotFound(id))?;
        if !certificate.is_valid() {
            return Ok(None);
        }
        self.seal(caller, LedgerEvent::CertificateRevoked { id })
            .map(Some)
    }

    /// `revokeCertificate`: invalidate certificate `id`.
    pub fn revoke_certificate(
        &mut self,
        caller: &Address,
        id: CertificateId,
    ) -> Result<(), LedgerError> {
        if let Some(entry) = self.prepare_revoke_certificate(caller, id)? {
            self.apply(entry)?;
        }
        Ok(())
    }
}
