//! # Verification and Queries
//!
//! Read-only operations. None of them consult the access gate and none of
//! them fail on valid input: absent state yields `false` or an empty list.

use certreg_core::{Address, Certificate, CertificateId};

use crate::error::LedgerError;
use crate::registry::CertificateRegistry;

impl CertificateRegistry {
    /// `verifyCertificate`: whether at least one still-valid record carries
    /// exactly `student_name` and `certificate_name`.
    ///
    /// Matching is byte-for-byte string equality, without case or
    /// whitespace normalization.
    pub fn verify_certificate(&self, student_name: &str, certificate_name: &str) -> bool {
        self.store.has_valid(student_name, certificate_name)
    }

    /// `getCertificatesByAddress`: every record of `student`, valid or
    /// revoked, in ascending id order.
    pub fn certificates_by_address(&self, student: &Address) -> Vec<Certificate> {
        self.store.by_student(student)
    }

    /// Look up one record by identifier.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown identifier.
    pub fn certificate(&self, id: CertificateId) -> Result<&Certificate, LedgerError> {
        self.store.get(id).ok_or(LedgerError::NotFound(id))
    }

    /// Number of certificates ever issued.
    pub fn certificate_count(&self) -> usize {
        self.store.len()
    }
}
