//! # Certificate Store
//!
//! Append-only collection of certificate records. Identifiers are dense from
//! [`CertificateId::GENESIS`], so a record's identifier is also its position
//! in the backing vector.
//!
//! Two secondary indexes are maintained on every write:
//!
//! - student address → identifiers in issuance order, for per-student queries;
//! - (student name, certificate name) → identifiers of the records that are
//!   still valid, so verification never scans the whole store.

use std::collections::{BTreeSet, HashMap};

use certreg_core::{Address, Certificate, CertificateId};

use crate::error::LedgerError;

/// Certificate records plus their lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct CertificateStore {
    records: Vec<Certificate>,
    by_student: HashMap<Address, Vec<CertificateId>>,
    valid_by_name: HashMap<String, HashMap<String, BTreeSet<CertificateId>>>,
}

impl CertificateStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier the next appended record must carry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CapacityExhausted`] once the safe integer range
    /// is used up.
    pub fn next_id(&self) -> Result<CertificateId, LedgerError> {
        match self.records.last() {
            None => Ok(CertificateId::GENESIS),
            Some(last) => last.id().next().ok_or(LedgerError::CapacityExhausted),
        }
    }

    /// Append a freshly issued record. The caller has already checked that
    /// `certificate.id()` equals [`CertificateStore::next_id`].
    pub(crate) fn append(&mut self, certificate: Certificate) {
        debug_assert_eq!(self.next_id().ok(), Some(certificate.id()));
        let id = certificate.id();
        self.by_student
            .entry(certificate.student().clone())
            .or_default()
            .push(id);
        if certificate.is_valid() {
            self.valid_by_name
                .entry(certificate.student_name().to_string())
                .or_default()
                .entry(certificate.certificate_name().to_string())
                .or_default()
                .insert(id);
        }
        self.records.push(certificate);
    }

    /// The record with identifier `id`, if issued.
    pub fn get(&self, id: CertificateId) -> Option<&Certificate> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.records.get(index))
    }

    /// Whether `id` has been issued.
    pub fn contains(&self, id: CertificateId) -> bool {
        self.get(id).is_some()
    }

    /// Mark a record invalid. Returns `true` if the flag changed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no record has this identifier.
    pub(crate) fn revoke(&mut self, id: CertificateId) -> Result<bool, LedgerError> {
        let certificate = usize::try_from(id.value())
            .ok()
            .and_then(|index| self.records.get_mut(index))
            .ok_or(LedgerError::NotFound(id))?;
        if !certificate.revoke() {
            return Ok(false);
        }
        if let Some(by_cert) = self.valid_by_name.get_mut(certificate.student_name()) {
            if let Some(ids) = by_cert.get_mut(certificate.certificate_name()) {
                ids.remove(&id);
                if ids.is_empty() {
                    by_cert.remove(certificate.certificate_name());
                }
            }
            if by_cert.is_empty() {
                self.valid_by_name.remove(certificate.student_name());
            }
        }
        Ok(true)
    }

    /// Every record of `student`, valid or revoked, in ascending id order.
    pub fn by_student(&self, student: &Address) -> Vec<Certificate> {
        self.by_student
            .get(student)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).cloned().collect())
            .unwrap_or_default()
    }

    /// Whether some still-valid record carries exactly these names.
    pub fn has_valid(&self, student_name: &str, certificate_name: &str) -> bool {
        self.valid_by_name
            .get(student_name)
            .and_then(|by_cert| by_cert.get(certificate_name))
            .is_some_and(|ids| !ids.is_empty())
    }

    /// Number of records ever issued.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been issued.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
