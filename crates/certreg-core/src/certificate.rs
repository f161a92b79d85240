//! # Certificate Records
//!
//! [`CertificateDraft`] is the caller-supplied part of a certificate: the two
//! free-text names, year, score, and student address. [`Certificate`] is the
//! stored record: a draft plus the allocated identifier, the issuing admin,
//! and the validity flag.
//!
//! Every field of a [`Certificate`] is fixed at issuance except `valid`, which
//! can only move from `true` to `false` through [`Certificate::revoke`].
//! Fields are private and exposed through accessors to keep it that way.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{check_safe_integer, Address, CertificateId};

/// Maximum length in bytes of `studentName` and `certificateName`.
pub const MAX_NAME_LEN: usize = 256;

/// Caller-supplied certificate content, validated before issuance.
///
/// Names are stored exactly as supplied: no trimming, no case folding.
/// Verification later matches them by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDraft {
    /// Name of the student as printed on the certificate.
    pub student_name: String,
    /// Course or qualification name.
    pub certificate_name: String,
    /// Year of award.
    pub year: u64,
    /// Achieved score.
    pub score: u64,
    /// Address the certificate is filed under.
    pub student: Address,
}

impl CertificateDraft {
    /// Build a draft, validating every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a name is empty, longer than
    /// [`MAX_NAME_LEN`] or contains a NUL character, or if `year` or `score`
    /// exceeds the safe integer range.
    pub fn new(
        student_name: impl Into<String>,
        certificate_name: impl Into<String>,
        year: u64,
        score: u64,
        student: Address,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            student_name: student_name.into(),
            certificate_name: certificate_name.into(),
            year,
            score,
            student,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Check the field constraints.
    ///
    /// Drafts decoded from the wire or from a persisted journal bypass
    /// [`CertificateDraft::new`]; the ledger calls this before accepting one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_name("studentName", &self.student_name)?;
        check_name("certificateName", &self.certificate_name)?;
        check_safe_integer("year", self.year)?;
        check_safe_integer("score", self.score)?;
        Ok(())
    }
}

fn check_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_NAME_LEN,
            actual: value.len(),
        });
    }
    if value.contains('\0') {
        return Err(ValidationError::NulCharacter { field });
    }
    Ok(())
}

/// A stored certificate record.
///
/// Serializes with the camelCase field names consumers of the registry
/// expect: `id`, `studentName`, `certificateName`, `year`, `score`,
/// `student`, `issuer`, `valid`. Records are only built by
/// [`Certificate::issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    id: CertificateId,
    student_name: String,
    certificate_name: String,
    year: u64,
    score: u64,
    student: Address,
    issuer: Address,
    valid: bool,
}

impl Certificate {
    /// Create a freshly issued, valid certificate.
    pub fn issue(id: CertificateId, draft: CertificateDraft, issuer: Address) -> Self {
        Self {
            id,
            student_name: draft.student_name,
            certificate_name: draft.certificate_name,
            year: draft.year,
            score: draft.score,
            student: draft.student,
            issuer,
            valid: true,
        }
    }

    /// Allocated identifier.
    pub fn id(&self) -> CertificateId {
        self.id
    }

    /// Student name, verbatim.
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    /// Certificate name, verbatim.
    pub fn certificate_name(&self) -> &str {
        &self.certificate_name
    }

    /// Year of award.
    pub fn year(&self) -> u64 {
        self.year
    }

    /// Achieved score.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Address the certificate is filed under.
    pub fn student(&self) -> &Address {
        &self.student
    }

    /// Admin that issued the certificate.
    pub fn issuer(&self) -> &Address {
        &self.issuer
    }

    /// `false` once revoked.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the certificate invalid.
    ///
    /// Returns `true` if this call changed the flag, `false` if the
    /// certificate was already revoked. There is no inverse operation.
    pub fn revoke(&mut self) -> bool {
        std::mem::replace(&mut self.valid, false)
    }
}
