//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers the registry works with.
//! An [`Address`] names an account (an admin, an issuer or a student); a
//! [`CertificateId`] names one certificate record. You cannot pass one where
//! the other is expected.
//!
//! ## Numeric bounds
//!
//! Downstream consumers read identifiers, years and scores through
//! floating-point-backed number types, so every integer crossing the
//! registry boundary must stay at or below [`MAX_SAFE_INTEGER`] (2^53 - 1).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest integer exactly representable as an IEEE-754 double (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Maximum length of an [`Address`] in bytes.
pub const MAX_ADDRESS_LEN: usize = 128;

/// Reject `value` if it exceeds [`MAX_SAFE_INTEGER`].
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] naming `field`.
pub fn check_safe_integer(field: &'static str, value: u64) -> Result<u64, ValidationError> {
    check_integer_range(field, i128::from(value))
}

/// Narrow a signed wire value to `0..=MAX_SAFE_INTEGER`.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] naming `field` for negative
/// values and values above [`MAX_SAFE_INTEGER`].
pub fn check_integer_range(field: &'static str, value: i128) -> Result<u64, ValidationError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_SAFE_INTEGER)
        .ok_or(ValidationError::OutOfRange {
            field,
            value,
            min: 0,
            max: MAX_SAFE_INTEGER,
        })
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account address: the identity of a caller or of a student.
///
/// # Validation
///
/// - Surrounding whitespace is trimmed
/// - 1 to 128 characters, each in `[A-Za-z0-9_.:-]`
///
/// # Canonical form
///
/// Ethereum-style addresses (`0x` followed by exactly 40 hex digits) are
/// lowercased, so the checksummed spelling `0xAbC...` and the lowercase
/// spelling `0xabc...` compare equal. All other accepted forms are kept
/// verbatim and compare case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address from a string, validating and canonicalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] if the trimmed string is
    /// empty, longer than [`MAX_ADDRESS_LEN`], or contains a character
    /// outside `[A-Za-z0-9_.:-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_ADDRESS_LEN
            || !trimmed.chars().all(is_address_char)
        {
            return Err(ValidationError::InvalidAddress(raw));
        }
        if is_hex_account(trimmed) {
            return Ok(Self(trimmed.to_ascii_lowercase()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the canonical address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_address_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')
}

/// `0x` followed by exactly 40 hex digits.
fn is_hex_account(s: &str) -> bool {
    let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CertificateId
// ---------------------------------------------------------------------------

/// Sequential certificate identifier.
///
/// Identifiers are allocated densely starting at [`CertificateId::GENESIS`]
/// and are never reused. The value is always at most [`MAX_SAFE_INTEGER`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct CertificateId(u64);

impl CertificateId {
    /// The identifier of the first certificate ever issued.
    pub const GENESIS: Self = Self(0);

    /// Create an identifier from a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if `value` exceeds
    /// [`MAX_SAFE_INTEGER`].
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        check_safe_integer("id", value).map(Self)
    }

    /// The raw identifier value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The identifier allocated after this one, or `None` once the safe
    /// integer range is exhausted.
    pub fn next(self) -> Option<Self> {
        let next = self.0.checked_add(1)?;
        (next <= MAX_SAFE_INTEGER).then_some(Self(next))
    }
}

impl TryFrom<u64> for CertificateId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CertificateId> for u64 {
    fn from(id: CertificateId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Address --

    #[test]
    fn address_accepts_free_form_account_names() {
        assert_eq!(Address::new("0xStudent1").unwrap().as_str(), "0xStudent1");
        assert!(Address::new("did:key:z6Mkh").is_ok());
        assert!(Address::new("alice.example-1_b").is_ok());
    }

    #[test]
    fn address_trims_surrounding_whitespace() {
        assert_eq!(Address::new("  0xStudent1\n").unwrap().as_str(), "0xStudent1");
    }

    #[test]
    fn address_canonicalizes_hex_accounts() {
        let checksummed = Address::new("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
        let lower = Address::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
        assert_eq!(checksummed, lower);
        assert_eq!(lower.as_str(), "0x70997970c51812dc3a010c7d01b50e0d17dc79c8");
    }

    #[test]
    fn address_non_hex_forms_are_case_sensitive() {
        assert_ne!(Address::new("0xStudent1").unwrap(), Address::new("0xstudent1").unwrap());
    }

    #[test]
    fn address_rejects_malformed() {
        assert!(Address::new("").is_err());
        assert!(Address::new("   ").is_err());
        assert!(Address::new("has space").is_err());
        assert!(Address::new("slash/name").is_err());
        assert!(Address::new("a".repeat(MAX_ADDRESS_LEN + 1)).is_err());
        assert!(Address::new("a".repeat(MAX_ADDRESS_LEN)).is_ok());
    }

    #[test]
    fn address_serde_validates() {
        let ok: Address = serde_json::from_str("\"0xStudent1\"").unwrap();
        assert_eq!(ok.as_str(), "0xStudent1");
        assert!(serde_json::from_str::<Address>("\"bad address\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"0xStudent1\"");
    }

    // -- CertificateId --

    #[test]
    fn certificate_id_bounds() {
        assert!(CertificateId::new(MAX_SAFE_INTEGER).is_ok());
        assert!(CertificateId::new(MAX_SAFE_INTEGER + 1).is_err());
    }

    #[test]
    fn certificate_id_next_is_dense() {
        let first = CertificateId::GENESIS;
        assert_eq!(first.value(), 0);
        assert_eq!(first.next().map(CertificateId::value), Some(1));
        let last = CertificateId::new(MAX_SAFE_INTEGER).unwrap();
        assert_eq!(last.next(), None);
    }

    #[test]
    fn certificate_id_serializes_as_integer() {
        let id = CertificateId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: CertificateId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<CertificateId>("9007199254740992").is_err());
    }

    #[test]
    fn check_safe_integer_boundary() {
        assert_eq!(check_safe_integer("year", 2024), Ok(2024));
        assert!(check_safe_integer("year", MAX_SAFE_INTEGER + 1).is_err());
    }

    #[test]
    fn check_integer_range_rejects_negatives() {
        assert_eq!(check_integer_range("score", 0), Ok(0));
        assert_eq!(
            check_integer_range("score", -5),
            Err(ValidationError::OutOfRange {
                field: "score",
                value: -5,
                min: 0,
                max: MAX_SAFE_INTEGER,
            })
        );
        assert!(check_integer_range("score", i128::from(MAX_SAFE_INTEGER) + 1).is_err());
    }

    proptest::proptest! {
        #[test]
        fn hex_accounts_compare_case_insensitively(bytes in proptest::array::uniform20(0u8..)) {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let lower = Address::new(format!("0x{hex}")).unwrap();
            let upper = Address::new(format!("0x{}", hex.to_ascii_uppercase())).unwrap();
            proptest::prop_assert_eq!(lower, upper);
        }
    }
}
