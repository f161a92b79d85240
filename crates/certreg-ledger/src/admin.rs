//! # Admin Set and Access Gate
//!
//! The [`AdminSet`] holds the accounts allowed to issue and revoke
//! certificates. Membership is grow-only: nothing in the ledger removes an
//! admin. The [`AccessGate`] is the single check every mutating operation
//! runs before touching ledger state.

use std::collections::BTreeSet;

use certreg_core::Address;

use crate::error::LedgerError;

/// Grow-only set of admin accounts. Absent means "not an admin".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSet {
    members: BTreeSet<Address>,
}

impl AdminSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `address` is currently an admin.
    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Add `address`. Returns `false` if it was already a member.
    pub(crate) fn insert(&mut self, address: Address) -> bool {
        self.members.insert(address)
    }

    /// Number of admins.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no admin has been seeded yet.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The guard for mutating operations against this set.
    pub fn gate(&self) -> AccessGate<'_> {
        AccessGate { admins: self }
    }
}

/// Admin-membership check evaluated before every mutation.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate<'a> {
    admins: &'a AdminSet,
}

impl AccessGate<'_> {
    /// Admit `caller` if it is an admin.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] otherwise.
    pub fn check(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.admins.contains(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }
}
