//! # Ledger Bootstrap
//!
//! Builds the in-memory ledger at startup.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load the journal** from Postgres, when a pool is configured.
//! 2. **Replay** it if it is non-empty. The persisted journal is
//!    authoritative: configured bootstrap and seed admins are ignored.
//! 3. Otherwise **genesis**: the bootstrap admin becomes the first admin,
//!    then grants each seed admin through an ordinary `addAdmin` call.
//! 4. **Persist** the genesis entries in one transaction.

use sqlx::PgPool;

use certreg_core::Address;
use certreg_ledger::{CertificateRegistry, LedgerError};

use crate::config::ServeConfig;
use crate::db;

/// Errors during ledger bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The journal could not be loaded or stored.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The journal does not replay, or genesis failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// A fresh ledger: `bootstrap_admin` first, then each seed admin granted by
/// the bootstrap admin. Seeds already present are skipped.
pub fn genesis_ledger(
    bootstrap_admin: &Address,
    seed_admins: &[Address],
) -> Result<CertificateRegistry, LedgerError> {
    let mut registry = CertificateRegistry::genesis(bootstrap_admin.clone())?;
    for seed in seed_admins {
        registry.add_admin(bootstrap_admin, seed.clone())?;
    }
    Ok(registry)
}

/// Load or create the ledger.
pub async fn bootstrap(
    config: &ServeConfig,
    db_pool: Option<&PgPool>,
) -> Result<CertificateRegistry, BootstrapError> {
    if let Some(pool) = db_pool {
        let entries = db::journal::load_all(pool).await?;
        if !entries.is_empty() {
            let count = entries.len();
            let registry = CertificateRegistry::replay(entries)?;
            if registry.bootstrap_admin() != Some(&config.bootstrap_admin) {
                tracing::warn!(
                    configured = %config.bootstrap_admin,
                    persisted = ?registry.bootstrap_admin().map(Address::as_str),
                    "configured bootstrap admin differs from the persisted journal; using the journal"
                );
            }
            if !config.seed_admins.is_empty() {
                tracing::info!("journal already exists, seed admins not applied");
            }
            tracing::info!(
                entries = count,
                admins = registry.admins().len(),
                certificates = registry.certificate_count(),
                "ledger replayed from journal"
            );
            return Ok(registry);
        }
    }

    let registry = genesis_ledger(&config.bootstrap_admin, &config.seed_admins)?;

    if let Some(pool) = db_pool {
        db::journal::append_all(pool, registry.journal().all()).await?;
    }

    tracing::info!(
        bootstrap_admin = %config.bootstrap_admin,
        admins = registry.admins().len(),
        "ledger created at genesis"
    );
    Ok(registry)
}
