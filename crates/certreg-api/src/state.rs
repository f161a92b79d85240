//! # Application State
//!
//! Shared state for the Axum application: the ledger behind a
//! `parking_lot::RwLock`, an async writer lock that serializes mutations,
//! the optional database pool, and the metrics handle.
//!
//! ## Commit protocol
//!
//! Every mutation runs under the writer lock in three steps:
//!
//! 1. **Prepare** against a shared read of the ledger. Access and argument
//!    checks run here and a journal entry is sealed. Nothing changes.
//! 2. **Persist** the entry to Postgres, when configured.
//! 3. **Apply** the entry to the in-memory ledger.
//!
//! A failure in step 1 or 2 leaves both the database and the ledger as they
//! were. When the driver reports an append error, the head row is re-read:
//! if it is the prepared entry, the INSERT did commit and step 3 proceeds.
//! Readers never observe a half-applied mutation. The `parking_lot`
//! guards are never held across an `.await`.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use sqlx::PgPool;

use certreg_ledger::{CertificateRegistry, JournalEntry, LedgerError};

use crate::auth::AuthConfig;
use crate::db;
use crate::error::AppError;
use crate::middleware::metrics::{record_commit, record_rejection};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<RwLock<CertificateRegistry>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    /// Postgres pool. `None` in in-memory mode.
    pub db_pool: Option<PgPool>,
    pub auth: AuthConfig,
    /// Prometheus handle. `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wrap a bootstrapped ledger. In-memory, no credentials, no metrics.
    pub fn new(registry: CertificateRegistry) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(registry)),
            writer: Arc::new(tokio::sync::Mutex::new(())),
            db_pool: None,
            auth: AuthConfig::default(),
            metrics: None,
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_db(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Run a read-only closure against the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&CertificateRegistry) -> R) -> R {
        f(&*self.ledger.read())
    }

    /// Commit one mutation. `prepare` returns the sealed entry, or `None`
    /// when the call is a no-op. Returns the committed entry.
    pub async fn commit<F>(&self, prepare: F) -> Result<Option<JournalEntry>, AppError>
    where
        F: FnOnce(&CertificateRegistry) -> Result<Option<JournalEntry>, LedgerError> + Send,
    {
        let _writer = self.writer.lock().await;

        let prepared = {
            let ledger = self.ledger.read();
            prepare(&*ledger)
        };

        let entry = match prepared {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(None),
            Err(err) => {
                record_rejection(&err);
                tracing::warn!(error = %err, "ledger mutation rejected");
                return Err(err.into());
            }
        };

        if let Some(pool) = &self.db_pool {
            if let Err(err) = db::journal::append(pool, &entry).await {
                match db::journal::load_head(pool).await {
                    Ok(head) if persisted_despite_error(head.as_ref(), &entry) => {
                        tracing::warn!(
                            seq = entry.seq,
                            error = %err,
                            "journal append reported an error but the entry is stored"
                        );
                    }
                    head => {
                        if let Err(reread) = head {
                            tracing::error!(
                                seq = entry.seq,
                                error = %reread,
                                "failed to re-read journal head"
                            );
                        }
                        tracing::error!(
                            seq = entry.seq,
                            error = %err,
                            "failed to persist journal entry"
                        );
                        return Err(AppError::Internal(format!(
                            "failed to persist journal entry {}: {err}",
                            entry.seq
                        )));
                    }
                }
            }
        }

        if let Err(err) = self.ledger.write().apply(entry.clone()) {
            tracing::error!(seq = entry.seq, error = %err, "sealed journal entry failed to apply");
            return Err(AppError::Internal(err.to_string()));
        }

        record_commit(&entry.event);
        tracing::info!(
            seq = entry.seq,
            kind = entry.event.kind(),
            caller = entry.caller.as_ref().map(|c| c.as_str()).unwrap_or(""),
            "ledger mutation committed"
        );

        Ok(Some(entry))
    }
}

/// Whether the stored head row is `entry` itself.
fn persisted_despite_error(head: Option<&JournalEntry>, entry: &JournalEntry) -> bool {
    head.is_some_and(|head| head.seq == entry.seq && head.entry_hash == entry.entry_hash)
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("database", &self.db_pool.is_some())
            .field("auth", &self.auth)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
