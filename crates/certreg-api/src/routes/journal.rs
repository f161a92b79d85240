//! # Journal API
//!
//! Read access to the hash-chained mutation journal, and an on-demand
//! integrity check of the whole chain.
//!
//! With Postgres configured the integrity check reads the stored rows, so
//! edits made to `ledger_journal` behind the service's back are reported.
//! In-memory mode checks the ledger's own journal.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use certreg_ledger::{verify_chain, JournalEntry};

use crate::db;
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

const DEFAULT_PAGE: usize = 100;
const MAX_PAGE: usize = 1000;

/// Paging parameters for the journal listing.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JournalQuery {
    /// First sequence number to return.
    pub from: Option<u64>,
    /// Maximum number of entries (default 100, at most 1000).
    pub limit: Option<usize>,
}

/// One journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryView {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    /// `None` only for the bootstrap entry.
    pub caller: Option<String>,
    pub kind: String,
    #[schema(value_type = Object)]
    pub event: serde_json::Value,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl TryFrom<&JournalEntry> for JournalEntryView {
    type Error = AppError;

    fn try_from(entry: &JournalEntry) -> Result<Self, Self::Error> {
        let event = serde_json::to_value(&entry.event)
            .map_err(|e| AppError::Internal(format!("journal event serialization: {e}")))?;
        Ok(Self {
            seq: entry.seq,
            recorded_at: entry.recorded_at,
            caller: entry.caller.as_ref().map(|c| c.to_string()),
            kind: entry.event.kind().to_string(),
            event,
            previous_hash: entry.previous_hash.clone(),
            entry_hash: entry.entry_hash.clone(),
        })
    }
}

/// A page of the journal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalPage {
    pub entries: Vec<JournalEntryView>,
    /// Sequence number the next committed entry will get.
    pub next_seq: u64,
    /// Hash of the latest entry.
    pub head_hash: String,
}

/// Result of the chain integrity check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainIntegrityResponse {
    pub total_entries: usize,
    /// First entry whose hash or link does not check out.
    pub first_broken: Option<u64>,
    pub chain_valid: bool,
}

/// Build the journal router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/journal", get(list_journal))
        .route("/v1/journal/verify", get(verify_journal))
}

/// GET /v1/journal: entries in sequence order, starting at `from`.
#[utoipa::path(
    get,
    path = "/v1/journal",
    params(JournalQuery),
    responses(
        (status = 200, description = "Journal page", body = JournalPage),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "journal"
)]
pub async fn list_journal(
    State(state): State<AppState>,
    query: Result<Query<JournalQuery>, QueryRejection>,
) -> Result<Json<JournalPage>, AppError> {
    let query = extract_query(query)?;
    let from = query.from.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);

    let page = state.read(|ledger| {
        let journal = ledger.journal();
        let entries = journal
            .entries(from, limit)
            .iter()
            .map(JournalEntryView::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok::<_, AppError>(JournalPage {
            entries,
            next_seq: journal.next_seq(),
            head_hash: journal.head_hash().to_string(),
        })
    })?;

    Ok(Json(page))
}

/// GET /v1/journal/verify: recompute every hash and link of the persisted
/// journal, or of the in-memory one when no database is configured.
#[utoipa::path(
    get,
    path = "/v1/journal/verify",
    responses(
        (status = 200, description = "Integrity report", body = ChainIntegrityResponse),
        (status = 500, description = "Journal could not be read", body = crate::error::ErrorBody),
    ),
    tag = "journal"
)]
pub async fn verify_journal(
    State(state): State<AppState>,
) -> Result<Json<ChainIntegrityResponse>, AppError> {
    let report = match &state.db_pool {
        Some(pool) => db::journal::verify_persisted(pool)
            .await
            .map_err(|e| AppError::Internal(format!("journal read failed: {e}")))?,
        None => state.read(|ledger| verify_chain(ledger.journal().all())),
    };
    if !report.chain_valid {
        tracing::error!(
            first_broken = ?report.first_broken,
            "journal chain integrity check failed"
        );
    }
    Ok(Json(ChainIntegrityResponse {
        total_entries: report.total_entries,
        first_broken: report.first_broken,
        chain_valid: report.chain_valid,
    }))
}
