//! Journal persistence: append sealed entries, load them back in order.
//!
//! Hashes are computed by the ledger before an entry reaches this module.
//! Rows are stored as-is and re-verified when the ledger replays them, and
//! on demand by [`verify_persisted`].

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, PgPool};

use certreg_core::Address;
use certreg_ledger::{verify_chain, ChainReport, JournalEntry};

/// Database row for `ledger_journal`.
#[derive(Debug, sqlx::FromRow)]
pub struct JournalRow {
    pub seq: i64,
    pub recorded_at: DateTime<Utc>,
    pub caller: Option<String>,
    pub kind: String,
    pub event: serde_json::Value,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = sqlx::Error;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        let seq = u64::try_from(row.seq).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let caller = row
            .caller
            .map(Address::new)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let event =
            serde_json::from_value(row.event).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(JournalEntry {
            seq,
            recorded_at: row.recorded_at,
            caller,
            event,
            previous_hash: row.previous_hash,
            entry_hash: row.entry_hash,
        })
    }
}

/// Insert one sealed entry. A duplicate `seq` fails on the primary key,
/// so two writers can never both extend the chain from the same head.
pub async fn append<'e, E>(executor: E, entry: &JournalEntry) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let seq = i64::try_from(entry.seq).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let event = serde_json::to_value(&entry.event)
        .map_err(|e| sqlx::Error::Protocol(format!("journal event serialization: {e}")))?;

    sqlx::query(
        "INSERT INTO ledger_journal (seq, recorded_at, caller, kind, event,
         previous_hash, entry_hash)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(seq)
    .bind(entry.recorded_at)
    .bind(entry.caller.as_ref().map(Address::as_str))
    .bind(entry.event.kind())
    .bind(event)
    .bind(&entry.previous_hash)
    .bind(&entry.entry_hash)
    .execute(executor)
    .await?;

    Ok(())
}

/// Insert a batch of entries in one transaction.
pub async fn append_all(pool: &PgPool, entries: &[JournalEntry]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for entry in entries {
        append(&mut *tx, entry).await?;
    }
    tx.commit().await
}

async fn fetch_rows(pool: &PgPool) -> Result<Vec<JournalRow>, sqlx::Error> {
    sqlx::query_as::<_, JournalRow>(
        "SELECT seq, recorded_at, caller, kind, event, previous_hash, entry_hash
         FROM ledger_journal ORDER BY seq ASC",
    )
    .fetch_all(pool)
    .await
}

/// Load the whole journal in sequence order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<JournalEntry>, sqlx::Error> {
    fetch_rows(pool)
        .await?
        .into_iter()
        .map(JournalEntry::try_from)
        .collect()
}

/// The entry with the highest sequence number, if any.
pub async fn load_head(pool: &PgPool) -> Result<Option<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalRow>(
        "SELECT seq, recorded_at, caller, kind, event, previous_hash, entry_hash
         FROM ledger_journal ORDER BY seq DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    .map(JournalEntry::try_from)
    .transpose()
}

/// Recompute every hash and link of the persisted journal.
pub async fn verify_persisted(pool: &PgPool) -> Result<ChainReport, sqlx::Error> {
    Ok(verify_rows(fetch_rows(pool).await?))
}

/// Chain report over stored rows. A row that no longer decodes into an
/// entry breaks the chain at its sequence number.
pub fn verify_rows(rows: Vec<JournalRow>) -> ChainReport {
    let total_entries = rows.len();
    let mut entries = Vec::with_capacity(total_entries);
    let mut undecodable = None;
    for (position, row) in rows.into_iter().enumerate() {
        let seq = u64::try_from(row.seq).unwrap_or(position as u64);
        match JournalEntry::try_from(row) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(seq, error = %err, "journal row does not decode");
                undecodable = Some(seq);
                break;
            }
        }
    }

    let first_broken = verify_chain(&entries).first_broken.or(undecodable);
    ChainReport {
        total_entries,
        first_broken,
        chain_valid: first_broken.is_none(),
    }
}
