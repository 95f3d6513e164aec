use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, Sqlite, SqlitePool};
use tracing::{info, warn};

use backend_domain::ports::EventRepository;
use backend_domain::utils::micros_to_utc;
use backend_domain::{
    AlertEvent, Classification, DbConfig, EventId, Fingerprint, ForwardStatus, NewAlertEvent,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS webhook_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        client_ip TEXT,
        received_at INTEGER NOT NULL,
        raw_payload TEXT NOT NULL,
        headers TEXT NOT NULL,
        parsed_payload TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        classification TEXT,
        importance TEXT,
        forward_status TEXT NOT NULL,
        is_duplicate INTEGER NOT NULL DEFAULT 0,
        duplicate_of INTEGER,
        duplicate_count INTEGER NOT NULL DEFAULT 1,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_webhook_events_dedup ON webhook_events (fingerprint, is_duplicate, received_at)",
    "CREATE INDEX IF NOT EXISTS idx_webhook_events_received_at ON webhook_events (received_at)",
];

const SELECT_COLUMNS: &str = "id, source, client_ip, received_at, raw_payload, headers, \
    parsed_payload, fingerprint, classification, forward_status, is_duplicate, duplicate_of, \
    duplicate_count, updated_at";

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("invalid database_url {}", config.database_url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;
        info!("connected to {}", config.database_url);
        Ok(Self::new(pool))
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Raw `webhook_events` row; JSON columns are decoded in `into_event`.
struct EventRow {
    id: i64,
    source: String,
    client_ip: Option<String>,
    received_at: i64,
    raw_payload: String,
    headers: String,
    parsed_payload: String,
    fingerprint: String,
    classification: Option<String>,
    forward_status: String,
    is_duplicate: i64,
    duplicate_of: Option<i64>,
    duplicate_count: i64,
    updated_at: i64,
}

impl<'r> FromRow<'r, SqliteRow> for EventRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            source: row.try_get("source")?,
            client_ip: row.try_get("client_ip")?,
            received_at: row.try_get("received_at")?,
            raw_payload: row.try_get("raw_payload")?,
            headers: row.try_get("headers")?,
            parsed_payload: row.try_get("parsed_payload")?,
            fingerprint: row.try_get("fingerprint")?,
            classification: row.try_get("classification")?,
            forward_status: row.try_get("forward_status")?,
            is_duplicate: row.try_get("is_duplicate")?,
            duplicate_of: row.try_get("duplicate_of")?,
            duplicate_count: row.try_get("duplicate_count")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl EventRow {
    fn into_event(self) -> Result<AlertEvent> {
        let classification = match self.classification.as_deref() {
            Some(text) if !text.is_empty() => Some(
                serde_json::from_str::<Classification>(text)
                    .with_context(|| format!("event {} has unreadable classification", self.id))?,
            ),
            _ => None,
        };
        Ok(AlertEvent {
            id: self.id,
            source: self.source,
            client_ip: self.client_ip,
            received_at: micros_to_utc(self.received_at),
            raw_payload: self.raw_payload,
            headers: parse_json_column(self.id, "headers", &self.headers),
            parsed_payload: parse_json_column(self.id, "parsed_payload", &self.parsed_payload),
            fingerprint: Fingerprint(self.fingerprint),
            classification,
            forward_status: ForwardStatus::from(self.forward_status.as_str()),
            is_duplicate: self.is_duplicate != 0,
            duplicate_of: self.duplicate_of,
            duplicate_count: self.duplicate_count,
            updated_at: micros_to_utc(self.updated_at),
        })
    }
}

/// Unreadable JSON reads as null so one bad row does not hide the rest.
fn parse_json_column(id: EventId, column: &str, text: &str) -> Value {
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(event_id = id, column, "unreadable json column: {}", err);
            Value::Null
        }
    }
}

async fn insert_row<'e, E>(
    executor: E,
    event: &NewAlertEvent,
    duplicate_of: Option<EventId>,
) -> Result<EventId>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let received_at = event.received_at.timestamp_micros();
    let result = sqlx::query(
        r#"
        INSERT INTO webhook_events (
            source, client_ip, received_at, raw_payload, headers, parsed_payload,
            fingerprint, classification, importance, forward_status,
            is_duplicate, duplicate_of, duplicate_count, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&event.source)
    .bind(&event.client_ip)
    .bind(received_at)
    .bind(&event.raw_payload)
    .bind(event.headers.to_string())
    .bind(event.parsed_payload.to_string())
    .bind(event.fingerprint.as_str())
    .bind(serde_json::to_string(&event.classification)?)
    .bind(event.classification.importance.as_str())
    .bind(event.forward_status.as_str())
    .bind(duplicate_of.is_some())
    .bind(duplicate_of)
    .bind(received_at)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find_original_since(
        &self,
        fingerprint: &Fingerprint,
        since: DateTime<Utc>,
    ) -> Result<Option<AlertEvent>> {
        let sql = format!(
            "SELECT {} FROM webhook_events \
             WHERE fingerprint = ? AND is_duplicate = 0 AND received_at >= ? \
             ORDER BY received_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(fingerprint.as_str())
            .bind(since.timestamp_micros())
            .fetch_optional(&self.pool)
            .await?;
        row.map(EventRow::into_event).transpose()
    }

    async fn insert_original(&self, event: &NewAlertEvent) -> Result<EventId> {
        insert_row(&self.pool, event, None).await
    }

    async fn insert_duplicate(&self, event: &NewAlertEvent, original_id: EventId) -> Result<EventId> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE webhook_events SET duplicate_count = duplicate_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().timestamp_micros())
        .bind(original_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(anyhow!("original event {} does not exist", original_id));
        }
        let id = insert_row(&mut *tx, event, Some(original_id)).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<AlertEvent>> {
        let sql = format!("SELECT {} FROM webhook_events WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(EventRow::into_event).transpose()
    }

    async fn list_events(&self, offset: u64, limit: u32) -> Result<Vec<AlertEvent>> {
        let sql = format!(
            "SELECT {} FROM webhook_events ORDER BY received_at DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn count_events(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn update_forward_status(&self, id: EventId, status: ForwardStatus) -> Result<()> {
        sqlx::query("UPDATE webhook_events SET forward_status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().timestamp_micros())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_classification(&self, id: EventId, classification: &Classification) -> Result<()> {
        sqlx::query(
            "UPDATE webhook_events SET classification = ?, importance = ?, updated_at = ? WHERE id = ?",
        )
        .bind(serde_json::to_string(classification)?)
        .bind(classification.importance.as_str())
        .bind(Utc::now().timestamp_micros())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
