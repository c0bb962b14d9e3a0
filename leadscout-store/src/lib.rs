//! SQLite persistence for leads and status checks.
//!
//! Every search appends its leads to `business_leads`; nothing is deduplicated
//! or updated in place. Writes that belong together (one search's leads) share a
//! transaction. Schema setup is idempotent and runs on [`LeadStore::connect`].
use chrono::{DateTime, Utc};
use leadscout_common::{Lead, StatusCheck};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Row cap used by list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

#[derive(Clone)]
pub struct LeadStore {
    pool: SqlitePool,
}

impl LeadStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;
        info!(url = %url, max_connections, "store.connect");
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// A private in-memory database; one connection so every query sees the same data.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they don't exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS business_leads (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT,
                website TEXT,
                google_maps_url TEXT NOT NULL,
                rating REAL,
                review_count INTEGER,
                has_website INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_business_leads_created_at
             ON business_leads (created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS status_checks (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("store.migrate");
        Ok(())
    }

    /// Append leads in a single transaction. Returns rows written.
    pub async fn insert_leads(&self, leads: &[Lead]) -> Result<u64, StoreError> {
        if leads.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for lead in leads {
            let res = sqlx::query(
                r#"INSERT INTO business_leads
                   (id, name, address, phone, website, google_maps_url, rating,
                    review_count, has_website, latitude, longitude, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            )
            .bind(lead.id.to_string())
            .bind(lead.name.as_str())
            .bind(lead.address.as_str())
            .bind(lead.phone.as_deref())
            .bind(lead.website.as_deref())
            .bind(lead.google_maps_url.as_str())
            .bind(lead.rating)
            .bind(lead.review_count.map(i64::from))
            .bind(lead.has_website)
            .bind(lead.latitude)
            .bind(lead.longitude)
            .bind(lead.created_at)
            .execute(&mut *tx)
            .await?;
            written += res.rows_affected();
        }
        tx.commit().await?;
        info!(leads = leads.len(), rows = written, "store.insert_leads");
        Ok(written)
    }

    /// Stored leads, oldest first, at most `limit`.
    pub async fn list_leads(&self, limit: i64) -> Result<Vec<Lead>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, name, address, phone, website, google_maps_url, rating,
                      review_count, has_website, latitude, longitude, created_at
               FROM business_leads
               ORDER BY created_at ASC, rowid ASC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        debug!(rows = rows.len(), limit, "store.list_leads");
        rows.iter().map(lead_from_row).collect()
    }

    /// Delete every stored lead. Returns how many were removed.
    pub async fn clear_leads(&self) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM business_leads")
            .execute(&self.pool)
            .await?;
        info!(deleted = res.rows_affected(), "store.clear_leads");
        Ok(res.rows_affected())
    }

    pub async fn insert_status(&self, check: &StatusCheck) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO status_checks (id, client_name, timestamp) VALUES (?1, ?2, ?3)")
            .bind(check.id.to_string())
            .bind(check.client_name.as_str())
            .bind(check.timestamp)
            .execute(&self.pool)
            .await?;
        debug!(id = %check.id, client = %check.client_name, "store.insert_status");
        Ok(())
    }

    pub async fn list_status(&self, limit: i64) -> Result<Vec<StatusCheck>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, client_name, timestamp FROM status_checks
             ORDER BY timestamp ASC, rowid ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                Ok(StatusCheck {
                    id: parse_id("status_checks", r)?,
                    client_name: r.try_get("client_name")?,
                    timestamp: r.try_get::<DateTime<Utc>, _>("timestamp")?,
                })
            })
            .collect()
    }
}

fn parse_id(table: &'static str, row: &SqliteRow) -> Result<Uuid, StoreError> {
    let raw: String = row.try_get("id")?;
    Uuid::parse_str(&raw).map_err(|e| StoreError::Corrupt {
        table,
        reason: format!("id {raw:?}: {e}"),
    })
}

fn lead_from_row(r: &SqliteRow) -> Result<Lead, StoreError> {
    let review_count = match r.try_get::<Option<i64>, _>("review_count")? {
        Some(n) => Some(u32::try_from(n).map_err(|_| StoreError::Corrupt {
            table: "business_leads",
            reason: format!("review_count {n} out of range"),
        })?),
        None => None,
    };
    Ok(Lead {
        id: parse_id("business_leads", r)?,
        name: r.try_get("name")?,
        address: r.try_get("address")?,
        phone: r.try_get("phone")?,
        website: r.try_get("website")?,
        google_maps_url: r.try_get("google_maps_url")?,
        rating: r.try_get("rating")?,
        review_count,
        has_website: r.try_get("has_website")?,
        latitude: r.try_get("latitude")?,
        longitude: r.try_get("longitude")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
