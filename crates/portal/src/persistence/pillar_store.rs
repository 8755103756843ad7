//! SQLite-backed pillar store
//!
//! Durable keyed storage for pillar records and the singleton system
//! state. Writes fall into two disjoint paths that never touch each
//! other's columns: reconciliation owns `weight` (plus row creation),
//! the registration workflow owns the proof-gated columns.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use common::config::DatabaseConfig;
use common::error::PersistenceError;

use super::entities::{Pillar, PillarStatus, SystemState};

/// Proof-gated fields written together by a successful registration.
#[derive(Debug, Clone)]
pub struct RegistrationUpdate<'a> {
    pub public_key: &'a str,
    pub signature: &'a str,
    pub secondary_name: &'a str,
    pub secondary_owner_address: &'a str,
    pub secondary_withdraw_address: &'a str,
    pub secondary_producer_address: &'a str,
    pub secondary_identity_key: Option<&'a str>,
}

/// Result of a snapshot upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// SQLite persistence for pillars and system state.
pub struct PillarStore {
    pool: SqlitePool,
}

impl PillarStore {
    /// Open (and create if missing) the database behind `config`.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| PersistenceError::ConnectionFailed { source: Box::new(e) })?
            .create_if_missing(true);

        // A pool of in-memory connections is a pool of independent
        // databases; collapse it to one connection.
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(config.min_connections.min(max_connections))
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| PersistenceError::ConnectionFailed { source: Box::new(e) })?;

        let store = Self { pool };
        if config.run_migrations {
            store.run_migrations().await?;
        }

        Ok(store)
    }

    /// Get access to the underlying database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pillars (
                name TEXT PRIMARY KEY,
                address TEXT NOT NULL UNIQUE,
                public_key TEXT UNIQUE,
                signature TEXT,
                secondary_name TEXT,
                secondary_owner_address TEXT,
                secondary_withdraw_address TEXT,
                secondary_producer_address TEXT,
                secondary_identity_key TEXT,
                status TEXT NOT NULL DEFAULT 'Pending',
                weight TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                verified_at TEXT
            );

            CREATE TABLE IF NOT EXISTS system_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_reconciliation TEXT,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::MigrationFailed {
            details: e.to_string(),
        })?;

        info!("Pillar store migrations completed");
        Ok(())
    }

    /// Upsert one snapshot tuple.
    ///
    /// Creates a `Pending` pillar when the name is unknown; otherwise
    /// updates only `weight` and `updated_at`. The stored address and
    /// every proof-gated column are left untouched on update.
    pub async fn upsert_snapshot(
        &self,
        name: &str,
        address: &str,
        weight: u128,
    ) -> Result<UpsertOutcome, PersistenceError> {
        let now = Utc::now().to_rfc3339();

        let updated = sqlx::query("UPDATE pillars SET weight = ?, updated_at = ? WHERE name = ?")
            .bind(weight.to_string())
            .bind(&now)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if updated.rows_affected() > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        sqlx::query(
            r#"
            INSERT INTO pillars (name, address, weight, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(weight.to_string())
        .bind(PillarStatus::Pending.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(UpsertOutcome::Created)
    }

    /// Point lookup by unique name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Pillar>, PersistenceError> {
        let row = sqlx::query("SELECT * FROM pillars WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(row_to_pillar).transpose()
    }

    /// All pillars, heaviest first.
    pub async fn list_by_weight_desc(&self) -> Result<Vec<Pillar>, PersistenceError> {
        // Weights are non-negative decimal strings without leading
        // zeros, so longer strings are larger numbers.
        let rows = sqlx::query(
            "SELECT * FROM pillars ORDER BY LENGTH(weight) DESC, weight DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(row_to_pillar).collect()
    }

    /// Persist a successful registration proof in one statement.
    ///
    /// Sets all proof-gated columns, moves the pillar to `Registered`,
    /// and stamps `verified_at`/`updated_at`. The only mutation path for
    /// these columns.
    pub async fn apply_registration(
        &self,
        name: &str,
        update: &RegistrationUpdate<'_>,
    ) -> Result<(), PersistenceError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE pillars SET
                public_key = ?,
                signature = ?,
                secondary_name = ?,
                secondary_owner_address = ?,
                secondary_withdraw_address = ?,
                secondary_producer_address = ?,
                secondary_identity_key = ?,
                status = ?,
                verified_at = ?,
                updated_at = ?
            WHERE name = ?
            "#,
        )
        .bind(update.public_key)
        .bind(update.signature)
        .bind(update.secondary_name)
        .bind(update.secondary_owner_address)
        .bind(update.secondary_withdraw_address)
        .bind(update.secondary_producer_address)
        .bind(update.secondary_identity_key)
        .bind(PillarStatus::Registered.as_str())
        .bind(&now)
        .bind(&now)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound {
                details: format!("pillar {name}"),
            });
        }

        Ok(())
    }

    /// Fill in a resolved public key, only when none is stored yet.
    ///
    /// Never overwrites a key established by a registration proof.
    pub async fn set_public_key_if_absent(
        &self,
        name: &str,
        public_key: &str,
    ) -> Result<bool, PersistenceError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE pillars SET public_key = ?, updated_at = ? WHERE name = ? AND public_key IS NULL",
        )
        .bind(public_key)
        .bind(&now)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// The last successful reconciliation run, if any.
    pub async fn system_state(&self) -> Result<Option<SystemState>, PersistenceError> {
        let row = sqlx::query("SELECT last_reconciliation, updated_at FROM system_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|row| {
            let last_reconciliation = row
                .try_get::<Option<String>, _>("last_reconciliation")
                .map_err(map_sqlx_error)?
                .map(|s| parse_timestamp(&s, "system_state.last_reconciliation"))
                .transpose()?;
            let updated_at = parse_timestamp(
                &row.try_get::<String, _>("updated_at").map_err(map_sqlx_error)?,
                "system_state.updated_at",
            )?;

            Ok(SystemState {
                last_reconciliation,
                updated_at,
            })
        })
        .transpose()
    }

    /// Record a completed reconciliation run.
    pub async fn record_reconciliation(
        &self,
        completed_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO system_state (id, last_reconciliation, updated_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                last_reconciliation = excluded.last_reconciliation,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(completed_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

fn map_sqlx_error(error: sqlx::Error) -> PersistenceError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint") => {
            PersistenceError::ConstraintViolation {
                constraint: db_err.message().to_string(),
            }
        }
        _ => PersistenceError::query_failed(error),
    }
}

fn parse_timestamp(value: &str, location: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::data_corruption(location, e))
}

fn row_to_pillar(row: SqliteRow) -> Result<Pillar, PersistenceError> {
    let name: String = row.try_get("name").map_err(map_sqlx_error)?;

    let status_text: String = row.try_get("status").map_err(map_sqlx_error)?;
    let status = status_text
        .parse::<PillarStatus>()
        .map_err(|e| PersistenceError::data_corruption(format!("pillars.{name}.status"), e))?;

    let weight_text: String = row.try_get("weight").map_err(map_sqlx_error)?;
    let weight = weight_text
        .parse::<u128>()
        .map_err(|e| PersistenceError::data_corruption(format!("pillars.{name}.weight"), e))?;

    let created_at: String = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(map_sqlx_error)?;
    let verified_at: Option<String> = row.try_get("verified_at").map_err(map_sqlx_error)?;

    Ok(Pillar {
        address: row.try_get("address").map_err(map_sqlx_error)?,
        public_key: row.try_get("public_key").map_err(map_sqlx_error)?,
        signature: row.try_get("signature").map_err(map_sqlx_error)?,
        secondary_name: row.try_get("secondary_name").map_err(map_sqlx_error)?,
        secondary_owner_address: row
            .try_get("secondary_owner_address")
            .map_err(map_sqlx_error)?,
        secondary_withdraw_address: row
            .try_get("secondary_withdraw_address")
            .map_err(map_sqlx_error)?,
        secondary_producer_address: row
            .try_get("secondary_producer_address")
            .map_err(map_sqlx_error)?,
        secondary_identity_key: row
            .try_get("secondary_identity_key")
            .map_err(map_sqlx_error)?,
        status,
        weight,
        created_at: parse_timestamp(&created_at, "pillars.created_at")?,
        updated_at: parse_timestamp(&updated_at, "pillars.updated_at")?,
        verified_at: verified_at
            .map(|s| parse_timestamp(&s, "pillars.verified_at"))
            .transpose()?,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> PillarStore {
        PillarStore::new(&DatabaseConfig::default()).await.unwrap()
    }

    fn sample_update() -> RegistrationUpdate<'static> {
        RegistrationUpdate {
            public_key: "aa00000000000000000000000000000000000000000000000000000000000011",
            signature: "bb00000000000000000000000000000000000000000000000000000000000000\
                        0000000000000000000000000000000000000000000000000000000000000022",
            secondary_name: "pillar-one",
            secondary_owner_address: "z1owner",
            secondary_withdraw_address: "z1withdraw",
            secondary_producer_address: "z1producer",
            secondary_identity_key: Some("npub1identity"),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_pending_pillar() {
        let store = memory_store().await;

        let outcome = store.upsert_snapshot("P", "z1addr", 500).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let pillar = store.find_by_name("P").await.unwrap().unwrap();
        assert_eq!(pillar.name, "P");
        assert_eq!(pillar.address, "z1addr");
        assert_eq!(pillar.weight, 500);
        assert_eq!(pillar.status, PillarStatus::Pending);
        assert!(pillar.public_key.is_none());
        assert!(pillar.verified_at.is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_weight_only() {
        let store = memory_store().await;

        store.upsert_snapshot("P", "z1addr", 500).await.unwrap();
        let before = store.find_by_name("P").await.unwrap().unwrap();

        let outcome = store
            .upsert_snapshot("P", "z1other-address", 600)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let after = store.find_by_name("P").await.unwrap().unwrap();
        assert_eq!(after.weight, 600);
        // The stored address is immutable even when the snapshot differs
        assert_eq!(after.address, "z1addr");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.status, PillarStatus::Pending);
    }

    #[tokio::test]
    async fn test_upsert_preserves_proof_gated_fields() {
        let store = memory_store().await;
        store.upsert_snapshot("P", "z1addr", 500).await.unwrap();
        store.apply_registration("P", &sample_update()).await.unwrap();

        store.upsert_snapshot("P", "z1addr", 600).await.unwrap();

        let pillar = store.find_by_name("P").await.unwrap().unwrap();
        assert_eq!(pillar.weight, 600);
        assert_eq!(pillar.status, PillarStatus::Registered);
        assert_eq!(pillar.secondary_name.as_deref(), Some("pillar-one"));
        assert!(pillar.public_key.is_some());
        assert!(pillar.verified_at.is_some());
    }

    #[tokio::test]
    async fn test_apply_registration_sets_all_fields() {
        let store = memory_store().await;
        store.upsert_snapshot("P", "z1addr", 500).await.unwrap();

        store.apply_registration("P", &sample_update()).await.unwrap();

        let pillar = store.find_by_name("P").await.unwrap().unwrap();
        assert_eq!(pillar.status, PillarStatus::Registered);
        assert!(pillar.verified_at.is_some());
        assert_eq!(pillar.secondary_owner_address.as_deref(), Some("z1owner"));
        assert_eq!(
            pillar.secondary_withdraw_address.as_deref(),
            Some("z1withdraw")
        );
        assert_eq!(
            pillar.secondary_producer_address.as_deref(),
            Some("z1producer")
        );
        assert_eq!(
            pillar.secondary_identity_key.as_deref(),
            Some("npub1identity")
        );
        // Reconciliation-owned fields untouched
        assert_eq!(pillar.weight, 500);
        assert_eq!(pillar.address, "z1addr");
    }

    #[tokio::test]
    async fn test_apply_registration_unknown_name() {
        let store = memory_store().await;

        let result = store.apply_registration("ghost", &sample_update()).await;
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_public_key_rejected() {
        let store = memory_store().await;
        store.upsert_snapshot("P1", "z1addr1", 1).await.unwrap();
        store.upsert_snapshot("P2", "z1addr2", 2).await.unwrap();

        store.apply_registration("P1", &sample_update()).await.unwrap();
        let result = store.apply_registration("P2", &sample_update()).await;

        assert!(matches!(
            result,
            Err(PersistenceError::ConstraintViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_public_key_if_absent() {
        let store = memory_store().await;
        store.upsert_snapshot("P", "z1addr", 1).await.unwrap();

        assert!(store.set_public_key_if_absent("P", "cafe").await.unwrap());
        // A second attempt must not overwrite
        assert!(!store.set_public_key_if_absent("P", "beef").await.unwrap());

        let pillar = store.find_by_name("P").await.unwrap().unwrap();
        assert_eq!(pillar.public_key.as_deref(), Some("cafe"));
    }

    #[tokio::test]
    async fn test_list_orders_by_numeric_weight() {
        let store = memory_store().await;
        store.upsert_snapshot("small", "z1a", 999).await.unwrap();
        store.upsert_snapshot("large", "z1b", 1000).await.unwrap();
        store
            .upsert_snapshot("huge", "z1c", u128::MAX)
            .await
            .unwrap();

        let pillars = store.list_by_weight_desc().await.unwrap();
        let names: Vec<&str> = pillars.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["huge", "large", "small"]);
        assert_eq!(pillars[0].weight, u128::MAX);
    }

    #[tokio::test]
    async fn test_system_state_round_trip() {
        let store = memory_store().await;
        assert!(store.system_state().await.unwrap().is_none());

        let completed = Utc::now();
        store.record_reconciliation(completed).await.unwrap();

        let state = store.system_state().await.unwrap().unwrap();
        let recorded = state.last_reconciliation.unwrap();
        assert!((recorded - completed).num_seconds().abs() < 1);

        // Recording again keeps the singleton a singleton
        store.record_reconciliation(Utc::now()).await.unwrap();
        assert!(store.system_state().await.unwrap().is_some());
    }
}
