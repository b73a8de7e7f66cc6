use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

use crate::config::{DatabaseSettings, TableSettings};
use crate::models::{ListingStatus, MatchOutcome, MatchStatus};
use crate::services::store::{
    listing_status, match_status, timestamp_from_millis, GuestRow, HostRow, MatchStore, NewMatch,
    StoreError, StoreTransaction,
};

/// Table names, checked to be plain SQL identifiers before they are
/// interpolated into statements.
#[derive(Debug, Clone)]
pub struct Tables {
    pub hosts: String,
    pub guests: String,
    pub matches: String,
}

impl Tables {
    pub fn from_settings(settings: &TableSettings) -> Result<Self, StoreError> {
        Ok(Self {
            hosts: checked_identifier(&settings.hosts)?,
            guests: checked_identifier(&settings.guests)?,
            matches: checked_identifier(&settings.matches)?,
        })
    }
}

fn checked_identifier(name: &str) -> Result<String, StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name.to_string())
    } else {
        Err(StoreError::InvalidInput(format!("invalid table name {name:?}")))
    }
}

/// PostgreSQL-backed store
///
/// Every matching invocation runs inside one database transaction; the
/// claim queries lock rows with `FOR UPDATE SKIP LOCKED` so concurrent
/// invocations never load the same listing.
pub struct PostgresStore {
    pool: PgPool,
    tables: Tables,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        tables: Tables,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool, tables })
    }

    /// Create a new store from settings, running migrations if enabled
    pub async fn from_settings(
        database: &DatabaseSettings,
        tables: &TableSettings,
    ) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max {} connections)",
            database.max_connections.unwrap_or(10)
        );

        let store = Self::new(
            &database.url,
            database.max_connections.unwrap_or(10),
            database.min_connections.unwrap_or(1),
            Duration::from_secs(database.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(database.idle_timeout_secs.unwrap_or(600)),
            Tables::from_settings(tables)?,
        )
        .await?;

        if database.run_migrations {
            sqlx::migrate!("./migrations").run(&store.pool).await?;
            tracing::info!("Database migrations applied");
        }

        Ok(store)
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction {
            tx,
            tables: self.tables.clone(),
        }))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
    tables: Tables,
}

fn host_from_row(row: &PgRow) -> Result<HostRow, StoreError> {
    Ok(HostRow {
        id: row.try_get("db_hosts_id")?,
        registered_at_ms: row.try_get("fnc_ts_registered")?,
        country: row.try_get("listing_country")?,
        city: row.try_get("city")?,
        shelter_type: row.try_get("shelter_type")?,
        beds: row.try_get("beds")?,
        acceptable_group_relations: row.try_get("acceptable_group_relations")?,
        ok_for_pregnant: row.try_get("ok_for_pregnant")?,
        ok_for_disabilities: row.try_get("ok_for_disabilities")?,
        ok_for_animals: row.try_get("ok_for_animals")?,
        ok_for_elderly: row.try_get("ok_for_elderly")?,
        ok_for_any_nationality: row.try_get("ok_for_any_nationality")?,
        duration_category: row.try_get("duration_category")?,
        transport_included: row.try_get("transport_included")?,
    })
}

fn guest_from_row(row: &PgRow) -> Result<GuestRow, StoreError> {
    Ok(GuestRow {
        id: row.try_get("db_guests_id")?,
        registered_at_ms: row.try_get("fnc_ts_registered")?,
        country: row.try_get("listing_country")?,
        city: row.try_get("city")?,
        acceptable_shelter_types: row.try_get("acceptable_shelter_types")?,
        beds: row.try_get("beds")?,
        group_relation: row.try_get("group_relation")?,
        is_pregnant: row.try_get("is_pregnant")?,
        is_with_disability: row.try_get("is_with_disability")?,
        is_with_animal: row.try_get("is_with_animal")?,
        is_with_elderly: row.try_get("is_with_elderly")?,
        is_ukrainian_nationality: row.try_get("is_ukrainian_nationality")?,
        duration_category: row.try_get("duration_category")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchOutcome, StoreError> {
    let status: String = row.try_get("fnc_status")?;
    let host_status: String = row.try_get("fnc_host_status")?;
    let guest_status: String = row.try_get("fnc_guest_status")?;

    Ok(MatchOutcome {
        match_id: row.try_get("db_matches_id")?,
        host_id: row.try_get("fnc_hosts_id")?,
        guest_id: row.try_get("fnc_guests_id")?,
        matched_at: timestamp_from_millis(row.try_get("fnc_ts_matched")?)?,
        status: match_status(&status)?,
        host_status: match_status(&host_status)?,
        guest_status: match_status(&guest_status)?,
    })
}

const MATCH_COLUMNS: &str = "db_matches_id, fnc_hosts_id, fnc_guests_id, fnc_ts_matched, \
                             fnc_status, fnc_host_status, fnc_guest_status";

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn claim_hosts(&mut self, limit: usize) -> Result<Vec<HostRow>, StoreError> {
        let query = format!(
            r#"
            UPDATE {hosts}
            SET fnc_status = $1
            WHERE db_hosts_id IN (
                SELECT db_hosts_id
                FROM {hosts}
                WHERE fnc_status = $2
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING db_hosts_id, fnc_ts_registered, listing_country, city, shelter_type,
                      beds, acceptable_group_relations, ok_for_pregnant, ok_for_disabilities,
                      ok_for_animals, ok_for_elderly, ok_for_any_nationality,
                      duration_category, transport_included
            "#,
            hosts = self.tables.hosts
        );

        let rows = sqlx::query(&query)
            .bind(ListingStatus::BeingProcessed.code())
            .bind(ListingStatus::Available.code())
            .bind(limit as i64)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(host_from_row).collect()
    }

    async fn claim_guests(&mut self, limit: usize) -> Result<Vec<GuestRow>, StoreError> {
        // Random order so long-waiting guests at the end of the table are not starved.
        let query = format!(
            r#"
            WITH claimed AS (
                SELECT db_guests_id, random() AS draw
                FROM {guests}
                WHERE fnc_status = $2
                ORDER BY draw
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            UPDATE {guests} AS g
            SET fnc_status = $1
            FROM claimed
            WHERE g.db_guests_id = claimed.db_guests_id
            RETURNING g.db_guests_id, g.fnc_ts_registered, g.listing_country, g.city,
                      g.acceptable_shelter_types, g.beds, g.group_relation, g.is_pregnant,
                      g.is_with_disability, g.is_with_animal, g.is_with_elderly,
                      g.is_ukrainian_nationality, g.duration_category
            "#,
            guests = self.tables.guests
        );

        let rows = sqlx::query(&query)
            .bind(ListingStatus::BeingProcessed.code())
            .bind(ListingStatus::Available.code())
            .bind(limit as i64)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(guest_from_row).collect()
    }

    async fn unresolved_pairs(&mut self) -> Result<Vec<(String, String)>, StoreError> {
        let query = format!(
            r#"
            SELECT DISTINCT fnc_hosts_id, fnc_guests_id
            FROM {matches}
            WHERE fnc_host_status = ANY($1) OR fnc_guest_status = ANY($1)
            "#,
            matches = self.tables.matches
        );

        let unresolved: Vec<String> = [MatchStatus::AwaitingResponse, MatchStatus::Default]
            .iter()
            .map(|s| s.code().to_string())
            .collect();

        let rows = sqlx::query(&query)
            .bind(&unresolved)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("fnc_hosts_id")?, row.try_get("fnc_guests_id")?)))
            .collect()
    }

    async fn matches_since(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MatchOutcome>, StoreError> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM {matches} WHERE fnc_ts_matched >= $1",
            matches = self.tables.matches
        );

        let rows = sqlx::query(&query)
            .bind(since.timestamp_millis())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn awaiting_matches(&mut self) -> Result<Vec<MatchOutcome>, StoreError> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM {matches} WHERE fnc_status = $1 FOR UPDATE",
            matches = self.tables.matches
        );

        let rows = sqlx::query(&query)
            .bind(MatchStatus::AwaitingResponse.code())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn insert_match(&mut self, record: &NewMatch) -> Result<String, StoreError> {
        let match_id = uuid::Uuid::new_v4().to_string();
        let query = format!(
            r#"
            INSERT INTO {matches}
                (db_matches_id, fnc_ts_matched, fnc_status, fnc_hosts_id, fnc_guests_id,
                 fnc_host_status, fnc_guest_status)
            VALUES ($1, $2, $3, $4, $5, $3, $3)
            "#,
            matches = self.tables.matches
        );

        sqlx::query(&query)
            .bind(&match_id)
            .bind(record.matched_at.timestamp_millis())
            .bind(record.status.code())
            .bind(&record.host_id)
            .bind(&record.guest_id)
            .execute(&mut *self.tx)
            .await?;

        tracing::debug!(
            "Inserted match {} (host={}, guest={})",
            match_id,
            record.host_id,
            record.guest_id
        );

        Ok(match_id)
    }

    async fn set_match_status(
        &mut self,
        match_id: &str,
        status: MatchStatus,
    ) -> Result<(), StoreError> {
        let query = format!(
            "UPDATE {matches} SET fnc_status = $1 WHERE db_matches_id = $2",
            matches = self.tables.matches
        );

        let result = sqlx::query(&query)
            .bind(status.code())
            .bind(match_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidInput(format!("no match {match_id}")));
        }
        Ok(())
    }

    async fn set_host_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "UPDATE {hosts} SET fnc_status = $1 WHERE db_hosts_id = ANY($2)",
            hosts = self.tables.hosts
        );

        let result = sqlx::query(&query)
            .bind(status.code())
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_guest_status(
        &mut self,
        ids: &[String],
        status: ListingStatus,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "UPDATE {guests} SET fnc_status = $1 WHERE db_guests_id = ANY($2)",
            guests = self.tables.guests
        );

        let result = sqlx::query(&query)
            .bind(status.code())
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_must_be_identifiers() {
        assert!(checked_identifier("hosts").is_ok());
        assert!(checked_identifier("_matches_v2").is_ok());
        assert!(checked_identifier("").is_err());
        assert!(checked_identifier("2hosts").is_err());
        assert!(checked_identifier("hosts; DROP TABLE guests").is_err());
    }

    #[test]
    fn test_tables_from_settings() {
        let settings = TableSettings {
            hosts: "hosts".to_string(),
            guests: "guests".to_string(),
            matches: "bad-name".to_string(),
        };
        assert!(matches!(
            Tables::from_settings(&settings),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
