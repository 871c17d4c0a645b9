use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{CanonicalPair, MatchRecord, SwipeDecision, SwipeDirection};
use crate::services::store::{StoreError, SwipeStore};

/// Swipe direction as stored in the `swipe_direction` enum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "swipe_direction", rename_all = "lowercase")]
pub enum DirectionColumn {
    Like,
    Pass,
}

impl From<SwipeDirection> for DirectionColumn {
    fn from(value: SwipeDirection) -> Self {
        match value {
            SwipeDirection::Like => DirectionColumn::Like,
            SwipeDirection::Pass => DirectionColumn::Pass,
        }
    }
}

impl From<DirectionColumn> for SwipeDirection {
    fn from(value: DirectionColumn) -> Self {
        match value {
            DirectionColumn::Like => SwipeDirection::Like,
            DirectionColumn::Pass => SwipeDirection::Pass,
        }
    }
}

const SWIPE_COLUMNS: &str = "id, actor_id, target_id, event_id, direction, created_at";
const MATCH_COLUMNS: &str = "id, event_id, user_low, user_high, created_at";

/// PostgreSQL-backed swipe and match store
///
/// The `match_records_pair_unique` constraint on `(event_id, user_low, user_high)`
/// is what makes concurrent reciprocal likes produce a single match.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    fn swipe_from_row(row: &PgRow) -> Result<SwipeDecision, sqlx::Error> {
        let direction: DirectionColumn = row.try_get("direction")?;
        Ok(SwipeDecision {
            id: row.try_get("id")?,
            actor_id: row.try_get("actor_id")?,
            target_id: row.try_get("target_id")?,
            event_id: row.try_get("event_id")?,
            direction: direction.into(),
            created_at: row.try_get("created_at")?,
        })
    }

    fn match_from_row(row: &PgRow) -> Result<MatchRecord, sqlx::Error> {
        Ok(MatchRecord {
            id: row.try_get("id")?,
            event_id: row.try_get("event_id")?,
            user_low: row.try_get("user_low")?,
            user_high: row.try_get("user_high")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SwipeStore for PostgresClient {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert_swipe(&self, swipe: &SwipeDecision) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO swipe_decisions (id, actor_id, target_id, event_id, direction, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(swipe.id)
            .bind(&swipe.actor_id)
            .bind(&swipe.target_id)
            .bind(&swipe.event_id)
            .bind(DirectionColumn::from(swipe.direction))
            .bind(swipe.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded swipe {}: {} -> {} ({}) in {}",
            swipe.id,
            swipe.actor_id,
            swipe.target_id,
            swipe.direction,
            swipe.event_id
        );

        Ok(())
    }

    async fn swipes_by_actor(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError> {
        let query = format!(
            "SELECT {} FROM swipe_decisions WHERE actor_id = $1 AND event_id = $2 ORDER BY created_at ASC",
            SWIPE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(actor_id)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        let swipes = rows
            .iter()
            .map(Self::swipe_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("User {} has {} swipes in event {}", actor_id, swipes.len(), event_id);

        Ok(swipes)
    }

    async fn decisions_between(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError> {
        let query = format!(
            "SELECT {} FROM swipe_decisions \
             WHERE actor_id = $1 AND target_id = $2 AND event_id = $3 \
             ORDER BY created_at ASC",
            SWIPE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(actor_id)
            .bind(target_id)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(Self::swipe_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn has_like(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<bool, StoreError> {
        let query = r#"
            SELECT EXISTS (
                SELECT 1 FROM swipe_decisions
                WHERE actor_id = $1 AND target_id = $2 AND event_id = $3 AND direction = 'like'
            ) AS liked
        "#;

        let row = sqlx::query(query)
            .bind(actor_id)
            .bind(target_id)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("liked")?)
    }

    async fn delete_swipe(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM swipe_decisions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_match(
        &self,
        event_id: &str,
        pair: &CanonicalPair,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM match_records WHERE event_id = $1 AND user_low = $2 AND user_high = $3",
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(event_id)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(Self::match_from_row)
            .transpose()
            .map_err(Into::into)
    }

    async fn insert_match_if_absent(
        &self,
        record: &MatchRecord,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let query = format!(
            "INSERT INTO match_records ({cols}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT ON CONSTRAINT match_records_pair_unique DO NOTHING \
             RETURNING {cols}",
            cols = MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(record.id)
            .bind(&record.event_id)
            .bind(&record.user_low)
            .bind(&record.user_high)
            .bind(record.created_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::match_from_row(&row)?)),
            None => {
                tracing::debug!(
                    "Match for {} / {} in {} already exists",
                    record.user_low,
                    record.user_high,
                    record.event_id
                );
                Ok(None)
            }
        }
    }

    async fn delete_match(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM match_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn matches_for(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM match_records \
             WHERE event_id = $1 AND (user_low = $2 OR user_high = $2) \
             ORDER BY created_at ASC",
            MATCH_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(event_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(Self::match_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_direction_column_conversion() {
        assert_eq!(DirectionColumn::from(SwipeDirection::Like), DirectionColumn::Like);
        assert_eq!(SwipeDirection::from(DirectionColumn::Pass), SwipeDirection::Pass);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_match_insert_is_unique() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let client = PostgresClient::from_settings(&url, Some(2), Some(1), None, None)
            .await
            .expect("Failed to connect");

        let event_id = format!("test-{}", Uuid::new_v4());
        let pair = CanonicalPair::new("alice", "bob").unwrap();
        let first = MatchRecord::new(&event_id, &pair, Utc::now());
        let second = MatchRecord::new(&event_id, &pair, Utc::now());

        assert!(client.insert_match_if_absent(&first).await.unwrap().is_some());
        assert!(client.insert_match_if_absent(&second).await.unwrap().is_none());
        assert!(client.delete_match(first.id).await.unwrap());
    }
}
