use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CanonicalPair, MatchRecord, SwipeDecision};

/// Errors that can occur in the swipe/match store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Persistence for swipe decisions and match records
///
/// `insert_match_if_absent` is the one contended write. Implementations must
/// make it a single atomic conditional insert on `(event, user_low, user_high)`
/// and report a lost race as `Ok(None)`.
#[async_trait]
pub trait SwipeStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert_swipe(&self, swipe: &SwipeDecision) -> Result<(), StoreError>;

    /// All decisions `actor_id` made in `event_id`, oldest first
    async fn swipes_by_actor(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError>;

    /// Decisions `actor_id` made against `target_id` in `event_id`, oldest first
    async fn decisions_between(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<Vec<SwipeDecision>, StoreError>;

    async fn has_like(
        &self,
        actor_id: &str,
        target_id: &str,
        event_id: &str,
    ) -> Result<bool, StoreError>;

    async fn delete_swipe(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_match(
        &self,
        event_id: &str,
        pair: &CanonicalPair,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Returns the stored record, or `None` when the pair already had one
    async fn insert_match_if_absent(
        &self,
        record: &MatchRecord,
    ) -> Result<Option<MatchRecord>, StoreError>;

    async fn delete_match(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn matches_for(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Vec<MatchRecord>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
