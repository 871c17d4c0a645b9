use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Attendee, EventWindow, ExclusionRecord};
use crate::services::appwrite::AppwriteError;
use crate::services::cache::{CacheKey, CacheManager};

/// Errors from the profile, roster, exclusion and event services
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Appwrite(#[from] AppwriteError),

    #[error("Event not found: {0}")]
    EventNotFound(String),
}

/// Read access to the collaborators the engine does not own
#[async_trait]
pub trait Directory: Send + Sync {
    /// A single attendee, or `None` if the user is not on the event roster
    async fn attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError>;

    /// Same as [`Directory::attendee`] but never served from a cache
    ///
    /// Used for the caller's own profile, which must reflect onboarding
    /// edits made moments ago.
    async fn attendee_fresh(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError> {
        self.attendee(event_id, user_id).await
    }

    /// Full roster in stable order
    async fn roster(&self, event_id: &str) -> Result<Vec<Attendee>, DirectoryError>;

    /// Unmatch and block records in which `user_id` appears on either side
    async fn exclusions(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Vec<ExclusionRecord>, DirectoryError>;

    async fn event_window(&self, event_id: &str) -> Result<EventWindow, DirectoryError>;
}

/// Read-through cache in front of another directory
///
/// Rosters and profiles are cached, except through `attendee_fresh`.
/// Exclusions and event windows always go to the source so blocks and
/// closures take effect on the next call.
pub struct CachedDirectory {
    inner: Arc<dyn Directory>,
    cache: Arc<CacheManager>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn Directory>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Directory for CachedDirectory {
    async fn attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError> {
        let key = CacheKey::attendee(event_id, user_id);
        match self.cache.get::<Attendee>(&key).await {
            Ok(Some(attendee)) => return Ok(Some(attendee)),
            Ok(None) => {}
            Err(e) => tracing::warn!("Attendee cache read failed for {}: {}", key, e),
        }

        // Absence is not cached so a new arrival is visible immediately
        let attendee = self.inner.attendee(event_id, user_id).await?;
        if let Some(found) = &attendee {
            if let Err(e) = self.cache.set(&key, found).await {
                tracing::warn!("Failed to cache attendee {}: {}", key, e);
            }
        }
        Ok(attendee)
    }

    async fn attendee_fresh(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError> {
        let attendee = self.inner.attendee(event_id, user_id).await?;
        if let Some(found) = &attendee {
            let key = CacheKey::attendee(event_id, user_id);
            if let Err(e) = self.cache.set(&key, found).await {
                tracing::warn!("Failed to refresh attendee {}: {}", key, e);
            }
        }
        Ok(attendee)
    }

    async fn roster(&self, event_id: &str) -> Result<Vec<Attendee>, DirectoryError> {
        self.cache
            .get_or_load(&CacheKey::roster(event_id), || self.inner.roster(event_id))
            .await
    }

    async fn exclusions(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Vec<ExclusionRecord>, DirectoryError> {
        self.inner.exclusions(event_id, user_id).await
    }

    async fn event_window(&self, event_id: &str) -> Result<EventWindow, DirectoryError> {
        self.inner.event_window(event_id).await
    }
}
