use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Two-tier read-through cache for directory data
///
/// L1 is a per-process moka cache holding serialized JSON, L2 is Redis shared
/// by every instance. Entries expire from both tiers after `ttl_secs`.
pub struct CacheManager {
    redis: ConnectionManager,
    l1: moka::future::Cache<String, String>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Connect to Redis and build the L1 tier
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1 = moka::future::Cache::builder()
            .max_capacity(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self { redis, l1, ttl_secs })
    }

    /// Cached value for `key`, checking L1 before Redis
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        if let Some(json) = self.l1.get(key).await {
            tracing::trace!("L1 hit: {}", key);
            return Ok(Some(serde_json::from_str(&json)?));
        }

        let mut conn = self.redis.clone();
        let json: Option<String> = conn.get(key).await?;

        match json {
            Some(json) => {
                tracing::trace!("L2 hit: {}", key);
                let value = serde_json::from_str(&json)?;
                self.l1.insert(key.to_string(), json).await;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Store `value` in both tiers
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;

        self.l1.insert(key.to_string(), json.clone()).await;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, json, self.ttl_secs).await?;

        Ok(())
    }

    /// Read-through: serve `key` from cache or run `load` and cache its result
    ///
    /// Cache failures never fail the read; they are logged and the loader's
    /// result is returned as is.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let value = load().await?;
        if let Err(e) = self.set(key, &value).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(value)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    const PREFIX: &'static str = "mingle";

    /// Key for an event roster
    pub fn roster(event_id: &str) -> String {
        format!("{}:roster:{}", Self::PREFIX, event_id)
    }

    /// Key for one attendee profile
    pub fn attendee(event_id: &str, user_id: &str) -> String {
        format!("{}:attendee:{}:{}", Self::PREFIX, event_id, user_id)
    }
}
