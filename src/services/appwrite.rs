use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Attendee, EventStatus, EventWindow, ExclusionRecord};
use crate::services::directory::{Directory, DirectoryError};

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub attendees: String,
    pub exclusions: String,
    pub events: String,
}

/// Appwrite API client
///
/// Reads the data the engine consumes but does not own:
/// - event attendee profiles and rosters
/// - unmatch/block records
/// - event matchmaking windows
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Event document as stored in the events collection
#[derive(Debug, Deserialize)]
struct EventDocument {
    #[serde(rename = "$id")]
    id: String,
    status: EventStatus,
    #[serde(rename = "opensAt", default)]
    opens_at: Option<DateTime<Utc>>,
    #[serde(rename = "closesAt", default)]
    closes_at: Option<DateTime<Utc>>,
}

impl From<EventDocument> for EventWindow {
    fn from(doc: EventDocument) -> Self {
        EventWindow {
            event_id: doc.id,
            status: doc.status,
            opens_at: doc.opens_at,
            closes_at: doc.closes_at,
        }
    }
}

/// Appwrite caps list responses; rosters are fetched in pages of this size
const PAGE_SIZE: usize = 100;

/// What to do with a document that does not deserialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Malformed {
    /// Log and drop it
    Skip,
    /// Fail the whole listing
    Reject,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn equal(field: &str, value: &str) -> String {
        serde_json::json!({ "method": "equal", "attribute": field, "values": [value] }).to_string()
    }

    fn paging(offset: usize) -> [String; 2] {
        [
            serde_json::json!({ "method": "limit", "values": [PAGE_SIZE] }).to_string(),
            serde_json::json!({ "method": "offset", "values": [offset] }).to_string(),
        ]
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>, AppwriteError> {
        let response = self
            .client
            .get(url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AppwriteError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Appwrite request to {} failed: {} - {}", url, status, body);
                return Err(AppwriteError::ApiError(format!("Request failed: {}", status)));
            }
            _ => {}
        }

        Ok(Some(response.json().await?))
    }

    /// List documents in `collection` matching all `queries`
    async fn list_documents<T>(
        &self,
        collection: &str,
        queries: &[String],
        malformed: Malformed,
    ) -> Result<Vec<T>, AppwriteError>
    where
        T: DeserializeOwned,
    {
        let mut documents = Vec::new();
        let mut offset = 0;

        loop {
            let mut page_queries: Vec<String> = queries.to_vec();
            page_queries.extend(Self::paging(offset));

            let params = page_queries
                .iter()
                .map(|q| format!("queries[]={}", urlencoding::encode(q)))
                .collect::<Vec<_>>()
                .join("&");
            let url = format!("{}?{}", self.collection_url(collection), params);

            tracing::debug!("Listing {} documents at offset {}", collection, offset);

            let json = self
                .get_json(&url)
                .await?
                .ok_or_else(|| AppwriteError::NotFound(format!("Collection {} not found", collection)))?;

            let page = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

            let page_len = page.len();
            for doc in page {
                let data = doc.get("data").unwrap_or(doc);
                match serde_json::from_value::<T>(data.clone()) {
                    Ok(parsed) => documents.push(parsed),
                    Err(e) if malformed == Malformed::Skip => {
                        tracing::warn!("Skipping malformed {} document: {}", collection, e)
                    }
                    Err(e) => {
                        tracing::error!("Malformed {} document: {}", collection, e);
                        return Err(AppwriteError::InvalidResponse(format!(
                            "Malformed {} document: {}",
                            collection, e
                        )));
                    }
                }
            }

            let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0) as usize;
            offset += page_len;
            if page_len < PAGE_SIZE || offset >= total {
                break;
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl Directory for AppwriteClient {
    async fn attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Attendee>, DirectoryError> {
        let queries = [Self::equal("eventId", event_id), Self::equal("userId", user_id)];
        let mut found: Vec<Attendee> = self.list_documents(&self.collections.attendees, &queries, Malformed::Skip).await?;

        tracing::debug!("Fetched attendee {} for event {}: {}", user_id, event_id, !found.is_empty());

        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    async fn roster(&self, event_id: &str) -> Result<Vec<Attendee>, DirectoryError> {
        let queries = [Self::equal("eventId", event_id)];
        let roster: Vec<Attendee> = self.list_documents(&self.collections.attendees, &queries, Malformed::Skip).await?;

        tracing::debug!("Event {} roster has {} attendees", event_id, roster.len());

        Ok(roster)
    }

    async fn exclusions(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Vec<ExclusionRecord>, DirectoryError> {
        let as_actor = [Self::equal("eventId", event_id), Self::equal("actorId", user_id)];
        let as_target = [Self::equal("eventId", event_id), Self::equal("targetId", user_id)];

        let mut records: Vec<ExclusionRecord> =
            self.list_documents(&self.collections.exclusions, &as_actor, Malformed::Reject).await?;
        records.extend(
            self.list_documents::<ExclusionRecord>(
                &self.collections.exclusions,
                &as_target,
                Malformed::Reject,
            )
            .await?,
        );

        Ok(records)
    }

    async fn event_window(&self, event_id: &str) -> Result<EventWindow, DirectoryError> {
        let url = format!("{}/{}", self.collection_url(&self.collections.events), event_id);

        let json = self
            .get_json(&url)
            .await?
            .ok_or_else(|| DirectoryError::EventNotFound(event_id.to_string()))?;

        let doc: EventDocument = serde_json::from_value(json)
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse event: {}", e)))?;

        Ok(doc.into())
    }
}
