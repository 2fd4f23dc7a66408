use crate::core::rates::CachedPayload;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// A byte oriented key/value collection whose entries are only ever
/// overwritten. Implementations swallow backend errors and log them; a
/// failed read looks like a miss.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    async fn put(&self, key: &[u8], value: Vec<u8>);
}

pub const RATES_CACHE_KEY: &str = "exchangeRatesCache";

pub fn cache_ttl() -> Duration {
    Duration::hours(24)
}

/// Outcome of reading the cached payload, keeping expired entries visible to
/// callers that need to tell "stale" apart from "missing".
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(CachedPayload),
    Expired(CachedPayload),
    Missing,
}

/// Single slot store for the last successfully fetched rates and prices.
#[derive(Clone)]
pub struct RateCache {
    collection: Arc<dyn KeyValueCollection>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self {
            collection,
            ttl: cache_ttl(),
        }
    }

    /// Overwrites the single cached record.
    pub async fn save(&self, payload: &CachedPayload) {
        match serde_json::to_vec(payload) {
            Ok(bytes) => {
                self.collection.put(RATES_CACHE_KEY.as_bytes(), bytes).await;
                debug!(timestamp = payload.timestamp, "Saved rates to cache");
            }
            Err(e) => warn!(error = %e, "Failed to serialize rates cache"),
        }
    }

    /// Returns the cached payload unless it is absent, unreadable or expired.
    pub async fn load(&self) -> Option<CachedPayload> {
        match self.lookup(Utc::now()).await {
            CacheLookup::Fresh(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether data fetched at `captured_at` has outlived the TTL by `now`.
    pub fn is_expired(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - captured_at >= self.ttl
    }

    pub async fn lookup(&self, now: DateTime<Utc>) -> CacheLookup {
        let Some(bytes) = self.collection.get(RATES_CACHE_KEY.as_bytes()).await else {
            debug!("No cached rates");
            return CacheLookup::Missing;
        };

        let payload: CachedPayload = match serde_json::from_slice(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable rates cache");
                return CacheLookup::Missing;
            }
        };

        let age = now.timestamp_millis() - payload.timestamp;
        if age >= self.ttl.num_milliseconds() {
            debug!(age_ms = age, "Cached rates expired");
            CacheLookup::Expired(payload)
        } else {
            CacheLookup::Fresh(payload)
        }
    }
}
