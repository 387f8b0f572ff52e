use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::relay::RelayResponse;

struct CacheEntry {
    response: RelayResponse,
    inserted_at: Instant,
}

/// In-memory cache of success payloads keyed by normalized symbol.
///
/// Expiry is lazy: a stale entry is simply treated as absent on read and
/// overwritten by the next successful fetch. No background sweep.
pub struct QuoteCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, symbol: &str) -> Option<RelayResponse> {
        let entries = self.entries.lock().await;
        entries
            .get(symbol)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.response.clone())
    }

    pub async fn insert(&self, symbol: String, response: RelayResponse) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            symbol,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(message: &str) -> RelayResponse {
        RelayResponse {
            success: true,
            message: message.to_string(),
            data: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_miss_on_empty_cache() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        assert!(cache.get("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        cache.insert("AAPL".to_string(), payload("sent")).await;
        let hit = cache.get("AAPL").await.expect("entry should be live");
        assert_eq!(hit.message, "sent");
        assert!(cache.get("MSFT").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_treated_as_absent() {
        let cache = QuoteCache::new(Duration::from_millis(30));
        cache.insert("AAPL".to_string(), payload("sent")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_reinsert_overwrites_previous_entry() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        cache.insert("AAPL".to_string(), payload("first")).await;
        cache.insert("AAPL".to_string(), payload("second")).await;
        assert_eq!(cache.get("AAPL").await.unwrap().message, "second");
    }
}
