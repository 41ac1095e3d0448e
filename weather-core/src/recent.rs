use std::sync::Arc;

use crate::storage::Storage;

pub const MAX_RECENT_SEARCHES: usize = 5;
pub const RECENT_SEARCHES_KEY: &str = "recentSearches";

/// Bounded most-recent-first list of searched city names.
///
/// Without a storage backend every operation degrades to a no-op and
/// `load` returns an empty list.
#[derive(Debug, Clone)]
pub struct RecentSearches {
    storage: Option<Arc<dyn Storage>>,
    max: usize,
}

impl RecentSearches {
    pub fn new(storage: Option<Arc<dyn Storage>>) -> Self {
        Self::with_max(storage, MAX_RECENT_SEARCHES)
    }

    pub fn with_max(storage: Option<Arc<dyn Storage>>, max: usize) -> Self {
        Self { storage, max }
    }

    pub fn load(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };

        let raw = match storage.get(RECENT_SEARCHES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!("Failed to read recent searches: {err:#}");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!("Ignoring malformed recent searches entry: {err}");
            Vec::new()
        })
    }

    /// Move `city_name` to the front, dropping case-insensitive duplicates
    /// and anything beyond the configured maximum.
    pub fn add(&self, city_name: &str) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        if city_name.trim().is_empty() {
            return self.load();
        }

        let needle = city_name.to_lowercase();
        let searches: Vec<String> = std::iter::once(city_name.to_string())
            .chain(self.load().into_iter().filter(|s| s.to_lowercase() != needle))
            .take(self.max)
            .collect();

        match serde_json::to_string(&searches) {
            Ok(json) => {
                if let Err(err) = storage.set(RECENT_SEARCHES_KEY, &json) {
                    tracing::warn!("Failed to persist recent searches: {err:#}");
                }
            }
            Err(err) => tracing::warn!("Failed to encode recent searches: {err}"),
        }

        searches
    }

    pub fn clear(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = storage.remove(RECENT_SEARCHES_KEY) {
            tracing::warn!("Failed to clear recent searches: {err:#}");
        }
    }
}
