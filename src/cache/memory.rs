use crate::cache::{CacheClient, Error, Item};
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|expires| expires > now).unwrap_or(true)
    }
}

/// An in-process cache.
///
/// Items without an explicit expiration live for the cache's default TTL, or
/// until they are deleted when no default is configured.
///
/// ### Note
///
/// Entries are not shared between processes. Use it for development and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    data: DashMap<String, StoredValue>,
    default_ttl: Option<Duration>,
    max_item_size: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime given to items stored with an expiration of `0`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Rejects items whose value is larger than `limit` bytes.
    pub fn with_max_item_size(mut self, limit: usize) -> Self {
        self.max_item_size = Some(limit);
        self
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.cleanup_expired();
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of the live items, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.cleanup_expired();
        self.data.iter().map(|entry| entry.key().clone()).collect()
    }

    fn cleanup_expired(&self) {
        let now = Instant::now();
        self.data.retain(|_, value| value.is_live(now));
    }
}

impl CacheClient for MemoryCache {
    async fn set(&self, item: Item) -> Result<(), Error> {
        if let Some(limit) = self.max_item_size {
            if item.value.len() > limit {
                return Err(Error::TooLarge {
                    size: item.value.len(),
                    limit,
                });
            }
        }

        let ttl = match item.expiration {
            0 => self.default_ttl,
            seconds => Some(Duration::from_secs(u64::from(seconds))),
        };

        self.data.insert(
            item.key,
            StoredValue {
                data: item.value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Item, Error> {
        self.cleanup_expired();

        match self.data.get(key) {
            Some(value) if value.is_live(Instant::now()) => Ok(Item::new(key, value.data.clone())),
            _ => Err(Error::Miss),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        self.cleanup_expired();

        Ok(self.data.remove(key).is_some())
    }
}
