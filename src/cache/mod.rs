//! The key-value cache a [`CacheStore`](crate::CacheStore) keeps session values in.

pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

pub use memory::MemoryCache;
#[cfg(feature = "redis-cache")]
pub use redis::RedisCache;

use std::future::Future;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cache miss")]
    Miss,

    #[error("item of {size} bytes exceeds the cache limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("{0}")]
    Backend(String),
}

/// A cache entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub value: Vec<u8>,
    /// Time to live in seconds. `0` leaves the lifetime to the client's default policy.
    pub expiration: u32,
}

impl Item {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expiration: 0,
        }
    }

    pub fn with_expiration(mut self, seconds: u32) -> Self {
        self.expiration = seconds;
        self
    }
}

/// A shared, distributed key-value cache.
///
/// Implementations own their connection handling; callers get exactly one
/// round-trip per call and no retries.
pub trait CacheClient: Send + Sync + 'static {
    /// Stores `item`, replacing any existing value under the same key.
    fn set(&self, item: Item) -> impl Future<Output = Result<(), Error>> + Send;

    /// Fetches the item stored under `key`, or [`Error::Miss`].
    fn get(&self, key: &str) -> impl Future<Output = Result<Item, Error>> + Send;

    /// Deletes the item stored under `key`.
    ///
    /// Returns `true` if an item was deleted.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;
}
