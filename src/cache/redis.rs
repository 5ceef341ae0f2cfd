use crate::cache::{CacheClient, Error, Item};
use fred::clients::Pool;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::{fmt::Debug, sync::Arc};

impl From<fred::error::Error> for Error {
    fn from(err: fred::error::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

/// A Redis cache.
///
/// Items are plain string keys written with `SET`, read with `GET` and removed
/// with `DEL`. An item expiration of `0` falls back to the cache's default TTL,
/// or to no TTL at all when none is configured.
#[derive(Clone, Debug)]
pub struct RedisCache<C: KeysInterface + Clone + Send + Sync = Pool> {
    client: Arc<C>,
    default_ttl: Option<i64>,
}

impl<C> RedisCache<C>
where
    C: KeysInterface + Clone + Send + Sync,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            default_ttl: None,
        }
    }

    /// Lifetime, in seconds, given to items stored with an expiration of `0`.
    pub fn with_default_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl = Some(seconds);
        self
    }

    fn expiration(&self, item: &Item) -> Option<Expiration> {
        match item.expiration {
            0 => self.default_ttl.map(Expiration::EX),
            seconds => Some(Expiration::EX(i64::from(seconds))),
        }
    }
}

impl<C> CacheClient for RedisCache<C>
where
    C: KeysInterface + Clone + Send + Sync + 'static,
{
    async fn set(&self, item: Item) -> Result<(), Error> {
        let expiration = self.expiration(&item);
        let _: () = self
            .client
            .set(item.key, item.value, expiration, None, false)
            .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Item, Error> {
        let value = self.client.get::<Option<Vec<u8>>, _>(key).await?;

        match value {
            Some(value) => Ok(Item::new(key, value)),
            None => Err(Error::Miss),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let deleted: i64 = self.client.del(key).await?;

        Ok(deleted > 0)
    }
}
