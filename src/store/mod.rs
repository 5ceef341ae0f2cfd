//! The cache-backed session store.

mod transport;

pub use transport::CookieTransport;

use std::fmt;
use std::sync::Arc;

use crate::cache::{self, CacheClient, Item};
use crate::codec::{self, Codec, KeyPair};
use crate::session::{CookieOptions, Session, Values, id};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error(transparent)]
    Cache(#[from] cache::Error),

    #[error("Encoding failed with: {0}")]
    Encode(String),

    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("random source failed: {0}")]
    Rng(String),

    #[error("session `{0}` is still locked")]
    Busy(String),
}

/// Keeps session values in a [`CacheClient`] and hands the client an
/// authenticated cookie holding only the session id.
///
/// Cache entries live under `key_prefix + id`. Both the cookie and the cache
/// entry are produced by the first codec; every codec is tried, in order, when
/// reading them back.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rucs::{CacheStore, KeyPair};
/// use rucs::cache::MemoryCache;
///
/// let store = CacheStore::new(
///     Arc::new(MemoryCache::new()),
///     "sess_",
///     &[KeyPair::new(b"hash-key".to_vec()).with_block_key(b"block-key".to_vec())],
/// )
/// .unwrap();
/// ```
pub struct CacheStore<C: CacheClient> {
    client: Arc<C>,
    key_prefix: String,
    codecs: Vec<Box<dyn Codec>>,
    options: CookieOptions,
}

impl<C: CacheClient> CacheStore<C> {
    /// Creates a store with one [`SecureCookie`](crate::codec::SecureCookie)
    /// per key pair, cookie options of path `/` and a 30 day max-age, and a
    /// 4096 byte limit on encoded values.
    pub fn new(client: Arc<C>, key_prefix: impl Into<String>, key_pairs: &[KeyPair]) -> Result<Self, Error> {
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            codecs: codec::codecs_from_pairs(key_pairs)?,
            options: CookieOptions::default(),
        })
    }

    pub fn builder() -> StoreBuilder<C> {
        StoreBuilder::default()
    }

    /// Limits the length of encoded cookies and cache payloads, `0` meaning unlimited.
    ///
    /// Codecs without a length limit are left untouched.
    pub fn set_max_length(&mut self, limit: usize) {
        for codec in &mut self.codecs {
            if !codec.set_max_length(limit) {
                tracing::debug!(?codec, "codec does not support a maximum length");
            }
        }
    }

    /// Sets the default cookie max-age and the age limit of every codec that
    /// supports one.
    pub fn set_max_age(&mut self, seconds: i64) {
        self.options.max_age = seconds;
        for codec in &mut self.codecs {
            codec.set_max_age(seconds.max(0));
        }
    }

    /// Replaces the default cookie options given to new sessions.
    pub fn set_options(&mut self, options: CookieOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// The cache key of the session with the given id.
    pub fn cache_key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    /// Builds the session `name` for the current request.
    ///
    /// A session is always returned. Without a cookie it is new and empty.
    /// With a valid cookie it is restored from the cache. When the cookie
    /// fails to decode, the session is new and empty and the error is
    /// returned alongside it; when the cache read fails, the session keeps the
    /// id from the cookie but has no values.
    #[tracing::instrument(name = "loading session", skip(self, cookies))]
    pub async fn new_session<T>(&self, cookies: &T, name: &str) -> (Session, Option<Error>)
    where
        T: CookieTransport + ?Sized,
    {
        let mut session = Session::new(name, self.options);

        let Some(cookie) = cookies.get_cookie(name) else {
            return (session, None);
        };

        let id = match self.decode_id(name, cookie.value()) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(
                    err = %err,
                    "possibly suspicious activity: session cookie failed to decode"
                );
                return (session, Some(err));
            }
        };

        session.id = id;
        match self.load(&mut session).await {
            Ok(()) => {
                session.is_new = false;
                (session, None)
            }
            Err(err) => (session, Some(err)),
        }
    }

    /// Writes the session values to the cache, then sets the session cookie.
    ///
    /// A session without an id gets a fresh one first. No cookie is set when
    /// the cache write fails.
    #[tracing::instrument(name = "saving session", skip(self, cookies, session), fields(cookie = session.name()))]
    pub async fn save<T>(&self, cookies: &T, session: &mut Session) -> Result<(), Error>
    where
        T: CookieTransport + ?Sized,
    {
        if session.id.is_empty() {
            session.id = id::generate()?;
        }

        self.persist(session).await?;

        let encoded = codec::encode_primary(session.name(), session.id.as_bytes(), &self.codecs)
            .map_err(|err| {
                tracing::error!(err = %err, "failed to encode session cookie");
                err
            })?;

        cookies.set_cookie(
            session
                .options
                .to_cookie(session.name().to_owned(), encoded),
        );

        Ok(())
    }

    /// Deletes the session from the cache and tells the client to drop its cookie.
    ///
    /// The session is left empty and without an id, so saving it again starts
    /// a new session.
    #[tracing::instrument(name = "destroying session", skip(self, cookies, session), fields(cookie = session.name()))]
    pub async fn destroy<T>(&self, cookies: &T, session: &mut Session) -> Result<(), Error>
    where
        T: CookieTransport + ?Sized,
    {
        if !session.id.is_empty() {
            let key = self.cache_key(&session.id);
            self.client.delete(&key).await.map_err(|err| {
                tracing::error!(err = %err, "failed to delete session from cache");
                err
            })?;
        }

        let removal = session.options.max_age(-1);
        cookies.set_cookie(removal.to_cookie(session.name().to_owned(), String::new()));

        session.id.clear();
        session.values_mut().clear();
        session.is_new = true;

        Ok(())
    }

    fn decode_id(&self, name: &str, value: &str) -> Result<String, Error> {
        let bytes = codec::decode_multi(name, value, &self.codecs)?;
        String::from_utf8(bytes).map_err(|err| Error::Decode(err.to_string()))
    }

    async fn persist(&self, session: &Session) -> Result<(), Error> {
        let payload = session.values().to_bytes()?;
        let encoded = codec::encode_primary(session.name(), &payload, &self.codecs).map_err(|err| {
            tracing::error!(err = %err, "failed to encode session values");
            err
        })?;

        let item = Item::new(self.cache_key(&session.id), encoded);
        self.client.set(item).await.map_err(|err| {
            tracing::error!(err = %err, "failed to save session to cache");
            err
        })?;

        Ok(())
    }

    async fn load(&self, session: &mut Session) -> Result<(), Error> {
        let key = self.cache_key(&session.id);
        let item = match self.client.get(&key).await {
            Ok(item) => item,
            Err(cache::Error::Miss) => {
                tracing::debug!("session not found in cache");
                return Err(cache::Error::Miss.into());
            }
            Err(err) => {
                tracing::error!(err = %err, "failed to get session from cache");
                return Err(err.into());
            }
        };

        let encoded = String::from_utf8(item.value).map_err(|err| Error::Decode(err.to_string()))?;
        let payload = codec::decode_multi(session.name(), &encoded, &self.codecs)?;
        session.set_values(Values::from_bytes(&payload)?);

        Ok(())
    }
}

impl<C: CacheClient> fmt::Debug for CacheStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("key_prefix", &self.key_prefix)
            .field("codecs", &self.codecs)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`CacheStore`].
///
/// Unlike [`CacheStore::new`], it accepts custom [`Codec`]s and checks at
/// [`build`](StoreBuilder::build) time that a cache client was supplied.
pub struct StoreBuilder<C: CacheClient> {
    client: Option<Arc<C>>,
    key_prefix: String,
    key_pairs: Vec<KeyPair>,
    codecs: Vec<Box<dyn Codec>>,
    options: CookieOptions,
    max_length: Option<usize>,
    max_age: Option<i64>,
}

impl<C: CacheClient> Default for StoreBuilder<C> {
    fn default() -> Self {
        Self {
            client: None,
            key_prefix: String::new(),
            key_pairs: Vec::new(),
            codecs: Vec::new(),
            options: CookieOptions::default(),
            max_length: None,
            max_age: None,
        }
    }
}

impl<C: CacheClient> StoreBuilder<C> {
    pub fn client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Adds a [`SecureCookie`](crate::codec::SecureCookie) built from `pair`
    /// after the codecs added so far.
    pub fn key_pair(mut self, pair: KeyPair) -> Self {
        self.key_pairs.push(pair);
        self
    }

    /// Adds a custom codec after the key-pair codecs.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.push(Box::new(codec));
        self
    }

    pub fn cookie_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn build(self) -> Result<CacheStore<C>, Error> {
        let client = self
            .client
            .ok_or_else(|| Error::Config("a cache client is required".to_string()))?;

        let mut codecs = if self.key_pairs.is_empty() {
            Vec::new()
        } else {
            codec::codecs_from_pairs(&self.key_pairs)?
        };
        codecs.extend(self.codecs);

        if codecs.is_empty() {
            return Err(Error::Config("at least one key pair or codec is required".to_string()));
        }

        let mut store = CacheStore {
            client,
            key_prefix: self.key_prefix,
            codecs,
            options: self.options,
        };

        if let Some(limit) = self.max_length {
            store.set_max_length(limit);
        }

        if let Some(seconds) = self.max_age {
            store.set_max_age(seconds);
        }

        Ok(store)
    }
}
