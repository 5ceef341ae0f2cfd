//! Request-scoped session state.

mod cookie_options;
pub mod id;

pub use cookie_options::{CookieOptions, DEFAULT_MAX_AGE};

use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::Error;

#[cfg(feature = "bincode")]
pub(crate) fn serialize_value<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "bincode")]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    bincode::serde::decode_from_slice(value, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(feature = "messagepack")]
pub(crate) fn serialize_value<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "messagepack")]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    rmp_serde::from_slice(value).map_err(|e| Error::Decode(e.to_string()))
}

/// The values of a session.
///
/// Each value is serialized on insert and deserialized lazily on
/// [`Values::get`], so a session can hold any mix of `serde` types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(HashMap<String, Vec<u8>>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes the value stored under `key`.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.0
            .get(key)
            .map(|bytes| deserialize_value(bytes))
            .transpose()
    }

    /// Serializes `value` under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serialize_value(&value)?;
        self.0.insert(key.into(), bytes);
        Ok(())
    }

    /// Returns `true` if a value was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serialize_value(self)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        deserialize_value(bytes)
    }
}

/// A session, owned by the request that loaded it.
///
/// Sessions come from [`CacheStore::new_session`](crate::CacheStore::new_session)
/// or a request's [`Registry`](crate::Registry), are mutated by the handler and
/// written back with [`CacheStore::save`](crate::CacheStore::save).
#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) id: String,
    name: String,
    values: Values,
    pub(crate) is_new: bool,
    /// Attributes of the cookie written on save.
    pub options: CookieOptions,
}

impl Session {
    pub(crate) fn new(name: &str, options: CookieOptions) -> Self {
        Self {
            id: String::new(),
            name: name.to_owned(),
            values: Values::new(),
            is_new: true,
            options,
        }
    }

    /// The session id, empty until the session is first saved.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name of the session cookie.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` once the session was restored from the cache.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Values {
        &mut self.values
    }

    /// Shorthand for `self.values().get(key)`.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.values.get(key)
    }

    /// Shorthand for `self.values_mut().insert(key, value)`.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.values.insert(key, value)
    }

    /// Shorthand for `self.values_mut().remove(key)`.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key)
    }

    pub(crate) fn set_values(&mut self, values: Values) {
        self.values = values;
    }
}
