use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use cookie::time::OffsetDateTime;
use cookie::{Cookie, CookieJar, Key};
use sha2::{Digest, Sha256};

use super::{Codec, Error};

/// Default limit for the length of an encoded value, in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Default limit for the age of a decoded value: 30 days.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

const KEY_LENGTH: usize = 32;

/// Key material for one [`SecureCookie`].
///
/// The hash key authenticates values. The optional block key additionally
/// encrypts them. Keys of any length are accepted; anything that is not
/// exactly 32 bytes is stretched or compressed with SHA-256.
#[derive(Clone)]
pub struct KeyPair {
    hash_key: Vec<u8>,
    block_key: Option<Vec<u8>>,
}

impl KeyPair {
    pub fn new(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    pub fn with_block_key(mut self, block_key: impl Into<Vec<u8>>) -> Self {
        self.block_key = Some(block_key.into());
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.block_key.is_some()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"[redacted]")
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Protection {
    Signed,
    SignedPrivate,
}

/// A [`Codec`] built on the `cookie` crate's signed and private jars.
///
/// The encoded form is `sign(encrypt?(timestamp "|" base64(value)))`, where
/// signing is HMAC-SHA256 and encryption is AES-256-GCM with the cookie name as
/// associated data. The timestamp lets decoding refuse values older than
/// [`SecureCookie::max_age`].
#[derive(Clone)]
pub struct SecureCookie {
    key: Key,
    protection: Protection,
    max_length: usize,
    max_age: i64,
    min_age: i64,
}

impl SecureCookie {
    pub fn new(pair: &KeyPair) -> Result<Self, Error> {
        if pair.hash_key.is_empty() {
            return Err(Error::HashKeyNotSet);
        }

        let mut master = [0u8; KEY_LENGTH * 2];
        master[..KEY_LENGTH].copy_from_slice(&key_material(&pair.hash_key));

        let protection = match &pair.block_key {
            Some(block_key) if block_key.is_empty() => return Err(Error::EmptyBlockKey),
            Some(block_key) => {
                master[KEY_LENGTH..].copy_from_slice(&key_material(block_key));
                Protection::SignedPrivate
            }
            None => Protection::Signed,
        };

        Ok(Self {
            key: Key::from(&master),
            protection,
            max_length: DEFAULT_MAX_LENGTH,
            max_age: DEFAULT_MAX_AGE,
            min_age: 0,
        })
    }

    /// Sets the maximum length of encoded values. `0` disables the check.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = limit;
        self
    }

    /// Sets the maximum age, in seconds, of decoded values. `0` disables the check.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Sets the minimum age, in seconds, of decoded values. `0` disables the check.
    pub fn min_age(mut self, seconds: i64) -> Self {
        self.min_age = seconds;
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.protection == Protection::SignedPrivate
    }

    fn encode_at(&self, name: &str, value: &[u8], timestamp: i64) -> Result<String, Error> {
        let mut sealed = format!("{timestamp}|{}", BASE64_URL_SAFE_NO_PAD.encode(value));

        if self.protection == Protection::SignedPrivate {
            let mut jar = CookieJar::new();
            jar.private_mut(&self.key)
                .add(Cookie::new(name.to_owned(), sealed));
            sealed = sealed_value(&jar, name)?;
        }

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(name.to_owned(), sealed));
        let encoded = sealed_value(&jar, name)?;

        if self.max_length != 0 && encoded.len() > self.max_length {
            return Err(Error::EncodedValueTooLong);
        }

        Ok(encoded)
    }

    fn decode_at(&self, name: &str, value: &str, now: i64) -> Result<Vec<u8>, Error> {
        if self.max_length != 0 && value.len() > self.max_length {
            return Err(Error::EncodedValueTooLong);
        }

        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(name.to_owned(), value.to_owned()));
        let verified = jar.signed(&self.key).get(name).ok_or(Error::InvalidMac)?;

        let payload = match self.protection {
            Protection::Signed => verified.value().to_owned(),
            Protection::SignedPrivate => {
                let mut jar = CookieJar::new();
                jar.add_original(verified);
                jar.private(&self.key)
                    .get(name)
                    .ok_or(Error::DecryptionFailed)?
                    .value()
                    .to_owned()
            }
        };

        let (timestamp, data) = payload
            .split_once('|')
            .ok_or_else(|| Error::Malformed("missing timestamp".to_string()))?;
        let timestamp = timestamp
            .parse::<i64>()
            .map_err(|err| Error::Malformed(err.to_string()))?;
        self.check_age(timestamp, now)?;

        BASE64_URL_SAFE_NO_PAD
            .decode(data)
            .map_err(|err| Error::Malformed(err.to_string()))
    }

    fn check_age(&self, issued: i64, now: i64) -> Result<(), Error> {
        if self.min_age != 0 && issued > now - self.min_age {
            return Err(Error::TimestampTooNew);
        }

        if self.max_age != 0 && issued < now - self.max_age {
            return Err(Error::TimestampExpired);
        }

        Ok(())
    }
}

impl Codec for SecureCookie {
    fn encode(&self, name: &str, value: &[u8]) -> Result<String, Error> {
        self.encode_at(name, value, unix_now())
    }

    fn decode(&self, name: &str, value: &str) -> Result<Vec<u8>, Error> {
        self.decode_at(name, value, unix_now())
    }

    fn set_max_length(&mut self, limit: usize) -> bool {
        self.max_length = limit;
        true
    }

    fn set_max_age(&mut self, seconds: i64) -> bool {
        self.max_age = seconds;
        true
    }
}

impl fmt::Debug for SecureCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCookie")
            .field("key", &"[redacted]")
            .field("protection", &self.protection)
            .field("max_length", &self.max_length)
            .field("max_age", &self.max_age)
            .field("min_age", &self.min_age)
            .finish()
    }
}

fn key_material(key: &[u8]) -> [u8; KEY_LENGTH] {
    let mut out = [0u8; KEY_LENGTH];
    if key.len() == KEY_LENGTH {
        out.copy_from_slice(key);
    } else {
        out.copy_from_slice(&Sha256::digest(key));
    }
    out
}

fn sealed_value(jar: &CookieJar, name: &str) -> Result<String, Error> {
    jar.get(name)
        .map(|cookie| cookie.value().to_owned())
        .ok_or_else(|| Error::Malformed(format!("no sealed value for `{name}`")))
}

fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
