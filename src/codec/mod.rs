//! Authenticated encoding of cookie values and cached session payloads.
//!
//! A store holds an ordered list of [`Codec`]s. The first one encodes, and every
//! one of them is tried in order when decoding, so a key can be rotated by
//! putting the new codec first and keeping the old one around for cookies that
//! were issued before the rotation.

mod secure;

pub use secure::{DEFAULT_MAX_AGE, DEFAULT_MAX_LENGTH, KeyPair, SecureCookie};

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no codecs were provided")]
    NoCodecs,

    #[error("hash key is not set")]
    HashKeyNotSet,

    #[error("block key is empty")]
    EmptyBlockKey,

    #[error("the value is too long")]
    EncodedValueTooLong,

    #[error("the value is not valid")]
    InvalidMac,

    #[error("the value could not be decrypted")]
    DecryptionFailed,

    #[error("the value could not be decoded: {0}")]
    Malformed(String),

    #[error("expired timestamp")]
    TimestampExpired,

    #[error("timestamp is too new")]
    TimestampTooNew,

    #[error("{}", join(.0))]
    Multi(Vec<Error>),
}

impl Error {
    /// Returns `true` when the value was rejected by authentication or
    /// decryption, as opposed to being malformed or out of date.
    pub fn is_authentication(&self) -> bool {
        match self {
            Error::InvalidMac | Error::DecryptionFailed => true,
            Error::Multi(errors) => errors.iter().all(Error::is_authentication),
            _ => false,
        }
    }
}

fn join(errors: &[Error]) -> String {
    match errors {
        [] => "no codec could decode the value".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} other errors)", rest.len()),
    }
}

/// An authenticated transform for values that leave the server, either as a
/// cookie value or as a cache payload.
///
/// `name` is the cookie name the value belongs to; implementations bind it to
/// the output so a value issued for one cookie is not accepted for another.
pub trait Codec: Send + Sync + fmt::Debug {
    fn encode(&self, name: &str, value: &[u8]) -> Result<String, Error>;

    fn decode(&self, name: &str, value: &str) -> Result<Vec<u8>, Error>;

    /// Limits the length of encoded values, `0` meaning unlimited.
    ///
    /// Returns `false` when the codec has no such limit, in which case nothing changes.
    fn set_max_length(&mut self, _limit: usize) -> bool {
        false
    }

    /// Limits the age of decoded values in seconds, `0` meaning unlimited.
    ///
    /// Returns `false` when the codec does not track value age.
    fn set_max_age(&mut self, _seconds: i64) -> bool {
        false
    }
}

/// Builds one [`SecureCookie`] per key pair, keeping their order.
pub fn codecs_from_pairs(pairs: &[KeyPair]) -> Result<Vec<Box<dyn Codec>>, Error> {
    if pairs.is_empty() {
        return Err(Error::NoCodecs);
    }

    pairs
        .iter()
        .map(|pair| SecureCookie::new(pair).map(|codec| Box::new(codec) as Box<dyn Codec>))
        .collect()
}

/// Encodes `value` with the first codec of the sequence.
pub fn encode_primary(name: &str, value: &[u8], codecs: &[Box<dyn Codec>]) -> Result<String, Error> {
    match codecs.first() {
        Some(codec) => codec.encode(name, value),
        None => Err(Error::NoCodecs),
    }
}

/// Decodes `value` with each codec in turn; the first one that accepts it wins.
///
/// When every codec rejects the value, all of their errors are returned in
/// [`Error::Multi`], in codec order.
pub fn decode_multi(name: &str, value: &str, codecs: &[Box<dyn Codec>]) -> Result<Vec<u8>, Error> {
    if codecs.is_empty() {
        return Err(Error::NoCodecs);
    }

    let mut errors = Vec::with_capacity(codecs.len());
    for codec in codecs {
        match codec.decode(name, value) {
            Ok(decoded) => return Ok(decoded),
            Err(err) => errors.push(err),
        }
    }

    Err(Error::Multi(errors))
}
