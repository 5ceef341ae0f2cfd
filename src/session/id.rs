use data_encoding::BASE32_NOPAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::Error;

const ID_BYTES: usize = 32;

/// Length of a generated session id: 32 random bytes in unpadded base32.
pub const ID_LENGTH: usize = 52;

/// Generates a new session id from the operating system's random source.
///
/// The id only uses the RFC 4648 base32 alphabet (`A-Z`, `2-7`), so it is safe
/// in cookie values and cache keys alike.
pub fn generate() -> Result<String, Error> {
    let mut bytes = [0u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| Error::Rng(err.to_string()))?;

    Ok(BASE32_NOPAD.encode(&bytes))
}
