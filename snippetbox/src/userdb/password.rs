//! PBKDF2-HMAC-SHA256 password hashing
//!
//! Hashes are self-describing: `$pbkdf2-sha256$<iterations>$<salt>$<hash>`, with salt
//! and hash base64url encoded, so the iteration count can be raised without
//! invalidating existing accounts.

use std::num::NonZeroU32;

use ring::pbkdf2;

use super::errors::UserError;
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

pub fn hash_password(password: &str, iterations: u32) -> Result<String, UserError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| UserError::Hash("iteration count must be positive".to_string()))?;
    let salt = gen_random_bytes(SALT_LEN)?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "${SCHEME}${iterations}${}${}",
        base64url_encode(&salt),
        base64url_encode(&hash)
    ))
}

/// Checks `password` against an encoded hash in constant time.
///
/// Returns `Ok(false)` on mismatch and an error only if `encoded` is not a hash
/// this module produced.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, UserError> {
    let invalid = || UserError::Hash("unrecognised password hash format".to_string());

    let mut parts = encoded.split('$');
    let (Some(""), Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(invalid());
    };

    let iterations: NonZeroU32 = iterations.parse().map_err(|_| invalid())?;
    let salt = base64url_decode(salt)?;
    let hash = base64url_decode(hash)?;

    Ok(pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok())
}

/// [`hash_password`] on the blocking thread pool
pub(crate) async fn spawn_hash_password(
    password: &str,
    iterations: u32,
) -> Result<String, UserError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| UserError::Hash(format!("hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking thread pool
pub(crate) async fn spawn_verify_password(
    password: &str,
    encoded: String,
) -> Result<bool, UserError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| UserError::Hash(format!("verification task failed: {e}")))?
}

/// A well-formed hash with `iterations` rounds that no password is expected to match.
///
/// Checked in place of a stored hash when the email is unknown, so both kinds of
/// failed login cost the same.
pub(crate) fn decoy_hash(iterations: u32) -> String {
    format!(
        "${SCHEME}${iterations}${}${}",
        base64url_encode(&[0u8; SALT_LEN]),
        base64url_encode(&[0u8; HASH_LEN])
    )
}
