/// Refresh Token Whitelist Checks
///
/// Refresh tokens are JWTs whose subject is a session ID. The whitelist
/// stores one entry per session with the SHA-256 hash of the current refresh
/// token (never the token itself). A token is accepted only while:
/// - its session entry exists (deleting the entry revokes it)
/// - the stored hash equals the presented token's hash (the last token
///   issued for the session; older ones are replays)

use sha2::{Digest, Sha256};

use crate::domain::Session;
use crate::error::{AppError, AuthError};

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Match a presented refresh token against its whitelist entry
pub fn check_whitelisted(entry: Option<Session>, token: &str) -> Result<Session, AppError> {
    let session = entry.ok_or(AppError::Auth(AuthError::SessionRevoked))?;

    if session.refresh_token_hash != hash_token(token) {
        tracing::warn!(
            session_id = %session.session_id,
            account_id = %session.account_id,
            "Refresh token does not match the whitelisted token"
        );
        return Err(AppError::Auth(AuthError::TokenMismatch));
    }

    Ok(session)
}
