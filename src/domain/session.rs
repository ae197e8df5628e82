use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A refresh-whitelist entry. One per login; an account may hold many.
///
/// Only the SHA-256 hash of the refresh token is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: Uuid,
    pub account_id: Uuid,
    pub refresh_token_hash: String,
    pub issued_at: DateTime<Utc>,
}
