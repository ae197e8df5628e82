/// JWT Claims structures
///
/// Access tokens identify an account; refresh tokens identify a session.
/// Both carry a random `jti` so that two tokens minted in the same second
/// for the same subject are still distinct.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;
use crate::error::{AppError, AuthError};

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Account ID
    pub sub: String,
    pub role: Role,
    /// Unique token ID
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl AccessClaims {
    pub fn new(account_id: Uuid, role: Role, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}

/// Claims for long-lived refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Session ID
    pub sub: String,
    /// Owning account ID
    pub aid: String,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(session_id: Uuid, account_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: session_id.to_string(),
            aid: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn session_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.aid).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}
