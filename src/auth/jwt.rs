/// JWT Token Issuing and Validation
///
/// Access tokens are verified statelessly on every request. Refresh tokens
/// are signed with a different secret and are only honoured while their
/// session is whitelisted (see `store::RefreshWhitelist`).

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::domain::Account;
use crate::error::{AppError, AuthError};

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtSettings,
}

impl TokenIssuer {
    pub fn new(config: JwtSettings) -> Self {
        Self { config }
    }

    /// Access token lifetime in seconds, echoed back to clients
    pub fn access_token_expiry(&self) -> i64 {
        self.config.access_token_expiry
    }

    /// Issue an access/refresh pair bound to `session_id`
    pub fn issue(&self, account: &Account, session_id: Uuid) -> Result<TokenPair, AppError> {
        let access = AccessClaims::new(
            account.id,
            account.role,
            self.config.access_token_expiry,
            self.config.issuer.clone(),
        );
        let refresh = RefreshClaims::new(
            session_id,
            account.id,
            self.config.refresh_token_expiry,
            self.config.issuer.clone(),
        );

        Ok(TokenPair {
            access_token: sign(&access, &self.config.access_secret)?,
            refresh_token: sign(&refresh, &self.config.refresh_secret)?,
        })
    }

    /// Validate and extract claims from an access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        verify(token, &self.config.access_secret, &self.config.issuer)
    }

    /// Validate a refresh token's signature, expiry and issuer.
    ///
    /// This does not consult the whitelist.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        verify(token, &self.config.refresh_secret, &self.config.issuer)
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, issuer: &str) -> Result<T, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("JWT validation error: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
                _ => AppError::Auth(AuthError::TokenInvalid),
            }
        })
}
