//! Account lifecycle: registration, login, token refresh, activation and
//! student self-service.
//!
//! Every operation is a short sequence of store calls. Nothing is cached
//! between calls; the stores are the only shared state.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{check_whitelisted, validate_password, PasswordHasher, TokenIssuer, TokenPair};
use crate::domain::{Account, NewAccount, ProfileUpdate, Role};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::store::{CredentialStore, RefreshWhitelist};
use crate::validators::{is_valid_class_room, is_valid_email, is_valid_name, is_valid_username};

/// Unvalidated registration input
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub role: Option<Role>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub class_room: Option<String>,
    pub password: Option<String>,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub account: Account,
    pub session_id: Uuid,
    pub tokens: TokenPair,
}

/// Policy knobs that change login behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPolicy {
    pub reject_deactivated: bool,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn CredentialStore>,
    sessions: Arc<dyn RefreshWhitelist>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
    policy: LoginPolicy,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn CredentialStore>,
        sessions: Arc<dyn RefreshWhitelist>,
        tokens: TokenIssuer,
        hasher: PasswordHasher,
        policy: LoginPolicy,
    ) -> Self {
        Self {
            accounts,
            sessions,
            tokens,
            hasher,
            policy,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Validate registration input for `role` and build the record to store.
    fn validate_registration(
        &self,
        role: Role,
        registration: &Registration,
    ) -> Result<(NewAccount, String), AppError> {
        if let Some(claimed) = registration.role {
            if claimed != role {
                return Err(ValidationError::InvalidFormat("role".to_string()).into());
            }
        }

        let email = is_valid_email(required("email", &registration.email)?)?;
        let name = is_valid_name("name", required("name", &registration.name)?)?;
        let password = required("password", &registration.password)?.to_string();

        let (last_name, username) = match role {
            Role::Admin => (
                registration
                    .last_name
                    .as_deref()
                    .map(|v| is_valid_name("lastName", v))
                    .transpose()?,
                registration
                    .username
                    .as_deref()
                    .map(is_valid_username)
                    .transpose()?,
            ),
            Role::Teacher | Role::Student => (
                Some(is_valid_name(
                    "lastName",
                    required("lastName", &registration.last_name)?,
                )?),
                Some(is_valid_username(required(
                    "username",
                    &registration.username,
                )?)?),
            ),
        };

        let class_room = match role {
            Role::Student => registration
                .class_room
                .as_deref()
                .map(is_valid_class_room)
                .transpose()?,
            _ => None,
        };

        validate_password(role, &password)?;

        Ok((
            NewAccount {
                role,
                name,
                last_name,
                email,
                username,
                class_room,
                password_hash: String::new(),
            },
            password,
        ))
    }

    /// Create an account of `role` and open its first session
    pub async fn register(
        &self,
        role: Role,
        registration: Registration,
    ) -> Result<AuthOutcome, AppError> {
        let context = ErrorContext::new("account_registration");
        let (mut new_account, password) = self.validate_registration(role, &registration)?;

        if self.accounts.find_by_email(&new_account.email).await?.is_some() {
            return Err(AppError::conflict("email already registered"));
        }

        new_account.password_hash = self.hasher.hash(&password)?;

        // The store's unique constraint settles races the pre-check missed.
        let account = self.accounts.create(new_account).await?;

        let outcome = self.open_session(account).await?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            account_id = %outcome.account.id,
            role = %role,
            "Account registered successfully"
        );

        Ok(outcome)
    }

    /// Authenticate an account of `role` by email and password.
    ///
    /// Earlier sessions stay valid; each login is a new device session.
    pub async fn login(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, AppError> {
        let context = ErrorContext::new("account_login");

        if email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email".to_string()).into());
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password".to_string()).into());
        }

        let account = self
            .accounts
            .find_by_email(email.trim())
            .await?
            .filter(|a| a.role == role)
            .ok_or(AppError::Auth(AuthError::UnknownAccount))?;

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }

        if account.is_deactivated && self.policy.reject_deactivated {
            return Err(AppError::Auth(AuthError::AccountInactive));
        }

        let outcome = self.open_session(account).await?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            account_id = %outcome.account.id,
            session_id = %outcome.session_id,
            "Account logged in successfully"
        );

        Ok(outcome)
    }

    async fn open_session(&self, account: Account) -> Result<AuthOutcome, AppError> {
        let session_id = Uuid::new_v4();
        let tokens = self.tokens.issue(&account, session_id)?;
        self.sessions
            .add(session_id, &tokens.refresh_token, account.id)
            .await?;

        Ok(AuthOutcome {
            account,
            session_id,
            tokens,
        })
    }

    /// Exchange a whitelisted refresh token for a new pair.
    ///
    /// The session keeps its ID; the stored token is rotated, so the token
    /// presented here stops working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.tokens.validate_refresh_token(refresh_token)?;
        let session_id = claims.session_id()?;

        let entry = self.sessions.find_by_session_id(session_id).await?;
        let session = check_whitelisted(entry, refresh_token)?;
        if claims.account_id()? != session.account_id {
            return Err(AppError::Auth(AuthError::TokenInvalid));
        }

        let account = match self.accounts.find_by_id(session.account_id).await? {
            Some(account) => account,
            None => {
                self.sessions.revoke(session_id).await?;
                return Err(AppError::Auth(AuthError::SessionRevoked));
            }
        };

        if account.is_deactivated && self.policy.reject_deactivated {
            return Err(AppError::Auth(AuthError::AccountInactive));
        }

        let tokens = self.tokens.issue(&account, session_id)?;
        let rotated = self
            .sessions
            .replace(session_id, &session.refresh_token_hash, &tokens.refresh_token)
            .await?;
        if !rotated {
            // Lost the race: another exchange rotated or revoked the session.
            return match self.sessions.find_by_session_id(session_id).await? {
                Some(_) => {
                    tracing::warn!(
                        account_id = %account.id,
                        session_id = %session_id,
                        "Concurrent refresh token reuse rejected"
                    );
                    Err(AppError::Auth(AuthError::TokenMismatch))
                }
                None => Err(AppError::Auth(AuthError::SessionRevoked)),
            };
        }

        tracing::info!(
            account_id = %account.id,
            session_id = %session_id,
            "Refresh token rotated"
        );

        Ok(tokens)
    }

    /// Revoke the session a refresh token belongs to
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self.tokens.validate_refresh_token(refresh_token)?;
        let session_id = claims.session_id()?;

        let entry = self.sessions.find_by_session_id(session_id).await?;
        let session = check_whitelisted(entry, refresh_token)?;
        self.sessions.revoke(session.session_id).await?;

        tracing::info!(
            account_id = %session.account_id,
            session_id = %session_id,
            "Session revoked"
        );
        Ok(())
    }

    /// Activate or deactivate the `role` account with `username`
    pub async fn set_activation(
        &self,
        role: Role,
        username: &str,
        active: bool,
    ) -> Result<Account, AppError> {
        let account = self
            .accounts
            .find_by_username(role, username.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} '{}'", role, username.trim())))?;

        let account = self.accounts.set_deactivated(account.id, !active).await?;

        tracing::info!(
            account_id = %account.id,
            role = %role,
            is_deactivated = account.is_deactivated,
            "Account activation changed"
        );
        Ok(account)
    }

    /// Fetch an account, optionally requiring a particular role
    pub async fn get_profile(&self, id: Uuid, role: Option<Role>) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .filter(|a| role.map_or(true, |r| a.role == r))
            .ok_or_else(|| AppError::not_found("account"))
    }

    async fn student(&self, id: Uuid) -> Result<Account, AppError> {
        self.get_profile(id, Some(Role::Student)).await
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Account, AppError> {
        self.student(id).await?;

        let update = ProfileUpdate {
            name: update
                .name
                .as_deref()
                .map(|v| is_valid_name("name", v))
                .transpose()?,
            last_name: update
                .last_name
                .as_deref()
                .map(|v| is_valid_name("lastName", v))
                .transpose()?,
            username: update
                .username
                .as_deref()
                .map(is_valid_username)
                .transpose()?,
            class_room: update
                .class_room
                .as_deref()
                .map(is_valid_class_room)
                .transpose()?,
        };

        if update.is_empty() {
            return Err(ValidationError::Malformed("no profile fields to update".to_string()).into());
        }

        let account = self.accounts.update_profile(id, &update).await?;
        tracing::info!(account_id = %id, "Student profile updated");
        Ok(account)
    }

    /// Delete a student and every session it holds
    pub async fn delete_profile(&self, id: Uuid) -> Result<(), AppError> {
        self.student(id).await?;

        let revoked = self.sessions.revoke_all_for_account(id).await?;
        if !self.accounts.delete(id).await? {
            return Err(AppError::not_found("account"));
        }

        tracing::info!(account_id = %id, revoked_sessions = revoked, "Student deleted");
        Ok(())
    }

    /// Replace a student's password after checking the current one
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let account = self.student(id).await?;

        if !self.hasher.verify(current_password, &account.password_hash)? {
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }
        validate_password(account.role, new_password)?;

        let digest = self.hasher.hash(new_password)?;
        self.accounts.set_password_hash(id, &digest).await?;

        tracing::info!(account_id = %id, "Student password changed");
        Ok(())
    }
}
