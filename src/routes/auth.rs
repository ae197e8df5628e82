/// Authentication Routes
///
/// Request bodies and response shapes shared by the per-role register and
/// login endpoints, plus token refresh and logout.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::Role;
use crate::error::{AppError, ValidationError};
use crate::services::{AccountService, AuthOutcome, Registration};
use crate::auth::TokenPair;

/// Registration request, shared by all roles.
///
/// Every field is optional here so that a missing field is reported as a
/// validation error naming that field.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: Option<Role>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub class_room: Option<String>,
    pub password: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(form: RegisterRequest) -> Self {
        Registration {
            role: form.role,
            name: form.name,
            last_name: form.last_name,
            email: form.email,
            username: form.username,
            class_room: form.class_room,
            password: form.password,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token refresh and logout request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl RefreshRequest {
    fn token(&self) -> Result<&str, AppError> {
        match self.refresh_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            _ => Err(ValidationError::EmptyField("refreshToken".to_string()).into()),
        }
    }
}

fn token_fields(body: &mut Map<String, Value>, tokens: &TokenPair, expires_in: i64) {
    body.insert("accessToken".to_string(), json!(tokens.access_token));
    body.insert("refreshToken".to_string(), json!(tokens.refresh_token));
    body.insert("tokenType".to_string(), json!("Bearer"));
    body.insert("expiresIn".to_string(), json!(expires_in));
}

/// `{ <key>: AccountView, accessToken, refreshToken, tokenType, expiresIn }`
pub fn auth_response_body(key: &str, outcome: &AuthOutcome, expires_in: i64) -> Value {
    let mut body = Map::new();
    body.insert(key.to_string(), json!(outcome.account.view()));
    token_fields(&mut body, &outcome.tokens, expires_in);
    Value::Object(body)
}

/// Shared handler body for `POST /<role>/register`
pub async fn register_as(
    role: Role,
    form: RegisterRequest,
    accounts: &AccountService,
) -> Result<HttpResponse, AppError> {
    let outcome = accounts.register(role, form.into()).await?;
    let key = format!("new{}", role.title());

    Ok(HttpResponse::Created().json(auth_response_body(
        &key,
        &outcome,
        accounts.tokens().access_token_expiry(),
    )))
}

/// Shared handler body for `POST /<role>/login`
pub async fn login_as(
    role: Role,
    form: LoginRequest,
    accounts: &AccountService,
) -> Result<HttpResponse, AppError> {
    let outcome = accounts
        .login(
            role,
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Created().json(auth_response_body(
        role.as_str(),
        &outcome,
        accounts.tokens().access_token_expiry(),
    )))
}

/// POST /auth/refresh
///
/// Exchange a whitelisted refresh token for a new access/refresh pair.
/// The presented refresh token is invalid afterwards.
///
/// # Errors
/// - 400: Missing refresh token
/// - 401: Invalid, expired, revoked or superseded refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let tokens = accounts.refresh(form.token()?).await?;

    let mut body = Map::new();
    token_fields(&mut body, &tokens, accounts.tokens().access_token_expiry());
    Ok(HttpResponse::Ok().json(Value::Object(body)))
}

/// POST /auth/logout
///
/// Revoke the session the refresh token belongs to. Access tokens already
/// issued stay valid until they expire.
pub async fn logout(
    form: web::Json<RefreshRequest>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    accounts.logout(form.token()?).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewAccount;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_register_request_uses_camel_case() {
        let form: RegisterRequest = serde_json::from_value(json!({
            "name": "Jana",
            "lastName": "Novak",
            "classRoom": "1A",
            "role": "student"
        }))
        .unwrap();

        assert_eq!(form.last_name.as_deref(), Some("Novak"));
        assert_eq!(form.class_room.as_deref(), Some("1A"));
        assert_eq!(form.role, Some(Role::Student));
        assert!(form.email.is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<RegisterRequest>(json!({ "role": "janitor" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_auth_response_body_shape() {
        let account = NewAccount {
            role: Role::Student,
            name: "Jana".to_string(),
            last_name: Some("Novak".to_string()),
            email: "jana@example.com".to_string(),
            username: Some("jnovak".to_string()),
            class_room: None,
            password_hash: "$2b$04$secret".to_string(),
        }
        .into_account(Uuid::new_v4(), Utc::now());
        let outcome = AuthOutcome {
            account,
            session_id: Uuid::new_v4(),
            tokens: TokenPair {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
        };

        let body = auth_response_body("newStudent", &outcome, 900);

        assert_eq!(body["newStudent"]["email"], "jana@example.com");
        assert!(body["newStudent"].get("passwordHash").is_none());
        assert!(!body.to_string().contains("$2b$04$secret"));
        assert_eq!(body["accessToken"], "access");
        assert_eq!(body["refreshToken"], "refresh");
        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["expiresIn"], 900);
    }

    #[test]
    fn test_refresh_request_requires_token() {
        let empty = RefreshRequest {
            refresh_token: Some("  ".to_string()),
        };
        assert!(matches!(empty.token(), Err(AppError::Validation(_))));

        let missing = RefreshRequest { refresh_token: None };
        assert!(missing.token().is_err());
    }
}
