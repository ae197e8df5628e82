/// Application Error Handling
///
/// Every handler returns `Result<HttpResponse, AppError>`, so each request
/// ends in exactly one response: either the handler's own or the one built
/// by the `ResponseError` impl below.
///
/// Layout:
/// 1. Domain-specific error types
/// 2. The unified `AppError`
/// 3. HTTP response mapping
/// 4. Error context for structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    Malformed(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::Malformed(msg) => write!(f, "malformed request: {}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Persistence errors, shared by the Postgres and in-memory stores
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Password did not match the stored digest
    InvalidCredentials,
    /// No account of the requested role has this email
    UnknownAccount,
    TokenExpired,
    TokenInvalid,
    MissingToken,
    /// Refresh token refers to a session that is not whitelisted
    SessionRevoked,
    /// Refresh token is validly signed but is not the one on record
    TokenMismatch,
    AccountInactive,
    Forbidden,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::UnknownAccount => write!(f, "Unknown account"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::SessionRevoked => write!(f, "Session has been revoked"),
            AuthError::TokenMismatch => write!(f, "Refresh token does not match session"),
            AuthError::AccountInactive => write!(f, "Account is inactive"),
            AuthError::Forbidden => write!(f, "Insufficient permissions"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::Database(DatabaseError::NotFound(what.into()))
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        AppError::Database(DatabaseError::UniqueConstraintViolation(what.into()))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::Database(DatabaseError::UniqueConstraintViolation(_))
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Database(DatabaseError::NotFound(_)))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// SQLSTATE 23505
const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    "record already exists".to_string(),
                ))
            }
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error body returned to clients
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    pub message: String,
    /// Stable code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts errors to HTTP responses with logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
            ),

            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => {
                    (StatusCode::CONFLICT, "DUPLICATE_ENTRY", e.to_string())
                }
                DatabaseError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
                DatabaseError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service temporarily unavailable".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                ),
            },

            // Unknown email and wrong password share a message so that
            // login cannot be used to enumerate accounts.
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::UnknownAccount => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "Invalid login credentials".to_string(),
                ),
                AuthError::TokenExpired | AuthError::TokenInvalid => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Invalid or expired token".to_string(),
                ),
                AuthError::MissingToken => (
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN",
                    "Missing authentication token".to_string(),
                ),
                AuthError::SessionRevoked => (
                    StatusCode::UNAUTHORIZED,
                    "SESSION_REVOKED",
                    e.to_string(),
                ),
                AuthError::TokenMismatch => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_MISMATCH",
                    e.to_string(),
                ),
                AuthError::AccountInactive => (
                    StatusCode::FORBIDDEN,
                    "ACCOUNT_INACTIVE",
                    e.to_string(),
                ),
                AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
            },

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(request_id = request_id, error = %self, "Resource not found");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::TokenMismatch) => {
                tracing::warn!(
                    request_id = request_id,
                    "Refresh token mismatch, possible token replay"
                );
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::AccountInactive | AuthError::Forbidden => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn test_app_error_conversion() {
        let val_err = ValidationError::InvalidFormat("test".to_string());
        let app_err: AppError = val_err.into();
        match app_err {
            AppError::Validation(_) => (),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_status_mapping_is_consistent() {
        let cases = vec![
            (AppError::conflict("email"), StatusCode::CONFLICT),
            (AppError::not_found("account"), StatusCode::NOT_FOUND),
            (AppError::Auth(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::UnknownAccount), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::SessionRevoked), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::TokenMismatch), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (AppError::Auth(AuthError::AccountInactive), StatusCode::FORBIDDEN),
            (
                AppError::Validation(ValidationError::EmptyField("name".into())),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(ResponseError::status_code(&error), expected, "{:?}", error);
            let (status, body) = ErrorHandler::error_response(&error, "req-1");
            assert_eq!(status, expected);
            assert_eq!(body.status, expected.as_u16());
        }
    }

    #[test]
    fn test_unknown_account_and_bad_password_look_identical() {
        let (_, unknown) =
            ErrorHandler::error_response(&AppError::Auth(AuthError::UnknownAccount), "a");
        let (_, mismatch) =
            ErrorHandler::error_response(&AppError::Auth(AuthError::InvalidCredentials), "b");
        assert_eq!(unknown.code, mismatch.code);
        assert_eq!(unknown.message, mismatch.message);
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let error = AppError::Database(DatabaseError::UnexpectedError(
            "relation \"accounts\" does not exist".to_string(),
        ));
        let (_, body) = ErrorHandler::error_response(&error, "req");
        assert_eq!(body.message, "Database error occurred");
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("test_operation");
        assert_eq!(ctx.operation, "test_operation");
        assert!(uuid::Uuid::parse_str(&ctx.request_id).is_ok());
    }
}
