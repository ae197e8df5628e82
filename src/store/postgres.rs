//! Postgres store implementations.
//!
//! Uniqueness is enforced by the schema in `migrations/`; a violated
//! constraint surfaces as `DatabaseError::UniqueConstraintViolation` through
//! `From<sqlx::Error> for AppError`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{BookingStore, CredentialStore, RefreshWhitelist};
use crate::auth::hash_token;
use crate::domain::{Account, Booking, NewAccount, NewBooking, ProfileUpdate, Role, Session};
use crate::error::{AppError, DatabaseError};

const ACCOUNT_COLUMNS: &str = "id, role, name, last_name, email, username, class_room, \
     password_hash, is_deactivated, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    role: String,
    name: String,
    last_name: Option<String>,
    email: String,
    username: Option<String>,
    class_room: Option<String>,
    password_hash: String,
    is_deactivated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|_| {
            AppError::Database(DatabaseError::UnexpectedError(format!(
                "unknown role '{}' stored for account {}",
                row.role, row.id
            )))
        })?;

        Ok(Account {
            id: row.id,
            role,
            name: row.name,
            last_name: row.last_name,
            email: row.email,
            username: row.username,
            class_room: row.class_room,
            password_hash: row.password_hash,
            is_deactivated: row.is_deactivated,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_account(row: Option<AccountRow>) -> Result<Option<Account>, AppError> {
    row.map(Account::try_from).transpose()
}

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE lower(email) = lower($1)",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn find_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE role = $1 AND username = $2",
            ACCOUNT_COLUMNS
        ))
        .bind(role.as_str())
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts
                (id, role, name, last_name, email, username, class_room,
                 password_hash, is_deactivated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, $9, $9)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(account.role.as_str())
        .bind(&account.name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.class_room)
        .bind(&account.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Account::try_from(row)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                last_name = COALESCE($3, last_name),
                username = COALESCE($4, username),
                class_room = COALESCE($5, class_room),
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.last_name)
        .bind(&update.username)
        .bind(&update.class_room)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)?.ok_or_else(|| AppError::not_found("account"))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("account"));
        }
        Ok(())
    }

    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET is_deactivated = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(deactivated)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)?.ok_or_else(|| AppError::not_found("account"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgRefreshWhitelist {
    pool: PgPool,
}

impl PgRefreshWhitelist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshWhitelist for PgRefreshWhitelist {
    async fn add(
        &self,
        session_id: Uuid,
        refresh_token: &str,
        account_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (session_id, account_id, token_hash, issued_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session_id)
        .bind(account_id)
        .bind(hash_token(refresh_token))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_session_id(&self, session_id: Uuid) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            r#"
            SELECT session_id, account_id, token_hash, issued_at
            FROM refresh_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(session_id, account_id, refresh_token_hash, issued_at)| Session {
            session_id,
            account_id,
            refresh_token_hash,
            issued_at,
        }))
    }

    async fn replace(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET token_hash = $3, issued_at = $4
            WHERE session_id = $1 AND token_hash = $2
            "#,
        )
        .bind(session_id)
        .bind(expected_hash)
        .bind(hash_token(refresh_token))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all_for_account(&self, account_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(account_id = %account_id, "All refresh sessions revoked for account");
        Ok(result.rows_affected())
    }
}

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type BookingRow = (Uuid, String, String, String, DateTime<Utc>, Option<DateTime<Utc>>);

fn into_booking(row: BookingRow) -> Result<Booking, AppError> {
    let (id, book_title, borrower_email, role, borrowed_at, due_at) = row;
    let borrower_role = role.parse::<Role>().map_err(|_| {
        AppError::Database(DatabaseError::UnexpectedError(format!(
            "unknown role '{}' stored for booking {}",
            role, id
        )))
    })?;

    Ok(Booking {
        id,
        book_title,
        borrower_email,
        borrower_role,
        borrowed_at,
        due_at,
    })
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError> {
        let booking = booking.into_booking(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO bookings (id, book_title, borrower_email, borrower_role, borrowed_at, due_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.book_title)
        .bind(&booking.borrower_email)
        .bind(booking.borrower_role.as_str())
        .bind(booking.borrowed_at)
        .bind(booking.due_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, book_title, borrower_email, borrower_role, borrowed_at, due_at
            FROM bookings
            ORDER BY borrowed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_booking).collect()
    }

    async fn list_for_borrower(&self, role: Role, email: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, book_title, borrower_email, borrower_role, borrowed_at, due_at
            FROM bookings
            WHERE borrower_role = $1 AND lower(borrower_email) = lower($2)
            ORDER BY borrowed_at
            "#,
        )
        .bind(role.as_str())
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_booking).collect()
    }
}
