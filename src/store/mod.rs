//! Persistence abstraction.
//!
//! The services only talk to these traits. `postgres` is the production
//! backend; `memory` keeps everything in process and is used by the test
//! suite and the `memory` backend setting.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Account, Booking, NewAccount, NewBooking, ProfileUpdate, Role, Session};
use crate::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryBookingStore, InMemoryCredentialStore, InMemoryRefreshWhitelist};
pub use postgres::{PgBookingStore, PgCredentialStore, PgRefreshWhitelist};

/// Account records for all three roles.
///
/// Implementations enforce email uniqueness across roles and username
/// uniqueness within a role, reporting violations as
/// `DatabaseError::UniqueConstraintViolation`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Lookup by email regardless of role
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<Account>, AppError>;

    async fn create(&self, account: NewAccount) -> Result<Account, AppError>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Account, AppError>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> Result<Account, AppError>;

    /// Returns `false` when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Positive list of live sessions. A missing entry means revoked.
#[async_trait]
pub trait RefreshWhitelist: Send + Sync {
    async fn add(
        &self,
        session_id: Uuid,
        refresh_token: &str,
        account_id: Uuid,
    ) -> Result<(), AppError>;

    async fn find_by_session_id(&self, session_id: Uuid) -> Result<Option<Session>, AppError>;

    /// Swap in a rotated refresh token, but only while the session still
    /// holds `expected_hash`. Returns `false` if the session is gone or was
    /// rotated by someone else first.
    async fn replace(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        refresh_token: &str,
    ) -> Result<bool, AppError>;

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError>;

    /// Returns the number of sessions removed
    async fn revoke_all_for_account(&self, account_id: Uuid) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError>;

    async fn list_all(&self) -> Result<Vec<Booking>, AppError>;

    async fn list_for_borrower(&self, role: Role, email: &str) -> Result<Vec<Booking>, AppError>;
}

/// The set of stores the application runs against
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn RefreshWhitelist>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            accounts: Arc::new(PgCredentialStore::new(pool.clone())),
            sessions: Arc::new(PgRefreshWhitelist::new(pool.clone())),
            bookings: Arc::new(PgBookingStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryCredentialStore::default()),
            sessions: Arc::new(InMemoryRefreshWhitelist::default()),
            bookings: Arc::new(InMemoryBookingStore::default()),
        }
    }
}
