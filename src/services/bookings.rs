use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{Booking, NewBooking, Role};
use crate::error::{AppError, ValidationError};
use crate::store::{BookingStore, CredentialStore};
use crate::validators::{is_valid_book_title, is_valid_email};

/// Unvalidated booking input
#[derive(Debug, Clone, Default)]
pub struct BookingRequest {
    pub book_title: Option<String>,
    pub borrower_email: Option<String>,
    pub borrower_role: Option<Role>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct BookingService {
    accounts: Arc<dyn CredentialStore>,
    bookings: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(accounts: Arc<dyn CredentialStore>, bookings: Arc<dyn BookingStore>) -> Self {
        Self { accounts, bookings }
    }

    /// Record a book lent to an existing student or teacher
    pub async fn create(&self, request: BookingRequest) -> Result<Booking, AppError> {
        let book_title = is_valid_book_title(request.book_title.as_deref().unwrap_or_default())?;
        let borrower_email =
            is_valid_email(request.borrower_email.as_deref().unwrap_or_default())?;
        let borrower_role = match request.borrower_role {
            Some(role @ (Role::Student | Role::Teacher)) => role,
            Some(Role::Admin) => {
                return Err(ValidationError::InvalidFormat("borrowerRole".to_string()).into())
            }
            None => return Err(ValidationError::EmptyField("borrowerRole".to_string()).into()),
        };

        if let Some(due_at) = request.due_at {
            if due_at <= Utc::now() {
                return Err(ValidationError::InvalidFormat("dueAt".to_string()).into());
            }
        }

        let borrower = self
            .accounts
            .find_by_email(&borrower_email)
            .await?
            .filter(|a| a.role == borrower_role)
            .ok_or_else(|| AppError::not_found(format!("{} '{}'", borrower_role, borrower_email)))?;

        let booking = self
            .bookings
            .create(NewBooking {
                book_title,
                borrower_email: borrower.email,
                borrower_role,
                due_at: request.due_at,
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            borrower_id = %borrower.id,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_all().await
    }

    pub async fn list_for_borrower(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Vec<Booking>, AppError> {
        let email = is_valid_email(email)?;
        self.bookings.list_for_borrower(role, &email).await
    }
}
