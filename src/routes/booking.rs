/// Booking Routes
///
/// Book-borrowing records. Borrowers must be existing students or teachers.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::domain::Role;
use crate::error::AppError;
use crate::services::{BookingRequest, BookingService};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub book_title: Option<String>,
    pub borrower_email: Option<String>,
    pub borrower_role: Option<Role>,
    pub due_at: Option<DateTime<Utc>>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(form: CreateBookingRequest) -> Self {
        BookingRequest {
            book_title: form.book_title,
            borrower_email: form.borrower_email,
            borrower_role: form.borrower_role,
            due_at: form.due_at,
        }
    }
}

/// POST /booking
///
/// # Errors
/// - 400: Missing title/email/role, admin borrower, or a due date in the past
/// - 404: No account of that role with the borrower email
pub async fn create_booking(
    form: web::Json<CreateBookingRequest>,
    bookings: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let booking = bookings.create(form.into_inner().into()).await?;

    Ok(HttpResponse::Created().json(json!({ "booking": booking })))
}

/// GET /bookings
pub async fn list_bookings(
    bookings: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let bookings = bookings.list_all().await?;

    Ok(HttpResponse::Ok().json(json!({ "bookings": bookings })))
}

async fn borrowed_by(
    role: Role,
    email: &str,
    bookings: &BookingService,
) -> Result<HttpResponse, AppError> {
    let bookings = bookings.list_for_borrower(role, email).await?;

    Ok(HttpResponse::Ok().json(json!({ "bookings": bookings })))
}

/// GET /student/borrowed/{email}
pub async fn student_borrowed(
    path: web::Path<String>,
    bookings: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    borrowed_by(Role::Student, &path, &bookings).await
}

/// GET /teacher/borrowed/{email}
pub async fn teacher_borrowed(
    path: web::Path<String>,
    bookings: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    borrowed_by(Role::Teacher, &path, &bookings).await
}
