use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// A book lent to a student or teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub book_title: String,
    pub borrower_email: String,
    pub borrower_role: Role,
    pub borrowed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub book_title: String,
    pub borrower_email: String,
    pub borrower_role: Role,
    pub due_at: Option<DateTime<Utc>>,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            book_title: self.book_title,
            borrower_email: self.borrower_email,
            borrower_role: self.borrower_role,
            borrowed_at: now,
            due_at: self.due_at,
        }
    }
}
