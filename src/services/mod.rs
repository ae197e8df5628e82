pub mod accounts;
pub mod bookings;

pub use accounts::{AccountService, AuthOutcome, LoginPolicy, Registration};
pub use bookings::{BookingRequest, BookingService};
