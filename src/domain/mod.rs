/// Domain records shared by the stores, the services and the routes.

mod account;
mod booking;
mod session;

pub use account::{Account, AccountView, NewAccount, ProfileUpdate, Role};
pub use booking::{Booking, NewBooking};
pub use session::Session;
