/// Authentication module
///
/// Password hashing, JWT issuing/validation, and refresh-token whitelist
/// checks.

mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{AccessClaims, RefreshClaims};
pub use jwt::{TokenIssuer, TokenPair};
pub use password::{
    min_password_length, validate_password, PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST,
};
pub use refresh_token::{check_whitelisted, hash_token};
