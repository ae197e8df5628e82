use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// The three kinds of account the library knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Capitalized form used in response keys (`newStudent`)
    pub fn title(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(ValidationError::InvalidFormat("role".to_string())),
        }
    }
}

/// A stored account. `password_hash` is always a bcrypt digest.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
    pub class_room: Option<String>,
    pub password_hash: String,
    pub is_deactivated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// Validated input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub role: Role,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub username: Option<String>,
    pub class_room: Option<String>,
    pub password_hash: String,
}

impl NewAccount {
    pub fn into_account(self, id: Uuid, now: DateTime<Utc>) -> Account {
        Account {
            id,
            role: self.role,
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            username: self.username,
            class_room: self.class_room,
            password_hash: self.password_hash,
            is_deactivated: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub class_room: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.class_room.is_none()
    }

    pub fn apply(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(last_name) = &self.last_name {
            account.last_name = Some(last_name.clone());
        }
        if let Some(username) = &self.username {
            account.username = Some(username.clone());
        }
        if let Some(class_room) = &self.class_room {
            account.class_room = Some(class_room.clone());
        }
    }
}

/// Public representation of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_room: Option<String>,
    pub is_deactivated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            name: account.name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            username: account.username.clone(),
            class_room: account.class_room.clone(),
            is_deactivated: account.is_deactivated,
            created_at: account.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        NewAccount {
            role: Role::Student,
            name: "Jana".to_string(),
            last_name: Some("Novak".to_string()),
            email: "jana@example.com".to_string(),
            username: Some("jnovak".to_string()),
            class_room: Some("1A".to_string()),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
        }
        .into_account(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(" Teacher ".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("librarian".parse::<Role>().is_err());
    }

    #[test]
    fn test_new_account_starts_active() {
        let account = sample_account();
        assert!(!account.is_deactivated);
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn test_view_hides_password_hash() {
        let account = sample_account();
        let json = serde_json::to_value(account.view()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "jana@example.com");
        assert_eq!(json["lastName"], "Novak");
        assert_eq!(json["classRoom"], "1A");
        assert_eq!(json["role"], "student");
        assert_eq!(json["isDeactivated"], false);
    }

    #[test]
    fn test_profile_update_applies_only_given_fields() {
        let mut account = sample_account();
        let update = ProfileUpdate {
            class_room: Some("2B".to_string()),
            ..Default::default()
        };
        update.apply(&mut account);

        assert_eq!(account.class_room.as_deref(), Some("2B"));
        assert_eq!(account.name, "Jana");
        assert_eq!(account.username.as_deref(), Some("jnovak"));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }
}
