//! In-process store implementations backed by `tokio::sync::RwLock` maps.
//!
//! Uniqueness checks and inserts happen under one write lock, so concurrent
//! duplicate registrations resolve to exactly one winner.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingStore, CredentialStore, RefreshWhitelist};
use crate::auth::hash_token;
use crate::domain::{Account, Booking, NewAccount, NewBooking, ProfileUpdate, Role, Session};
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

fn email_taken(accounts: &HashMap<Uuid, Account>, email: &str) -> bool {
    accounts
        .values()
        .any(|a| a.email.eq_ignore_ascii_case(email))
}

fn username_taken(
    accounts: &HashMap<Uuid, Account>,
    role: Role,
    username: &str,
    except: Option<Uuid>,
) -> bool {
    accounts.values().any(|a| {
        a.role == role && a.username.as_deref() == Some(username) && Some(a.id) != except
    })
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_username(
        &self,
        role: Role,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.role == role && a.username.as_deref() == Some(username))
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;

        if email_taken(&accounts, &account.email) {
            return Err(AppError::conflict("email already registered"));
        }
        if let Some(username) = &account.username {
            if username_taken(&accounts, account.role, username, None) {
                return Err(AppError::conflict("username already taken"));
            }
        }

        let account = account.into_account(Uuid::new_v4(), Utc::now());
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;

        if let Some(username) = &update.username {
            let role = accounts
                .get(&id)
                .map(|a| a.role)
                .ok_or_else(|| AppError::not_found("account"))?;
            if username_taken(&accounts, role, username, Some(id)) {
                return Err(AppError::conflict("username already taken"));
            }
        }

        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("account"))?;
        update.apply(account);
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("account"))?;
        account.password_hash = password_hash.to_string();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn set_deactivated(&self, id: Uuid, deactivated: bool) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("account"))?;
        account.is_deactivated = deactivated;
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.accounts.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshWhitelist {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

#[async_trait]
impl RefreshWhitelist for InMemoryRefreshWhitelist {
    async fn add(
        &self,
        session_id: Uuid,
        refresh_token: &str,
        account_id: Uuid,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(AppError::conflict("session already exists"));
        }
        sessions.insert(
            session_id,
            Session {
                session_id,
                account_id,
                refresh_token_hash: hash_token(refresh_token),
                issued_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_by_session_id(&self, session_id: Uuid) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn replace(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(session) if session.refresh_token_hash == expected_hash => {
                session.refresh_token_hash = hash_token(refresh_token);
                session.issued_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }

    async fn revoke_all_for_account(&self, account_id: Uuid) -> Result<u64, AppError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.account_id != account_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<Vec<Booking>>,
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError> {
        let booking = booking.into_booking(Uuid::new_v4(), Utc::now());
        self.bookings.write().await.push(booking.clone());
        Ok(booking)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings.read().await.clone())
    }

    async fn list_for_borrower(&self, role: Role, email: &str) -> Result<Vec<Booking>, AppError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .iter()
            .filter(|b| b.borrower_role == role && b.borrower_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_account(role: Role, email: &str, username: Option<&str>) -> NewAccount {
        NewAccount {
            role,
            name: "Test".to_string(),
            last_name: None,
            email: email.to_string(),
            username: username.map(str::to_string),
            class_room: None,
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_unique_across_roles() {
        let store = InMemoryCredentialStore::default();
        store
            .create(new_account(Role::Student, "a@example.com", Some("a")))
            .await
            .unwrap();

        let err = store
            .create(new_account(Role::Teacher, "A@example.com", Some("a")))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_username_unique_within_role_only() {
        let store = InMemoryCredentialStore::default();
        store
            .create(new_account(Role::Student, "s@example.com", Some("sam")))
            .await
            .unwrap();

        assert!(store
            .create(new_account(Role::Student, "s2@example.com", Some("sam")))
            .await
            .unwrap_err()
            .is_conflict());
        assert!(store
            .create(new_account(Role::Teacher, "t@example.com", Some("sam")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_has_one_winner() {
        let store = Arc::new(InMemoryCredentialStore::default());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(new_account(Role::Student, "race@example.com", Some(&format!("u{}", i))))
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_update_missing_account_is_not_found() {
        let store = InMemoryCredentialStore::default();
        let err = store
            .set_deactivated(Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_whitelist_lifecycle() {
        let whitelist = InMemoryRefreshWhitelist::default();
        let session_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        whitelist.add(session_id, "token-1", account_id).await.unwrap();
        let entry = whitelist.find_by_session_id(session_id).await.unwrap().unwrap();
        assert_eq!(entry.account_id, account_id);
        assert_eq!(entry.refresh_token_hash, hash_token("token-1"));

        assert!(whitelist
            .replace(session_id, &hash_token("token-1"), "token-2")
            .await
            .unwrap());
        let entry = whitelist.find_by_session_id(session_id).await.unwrap().unwrap();
        assert_eq!(entry.refresh_token_hash, hash_token("token-2"));

        whitelist.revoke(session_id).await.unwrap();
        assert!(whitelist.find_by_session_id(session_id).await.unwrap().is_none());
        assert!(!whitelist
            .replace(session_id, &hash_token("token-2"), "token-3")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_replace_requires_current_hash() {
        let whitelist = InMemoryRefreshWhitelist::default();
        let session_id = Uuid::new_v4();
        whitelist.add(session_id, "token-1", Uuid::new_v4()).await.unwrap();
        let stale = hash_token("token-1");

        assert!(whitelist.replace(session_id, &stale, "token-2").await.unwrap());
        // A second rotation from the same starting point loses
        assert!(!whitelist.replace(session_id, &stale, "token-3").await.unwrap());

        let entry = whitelist.find_by_session_id(session_id).await.unwrap().unwrap();
        assert_eq!(entry.refresh_token_hash, hash_token("token-2"));
    }

    #[tokio::test]
    async fn test_revoke_all_for_account() {
        let whitelist = InMemoryRefreshWhitelist::default();
        let account_id = Uuid::new_v4();
        let other = Uuid::new_v4();

        whitelist.add(Uuid::new_v4(), "a", account_id).await.unwrap();
        whitelist.add(Uuid::new_v4(), "b", account_id).await.unwrap();
        let kept = Uuid::new_v4();
        whitelist.add(kept, "c", other).await.unwrap();

        assert_eq!(whitelist.revoke_all_for_account(account_id).await.unwrap(), 2);
        assert!(whitelist.find_by_session_id(kept).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bookings_filtered_by_role_and_email() {
        let store = InMemoryBookingStore::default();
        for (email, role) in [
            ("s@example.com", Role::Student),
            ("s@example.com", Role::Student),
            ("t@example.com", Role::Teacher),
        ] {
            store
                .create(NewBooking {
                    book_title: "Dune".to_string(),
                    borrower_email: email.to_string(),
                    borrower_role: role,
                    due_at: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.list_all().await.unwrap().len(), 3);
        assert_eq!(
            store
                .list_for_borrower(Role::Student, "s@example.com")
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(store
            .list_for_borrower(Role::Teacher, "s@example.com")
            .await
            .unwrap()
            .is_empty());
    }
}
