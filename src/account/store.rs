//! Storage seam for account records.
//!
//! The policy never talks to a database directly. A document store (or any
//! other backend) implements [`AccountStore`] and is responsible for
//! enforcing uniqueness of `email` and `username`. [`MemoryStore`] is a
//! reference implementation kept in process memory.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::account::model::{Account, AccountChanges, NewAccount};

/// Errors reported by a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another account already uses this email.
    #[error("email already registered")]
    DuplicateEmail,

    /// Another account already uses this username.
    #[error("username already taken")]
    DuplicateUsername,

    /// No account with the given ID.
    #[error("account not found")]
    NotFound,

    /// Backend-specific failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::DuplicateEmail | StoreError::DuplicateUsername)
    }
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Backend("account map lock poisoned".to_string())
    }
}

/// Operations the policy needs from the storage layer.
///
/// Emails and usernames passed in are already lowercased.
pub trait AccountStore: Send + Sync {
    /// Persist a new account, assigning its ID.
    fn create(&self, new_account: NewAccount) -> Result<Account, StoreError>;

    /// Get an account by ID.
    fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Get an account by email.
    fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Get an account by username.
    fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Apply changes to an account and return the stored result.
    fn update(&self, id: Uuid, changes: &AccountChanges) -> Result<Account, StoreError>;
}

/// In-memory account store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or_default()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_unique(
    accounts: &HashMap<Uuid, Account>,
    id: Option<Uuid>,
    email: Option<&str>,
    username: Option<&str>,
) -> Result<(), StoreError> {
    let others = accounts.values().filter(|a| Some(a.id) != id);
    for other in others {
        if email.is_some_and(|e| other.email == e) {
            return Err(StoreError::DuplicateEmail);
        }
        if username.is_some_and(|u| other.username == u) {
            return Err(StoreError::DuplicateUsername);
        }
    }
    Ok(())
}

impl AccountStore for MemoryStore {
    fn create(&self, new_account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write()?;
        check_unique(
            &accounts,
            None,
            Some(new_account.email()),
            Some(new_account.username()),
        )?;

        let account = new_account.into_account(Uuid::new_v4(), Utc::now());
        debug!(account_id = %account.id, "Account stored");
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read()?.get(&id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read()?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read()?;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    fn update(&self, id: Uuid, changes: &AccountChanges) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write()?;
        check_unique(&accounts, Some(id), changes.email(), changes.username())?;

        let account = accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply_to(account, Utc::now());
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, username: &str) -> NewAccount {
        NewAccount::new(email.to_string(), username.to_string(), "$2b$04$digest".to_string())
    }

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let account = store.create(new_account("a@example.com", "alice")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id(account.id).unwrap(), Some(account.clone()));
        assert_eq!(store.get_by_email("a@example.com").unwrap(), Some(account.clone()));
        assert_eq!(store.get_by_username("alice").unwrap(), Some(account));
        assert_eq!(store.get_by_username("bob").unwrap(), None);
    }

    #[test]
    fn test_create_duplicate_email() {
        let store = MemoryStore::new();
        store.create(new_account("a@example.com", "alice")).unwrap();

        let result = store.create(new_account("a@example.com", "bob"));
        assert_eq!(result, Err(StoreError::DuplicateEmail));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_duplicate_username() {
        let store = MemoryStore::new();
        store.create(new_account("a@example.com", "alice")).unwrap();

        let result = store.create(new_account("b@example.com", "alice"));
        assert_eq!(result, Err(StoreError::DuplicateUsername));
    }

    #[test]
    fn test_update() {
        let store = MemoryStore::new();
        let account = store.create(new_account("a@example.com", "alice")).unwrap();

        let changes = AccountChanges::new(None, Some("alicia".to_string()), None);
        let updated = store.update(account.id, &changes).unwrap();

        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.password, account.password);
        assert!(store.get_by_username("alice").unwrap().is_none());
    }

    #[test]
    fn test_update_own_values_is_not_a_conflict() {
        let store = MemoryStore::new();
        let account = store.create(new_account("a@example.com", "alice")).unwrap();

        let changes = AccountChanges::new(
            Some("a@example.com".to_string()),
            Some("alice".to_string()),
            None,
        );
        assert!(store.update(account.id, &changes).is_ok());
    }

    #[test]
    fn test_update_conflict() {
        let store = MemoryStore::new();
        store.create(new_account("a@example.com", "alice")).unwrap();
        let bob = store.create(new_account("b@example.com", "bob")).unwrap();

        let changes = AccountChanges::new(Some("a@example.com".to_string()), None, None);
        assert_eq!(store.update(bob.id, &changes), Err(StoreError::DuplicateEmail));
    }

    #[test]
    fn test_update_not_found() {
        let store = MemoryStore::new();
        let result = store.update(Uuid::new_v4(), &AccountChanges::default());
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[test]
    fn test_store_error_conflict() {
        assert!(StoreError::DuplicateEmail.is_conflict());
        assert!(StoreError::DuplicateUsername.is_conflict());
        assert!(!StoreError::NotFound.is_conflict());
        assert!(!StoreError::Backend("x".to_string()).is_conflict());
    }
}
