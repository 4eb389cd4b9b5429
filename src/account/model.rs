//! Account record types.
//!
//! Storage owns the lifecycle of an [`Account`]; the types here describe the
//! shapes that flow between callers, the policy and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored account.
///
/// `password` always holds a digest, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID.
    pub id: Uuid,
    /// Email address (unique, lowercase).
    pub email: String,
    /// Login username (unique, lowercase).
    pub username: String,
    /// Password digest.
    pub password: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Raw input for creating an account.
///
/// `None` and `Some("")` are both treated as a missing field.
#[derive(Debug, Clone, Default)]
pub struct AccountCandidate {
    /// Email address.
    pub email: Option<String>,
    /// Desired username.
    pub username: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

impl AccountCandidate {
    /// Create a candidate with all three fields present.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// Candidate fields that passed validation.
///
/// Email and username are lowercased; the password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAccount {
    /// Lowercased email address.
    pub email: String,
    /// Lowercased username.
    pub username: String,
    /// Plaintext password, to be hashed before storage.
    pub password: String,
}

/// A validated account ready to be created by a store.
///
/// Only the policy can build one, so the password is always a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    email: String,
    username: String,
    password_digest: String,
}

impl NewAccount {
    pub(crate) fn new(email: String, username: String, password_digest: String) -> Self {
        Self {
            email,
            username,
            password_digest,
        }
    }

    /// Lowercased email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Lowercased username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password digest.
    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    /// Build the stored record with the given ID and creation time.
    pub fn into_account(self, id: Uuid, now: DateTime<Utc>) -> Account {
        Account {
            id,
            email: self.email,
            username: self.username,
            password: self.password_digest,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Requested modifications to an existing account.
///
/// A `None` field is left untouched. A password equal to the digest already
/// stored is treated as untouched too, so a whole record can be re-saved
/// without re-hashing.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New email address.
    pub email: Option<String>,
    /// New username.
    pub username: Option<String>,
    /// New plaintext password.
    pub password: Option<String>,
}

impl AccountUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set new password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.password.is_none()
    }
}

/// Validated, normalized and hashed modifications handed to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    email: Option<String>,
    username: Option<String>,
    password_digest: Option<String>,
}

impl AccountChanges {
    pub(crate) fn new(
        email: Option<String>,
        username: Option<String>,
        password_digest: Option<String>,
    ) -> Self {
        Self {
            email,
            username,
            password_digest,
        }
    }

    /// New lowercased email, if changed.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// New lowercased username, if changed.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// New password digest, if the password changed.
    pub fn password_digest(&self) -> Option<&str> {
        self.password_digest.as_deref()
    }

    /// Check if nothing changes.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.password_digest.is_none()
    }

    /// Apply the changes to a stored record.
    pub fn apply_to(&self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(ref email) = self.email {
            account.email = email.clone();
        }
        if let Some(ref username) = self.username {
            account.username = username.clone();
        }
        if let Some(ref digest) = self.password_digest {
            account.password = digest.clone();
        }
        if !self.is_empty() {
            account.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        NewAccount::new(
            "user@example.com".to_string(),
            "user".to_string(),
            "$2b$04$digest".to_string(),
        )
        .into_account(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_candidate_new() {
        let candidate = AccountCandidate::new("a@b.com", "user", "Abc123!");
        assert_eq!(candidate.email.as_deref(), Some("a@b.com"));
        assert_eq!(candidate.username.as_deref(), Some("user"));
        assert_eq!(candidate.password.as_deref(), Some("Abc123!"));
    }

    #[test]
    fn test_new_account_into_account() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let account = NewAccount::new(
            "user@example.com".to_string(),
            "user".to_string(),
            "$2b$04$digest".to_string(),
        )
        .into_account(id, now);

        assert_eq!(account.id, id);
        assert_eq!(account.email, "user@example.com");
        assert_eq!(account.username, "user");
        assert_eq!(account.password, "$2b$04$digest");
        assert_eq!(account.created_at, now);
        assert_eq!(account.updated_at, now);
    }

    #[test]
    fn test_account_update_builder() {
        let update = AccountUpdate::new().email("new@example.com").username("newname");

        assert!(update.email.is_some());
        assert!(update.username.is_some());
        assert!(update.password.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_account_update_empty() {
        assert!(AccountUpdate::new().is_empty());
    }

    #[test]
    fn test_changes_apply_to() {
        let mut account = sample_account();
        let before = account.updated_at;
        let later = before + chrono::Duration::seconds(5);

        AccountChanges::new(Some("new@example.com".to_string()), None, None)
            .apply_to(&mut account, later);

        assert_eq!(account.email, "new@example.com");
        assert_eq!(account.username, "user");
        assert_eq!(account.password, "$2b$04$digest");
        assert_eq!(account.updated_at, later);
    }

    #[test]
    fn test_empty_changes_keep_timestamp() {
        let mut account = sample_account();
        let before = account.clone();

        AccountChanges::default().apply_to(&mut account, Utc::now() + chrono::Duration::seconds(5));

        assert_eq!(account, before);
    }

    #[test]
    fn test_account_document_shape() {
        let account = sample_account();
        let doc = serde_json::to_value(&account).unwrap();

        assert_eq!(doc["email"], "user@example.com");
        assert_eq!(doc["username"], "user");
        assert_eq!(doc["password"], "$2b$04$digest");
        assert!(doc.get("id").is_some());
    }
}
