//! Account lifecycle: registration, updates and login.
//!
//! Every write goes through the same steps:
//! 1. Lowercase email and username
//! 2. Validate the fields being written (email, username, password order)
//! 3. Hash the password, only if it is new or changed
//! 4. Hand the record to the store
//!
//! A rejection at any step leaves the store untouched.

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::account::model::{Account, AccountCandidate, AccountChanges, AccountUpdate, NewAccount};
use crate::account::password::PasswordHasher;
use crate::account::store::AccountStore;
use crate::account::validation::{validate_account_fields, validate_field, Field, FieldError};
use crate::{PolicyError, Result};

/// Plaintext hashed when the service is built, giving unknown-identifier
/// logins a digest with the configured work factor to check against.
const DUMMY_PASSWORD: &str = "Dummy-Passw0rd!";

/// Applies the credential policy in front of an [`AccountStore`].
#[derive(Debug)]
pub struct AccountService<S> {
    store: S,
    hasher: PasswordHasher,
    dummy_digest: OnceCell<String>,
}

impl<S: AccountStore> AccountService<S> {
    /// Create a service over `store` that hashes with `hasher`.
    ///
    /// Hashes the dummy login password up front so the first failed login
    /// costs the same as any other.
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        let dummy_digest = OnceCell::new();
        match hasher.hash(DUMMY_PASSWORD) {
            Ok(digest) => {
                let _ = dummy_digest.set(digest);
            }
            Err(e) => warn!(error = %e, "Dummy login digest deferred to first use"),
        }

        Self {
            store,
            hasher,
            dummy_digest,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The hasher used for new digests.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Validate, normalize and hash a candidate without storing it.
    ///
    /// For callers that persist through their own storage layer.
    pub fn prepare_new(&self, candidate: &AccountCandidate) -> Result<NewAccount> {
        let normalized = validate_account_fields(candidate).inspect_err(log_rejection)?;
        let digest = self.hasher.hash(&normalized.password)?;

        Ok(NewAccount::new(normalized.email, normalized.username, digest))
    }

    /// Register a new account.
    ///
    /// # Examples
    ///
    /// ```
    /// use account_policy::{AccountCandidate, AccountService, MemoryStore, PasswordHasher};
    ///
    /// let service = AccountService::new(MemoryStore::new(), PasswordHasher::default());
    ///
    /// let candidate = AccountCandidate::new("Valid@Example.com", "ValidUser", "Abc123!");
    /// let account = service.register(&candidate).unwrap();
    /// assert_eq!(account.username, "validuser");
    /// assert_ne!(account.password, "Abc123!");
    /// ```
    pub fn register(&self, candidate: &AccountCandidate) -> Result<Account> {
        let new_account = self.prepare_new(candidate)?;
        let account = self.store.create(new_account)?;

        info!(
            account_id = %account.id,
            username = %account.username,
            "Account registered"
        );

        Ok(account)
    }

    /// Validate, normalize and hash an update against the current record.
    ///
    /// Only supplied fields are validated, email and username after
    /// lowercasing. The password is hashed only when it is supplied and
    /// differs from the stored digest.
    pub fn prepare_changes(
        &self,
        current: &Account,
        update: &AccountUpdate,
    ) -> Result<AccountChanges> {
        let email = update.email.as_deref().map(str::to_lowercase);
        let username = update.username.as_deref().map(str::to_lowercase);
        let password = update
            .password
            .as_deref()
            .filter(|p| *p != current.password);

        let fields = [
            (Field::Email, email.as_deref()),
            (Field::Username, username.as_deref()),
            (Field::Password, password),
        ];
        for (field, value) in fields {
            if value.is_some() {
                validate_field(field, value).inspect_err(log_rejection)?;
            }
        }

        let password_digest = password.map(|p| self.hasher.hash(p)).transpose()?;

        Ok(AccountChanges::new(email, username, password_digest))
    }

    /// Update an existing account.
    ///
    /// Returns the stored record. An update that changes nothing does not
    /// reach the store.
    pub fn update(&self, id: Uuid, update: &AccountUpdate) -> Result<Account> {
        let current = self.store.get_by_id(id)?.ok_or(PolicyError::NotFound)?;
        let changes = self.prepare_changes(&current, update)?;

        if changes.is_empty() {
            debug!(account_id = %id, "Update left account unchanged");
            return Ok(current);
        }

        let account = self.store.update(id, &changes)?;

        info!(
            account_id = %account.id,
            username = %account.username,
            password_changed = changes.password_digest().is_some(),
            "Account updated"
        );

        Ok(account)
    }

    /// Change a password after checking the current one.
    pub fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let account = self.store.get_by_id(id)?.ok_or(PolicyError::NotFound)?;

        if !self.hasher.verify(current_password, &account.password) {
            warn!(account_id = %id, "Password change rejected: wrong current password");
            return Err(PolicyError::InvalidCredentials);
        }

        let update = AccountUpdate::new().password(new_password);
        let changes = self.prepare_changes(&account, &update)?;
        self.store.update(id, &changes)?;

        info!(
            account_id = %id,
            username = %account.username,
            "Password changed"
        );

        Ok(())
    }

    /// Authenticate by username or email.
    ///
    /// An identifier containing `@` is looked up as an email, anything else
    /// as a username. Unknown identifiers and wrong passwords fail the same
    /// way, with [`PolicyError::InvalidCredentials`].
    pub fn authenticate(&self, identifier: &str, password: &str) -> Result<Account> {
        let identifier = identifier.to_lowercase();
        let found = if identifier.contains('@') {
            self.store.get_by_email(&identifier)?
        } else {
            self.store.get_by_username(&identifier)?
        };

        let Some(account) = found else {
            self.verify_against_dummy(password);
            warn!(identifier = %identifier, "Authentication failed");
            return Err(PolicyError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password) {
            warn!(identifier = %identifier, "Authentication failed");
            return Err(PolicyError::InvalidCredentials);
        }

        info!(
            account_id = %account.id,
            username = %account.username,
            "Account authenticated"
        );

        Ok(account)
    }

    /// Spend the same verification work as a real login.
    fn verify_against_dummy(&self, password: &str) {
        if let Ok(digest) = self
            .dummy_digest
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
        {
            self.hasher.verify(password, digest);
        }
    }
}

fn log_rejection(e: &FieldError) {
    debug!(field = %e.field, reason = e.message, "Field rejected");
}
