//! Account credential policy.
//!
//! Validation rules for account email, username and password, and the
//! password lifecycle around them: hash on write, verify on login.
//! Storage is an external collaborator reached through [`AccountStore`].

pub mod account;
pub mod config;
pub mod error;
pub mod logging;

pub use account::{
    hash_password, is_digest, validate_account_fields, validate_email, validate_password,
    validate_username, verify_password, Account, AccountCandidate, AccountChanges, AccountService,
    AccountStore, AccountUpdate, Field, FieldError, HashAlgorithm, MemoryStore, NewAccount,
    NormalizedAccount, PasswordError, PasswordHasher, StoreError,
};
pub use config::Config;
pub use error::{PolicyError, Result};
