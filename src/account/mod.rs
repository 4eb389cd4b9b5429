//! Account credential policy.
//!
//! This module provides field validation, password hashing and the
//! orchestration that applies them before account records reach storage.

pub mod model;
pub mod password;
pub mod service;
pub mod store;
pub mod validation;

pub use model::{
    Account, AccountCandidate, AccountChanges, AccountUpdate, NewAccount, NormalizedAccount,
};
pub use password::{
    hash_password, is_digest, verify_password, HashAlgorithm, PasswordError, PasswordHasher,
    DEFAULT_BCRYPT_COST,
};
pub use service::AccountService;
pub use store::{AccountStore, MemoryStore, StoreError};
pub use validation::{
    validate_account_fields, validate_email, validate_field, validate_password,
    validate_username, Field, FieldError, Validator,
};
