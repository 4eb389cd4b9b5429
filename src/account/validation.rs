//! Field validation for account records.
//!
//! Each field has an ordered table of validators. A validator is a pure
//! predicate paired with the message shown when it fails. Validation of a
//! field stops at the first failing validator, so the order of each table
//! decides which message the user sees.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::account::model::{AccountCandidate, NormalizedAccount};

/// Minimum email length.
pub const MIN_EMAIL_LENGTH: usize = 5;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 30;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 15;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 35;

/// Local part (dot-atoms or a quoted string) `@` domain (bracketed IPv4
/// literal or dotted labels ending in an alphabetic TLD of 2+ letters).
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("valid email pattern")
});

/// Account field subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Email address.
    Email,
    /// Login username.
    Username,
    /// Plaintext password.
    Password,
}

impl Field {
    /// Fields in the order they are validated.
    pub const ALL: [Field; 3] = [Field::Email, Field::Username, Field::Password];

    /// Field name as used in storage documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Username => "username",
            Field::Password => "password",
        }
    }

    /// The ordered validators for this field.
    pub fn validators(&self) -> &'static [Validator] {
        match self {
            Field::Email => EMAIL_VALIDATORS,
            Field::Username => USERNAME_VALIDATORS,
            Field::Password => PASSWORD_VALIDATORS,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate and the message reported when it fails.
#[derive(Clone, Copy)]
pub struct Validator {
    /// Returns `true` when the value is acceptable.
    pub check: fn(Option<&str>) -> bool,
    /// Message reported when `check` returns `false`.
    pub message: &'static str,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A field was rejected by one of its validators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldError {
    /// The rejected field.
    pub field: Field,
    /// Message of the first validator that failed.
    pub message: &'static str,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

static EMAIL_VALIDATORS: &[Validator] = &[
    Validator {
        check: email_length,
        message: "Email must be atleast 5 characters but not more than 30",
    },
    Validator {
        check: email_format,
        message: "Must be a valid e-mail",
    },
];

static USERNAME_VALIDATORS: &[Validator] = &[
    Validator {
        check: username_length,
        message: "Username must be at least 3 characters but no more than 15",
    },
    Validator {
        check: username_format,
        message: "Username must not have any special characters",
    },
];

static PASSWORD_VALIDATORS: &[Validator] = &[
    Validator {
        check: password_length,
        message: "Password must be at least 5 characters but no more than 35",
    },
    Validator {
        check: password_format,
        message: "Must have at least one uppercase, lowercase, special character, and number",
    },
];

/// Absent and empty values are both treated as missing.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Lengths are counted in UTF-16 code units, so a character outside the
/// Basic Multilingual Plane counts as two.
fn length_within(value: Option<&str>, min: usize, max: usize) -> bool {
    present(value).is_some_and(|v| (min..=max).contains(&v.encode_utf16().count()))
}

fn email_length(value: Option<&str>) -> bool {
    length_within(value, MIN_EMAIL_LENGTH, MAX_EMAIL_LENGTH)
}

fn email_format(value: Option<&str>) -> bool {
    present(value).is_some_and(|v| EMAIL_PATTERN.is_match(v))
}

fn username_length(value: Option<&str>) -> bool {
    length_within(value, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)
}

fn username_format(value: Option<&str>) -> bool {
    present(value).is_some_and(|v| v.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn password_length(value: Option<&str>) -> bool {
    length_within(value, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Anything outside `[A-Za-z0-9_]` counts as a special character.
fn is_special(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '_')
}

fn password_format(value: Option<&str>) -> bool {
    let Some(password) = present(value) else {
        return false;
    };

    if !length_within(Some(password), MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
        || password.chars().any(is_line_terminator)
    {
        return false;
    }

    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special)
}

/// Run the validators of `field` against `value`, stopping at the first failure.
pub fn validate_field(field: Field, value: Option<&str>) -> Result<(), FieldError> {
    match field.validators().iter().find(|v| !(v.check)(value)) {
        Some(failed) => Err(FieldError::new(field, failed.message)),
        None => Ok(()),
    }
}

/// Validate an email address.
///
/// # Examples
///
/// ```
/// use account_policy::account::validation::validate_email;
///
/// assert!(validate_email(Some("user@example.com")).is_ok());
/// assert!(validate_email(Some("a@b")).is_err()); // too short
/// assert!(validate_email(None).is_err());
/// ```
pub fn validate_email(email: Option<&str>) -> Result<(), FieldError> {
    validate_field(Field::Email, email)
}

/// Validate a username.
///
/// Requirements:
/// - Length: 3-15 characters
/// - Characters: ASCII letters and digits only
///
/// # Examples
///
/// ```
/// use account_policy::account::validation::validate_username;
///
/// assert!(validate_username(Some("user1")).is_ok());
/// assert!(validate_username(Some("user_1")).is_err());
/// ```
pub fn validate_username(username: Option<&str>) -> Result<(), FieldError> {
    validate_field(Field::Username, username)
}

/// Validate a plaintext password.
///
/// Requirements:
/// - Length: 5-35 characters
/// - At least one lowercase letter, uppercase letter, digit and special character
///
/// # Examples
///
/// ```
/// use account_policy::account::validation::validate_password;
///
/// assert!(validate_password(Some("Abc123!")).is_ok());
/// assert!(validate_password(Some("abc123!")).is_err()); // no uppercase
/// ```
pub fn validate_password(password: Option<&str>) -> Result<(), FieldError> {
    validate_field(Field::Password, password)
}

/// Validate all fields of a candidate account.
///
/// Email and username are lowercased first and the lowercased values are
/// validated, since lowercasing can change a value's length. Fields are
/// checked in the order email, username, password and the first failure is
/// returned. The password is passed through untouched for hashing.
pub fn validate_account_fields(
    candidate: &AccountCandidate,
) -> Result<NormalizedAccount, FieldError> {
    let email = candidate.email.as_deref().map(str::to_lowercase);
    let username = candidate.username.as_deref().map(str::to_lowercase);

    validate_email(email.as_deref())?;
    validate_username(username.as_deref())?;
    validate_password(candidate.password.as_deref())?;

    Ok(NormalizedAccount {
        email: email.unwrap_or_default(),
        username: username.unwrap_or_default(),
        password: candidate.password.clone().unwrap_or_default(),
    })
}
