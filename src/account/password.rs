//! Password hashing and verification.
//!
//! New digests are produced with the configured algorithm (bcrypt with cost
//! 10 unless configured otherwise). Verification reads the algorithm, salt
//! and work factor from the digest itself, so bcrypt and Argon2id digests
//! both verify no matter which algorithm is used for new writes.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Argon2, Params,
};
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use tracing::error;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest bcrypt cost factor accepted.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest bcrypt cost factor accepted.
pub const MAX_BCRYPT_COST: u32 = 31;

/// Default Argon2 memory cost in KiB (64 MB).
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 65536;

/// Default Argon2 time cost (iterations).
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 3;

/// Default Argon2 parallelism.
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 4;

const SALT_LEN: usize = 16;

const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

const BCRYPT_DIGEST_LEN: usize = 60;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Salt generation or hash computation failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The configured work factor is not usable.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Hash algorithm and work factor used for new digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// bcrypt with the given cost factor (log2 of the round count).
    Bcrypt {
        /// Cost factor, 4-31.
        cost: u32,
    },
    /// Argon2id, version 0x13.
    Argon2id {
        /// Memory cost in KiB.
        memory_kib: u32,
        /// Time cost (iterations).
        iterations: u32,
        /// Degree of parallelism.
        parallelism: u32,
    },
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Bcrypt {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

/// Hashes passwords with a fixed algorithm and work factor.
///
/// The work factor must stay the same for a deployment; changing it only
/// affects digests written afterwards.
///
/// bcrypt only reads the first 72 bytes of a password. Two passwords that
/// share those bytes verify against each other's digests. Valid passwords
/// reach that length only with multi-byte characters. Argon2id has no such
/// limit.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
    argon2_params: Option<Params>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            argon2_params: None,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher, checking that the work factor is usable.
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, PasswordError> {
        let argon2_params = match algorithm {
            HashAlgorithm::Bcrypt { cost } => {
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    return Err(PasswordError::InvalidParams(format!(
                        "bcrypt cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {cost}"
                    )));
                }
                None
            }
            HashAlgorithm::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => Some(
                Params::new(memory_kib, iterations, parallelism, None)
                    .map_err(|e| PasswordError::InvalidParams(e.to_string()))?,
            ),
        };

        Ok(Self {
            algorithm,
            argon2_params,
        })
    }

    /// Create a bcrypt hasher with the given cost.
    pub fn bcrypt(cost: u32) -> Result<Self, PasswordError> {
        Self::new(HashAlgorithm::Bcrypt { cost })
    }

    /// Create an Argon2id hasher with the given parameters.
    pub fn argon2id(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        Self::new(HashAlgorithm::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        })
    }

    /// A hasher whose every `hash` call fails.
    #[cfg(test)]
    pub(crate) fn failing() -> Self {
        Self {
            algorithm: HashAlgorithm::Bcrypt { cost: 0 },
            argon2_params: None,
        }
    }

    /// The algorithm used for new digests.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Returns the digest in its standard string form (`$2b$...` for bcrypt,
    /// PHC `$argon2id$...` for Argon2id). Fails if the OS entropy source
    /// cannot provide a salt; the caller must not fall back to storing the
    /// plaintext.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let result = generate_salt().and_then(|salt| match self.algorithm {
            HashAlgorithm::Bcrypt { cost } => hash_bcrypt(plaintext, cost, salt),
            HashAlgorithm::Argon2id { .. } => {
                let params = self.argon2_params.clone().unwrap_or_default();
                hash_argon2id(plaintext, params, &salt)
            }
        });

        if let Err(ref e) = result {
            error!(error = %e, "Password hashing failed");
        }
        result
    }

    /// Hash on tokio's blocking pool so the calling task is not stalled.
    pub async fn hash_async(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Hashing(format!("hashing task failed: {e}")))?
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Same as [`verify_password`]; the configured algorithm does not matter.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        verify_password(plaintext, digest)
    }
}

fn generate_salt() -> Result<[u8; SALT_LEN], PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| PasswordError::Hashing(format!("entropy source unavailable: {e}")))?;
    Ok(salt)
}

fn hash_bcrypt(plaintext: &str, cost: u32, salt: [u8; SALT_LEN]) -> Result<String, PasswordError> {
    bcrypt::hash_with_salt(plaintext, cost, salt)
        .map(|parts| parts.format_for_version(bcrypt::Version::TwoB))
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

fn hash_argon2id(plaintext: &str, params: Params, salt: &[u8]) -> Result<String, PasswordError> {
    let salt = SaltString::encode_b64(salt).map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

fn is_bcrypt_digest(value: &str) -> bool {
    value.len() == BCRYPT_DIGEST_LEN && BCRYPT_PREFIXES.iter().any(|p| value.starts_with(p))
}

fn is_argon2_digest(value: &str) -> bool {
    value.starts_with("$argon2")
        && PasswordHash::new(value).is_ok_and(|hash| hash.algorithm.as_str().starts_with("argon2"))
}

/// Whether a value is a digest this module can verify.
pub fn is_digest(value: &str) -> bool {
    is_bcrypt_digest(value) || is_argon2_digest(value)
}

/// Hash a password with the default hasher (bcrypt, cost 10).
///
/// # Examples
///
/// ```
/// use account_policy::hash_password;
///
/// let digest = hash_password("Abc123!").unwrap();
/// assert!(digest.starts_with("$2b$10$"));
/// ```
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    PasswordHasher::default().hash(plaintext)
}

/// Verify a password against a stored digest.
///
/// Returns `false` on mismatch and for malformed or unsupported digests.
/// Never fails.
///
/// # Examples
///
/// ```
/// use account_policy::{hash_password, verify_password};
///
/// let digest = hash_password("Abc123!").unwrap();
/// assert!(verify_password("Abc123!", &digest));
/// assert!(!verify_password("Abc123?", &digest));
/// assert!(!verify_password("Abc123!", "not a digest"));
/// ```
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    if digest.starts_with("$argon2") {
        PasswordHash::new(digest).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
    } else if is_bcrypt_digest(digest) {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    } else {
        false
    }
}
