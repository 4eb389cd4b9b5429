//! Configuration for the account policy.

use serde::Deserialize;
use std::path::Path;

use crate::account::password::{
    HashAlgorithm, PasswordHasher, DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB,
    DEFAULT_ARGON2_PARALLELISM, DEFAULT_BCRYPT_COST,
};
use crate::{PolicyError, Result};

/// Algorithm used for new password digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// bcrypt.
    #[default]
    Bcrypt,
    /// Argon2id.
    Argon2id,
}

/// Password hashing configuration.
///
/// The work factor must stay the same for the lifetime of a deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// Algorithm for new digests (bcrypt, argon2id).
    #[serde(default)]
    pub algorithm: AlgorithmKind,
    /// bcrypt cost factor.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 time cost.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 parallelism.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

fn default_argon2_memory() -> u32 {
    DEFAULT_ARGON2_MEMORY_KIB
}

fn default_argon2_iterations() -> u32 {
    DEFAULT_ARGON2_ITERATIONS
}

fn default_argon2_parallelism() -> u32 {
    DEFAULT_ARGON2_PARALLELISM
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::default(),
            bcrypt_cost: default_bcrypt_cost(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl PasswordConfig {
    /// The configured algorithm with its work factor.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        match self.algorithm {
            AlgorithmKind::Bcrypt => HashAlgorithm::Bcrypt {
                cost: self.bcrypt_cost,
            },
            AlgorithmKind::Argon2id => HashAlgorithm::Argon2id {
                memory_kib: self.argon2_memory_kib,
                iterations: self.argon2_iterations,
                parallelism: self.argon2_parallelism,
            },
        }
    }

    /// Build the configured hasher.
    pub fn hasher(&self) -> Result<PasswordHasher> {
        PasswordHasher::new(self.hash_algorithm()).map_err(|e| PolicyError::Config(e.to_string()))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/account-policy.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Password hashing configuration.
    #[serde(default)]
    pub password: PasswordConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PolicyError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PolicyError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the password work factor is out of range for the
    /// chosen algorithm.
    pub fn validate(&self) -> Result<()> {
        self.password.hasher().map(|_| ())
    }
}
