//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
//! The cost parameters travel inside the string, so a verifier built with any
//! parameters can check a hash produced with any other.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::AuthError;

/// Hashes passwords and compares them against stored hashes.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    params: Params,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }
}

impl CredentialVerifier {
    /// Create a verifier that hashes with custom Argon2 cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Create a verifier from raw cost values.
    ///
    /// `memory_kib` is the memory cost, `iterations` the number of passes and
    /// `lanes` the degree of parallelism.
    pub fn with_cost(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| AuthError::Configuration(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Cost parameters used for new hashes.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Hash a password.
    ///
    /// Any string is accepted, including the empty one. Password policy
    /// belongs to the caller.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut rand::thread_rng());

        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("failed to hash password: {e}")))
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed hash and a wrong password produce the same error.
    pub fn verify(&self, hash: &str, password: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::debug!("stored password hash did not parse: {}", e);
            AuthError::InvalidCredentials
        })?;

        self.hasher()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}
