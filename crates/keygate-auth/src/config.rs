//! Configuration types for the auth core.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::AuthError;

/// Environment variable holding the token signing secret.
pub const SECRET_ENV: &str = "KEYGATE_SIGNING_SECRET";

/// Environment variable holding the token validity in seconds.
pub const VALIDITY_ENV: &str = "KEYGATE_TOKEN_VALIDITY_SECS";

/// Default token validity: 24 hours.
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// HMAC key material used to sign tokens.
///
/// Immutable once built and cheap to clone. Never printed.
#[derive(Clone)]
pub struct SigningSecret {
    key_bytes: Arc<[u8]>,
}

impl SigningSecret {
    /// Recommended minimum key length in bytes (256 bits).
    pub const RECOMMENDED_LENGTH: usize = 32;

    /// Build a secret from raw bytes. Empty input is rejected.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let key_bytes = key.as_ref();
        if key_bytes.is_empty() {
            return Err(AuthError::Configuration(
                "signing secret must not be empty".to_string(),
            ));
        }
        if key_bytes.len() < Self::RECOMMENDED_LENGTH {
            tracing::warn!(
                "signing secret is {} bytes, at least {} recommended",
                key_bytes.len(),
                Self::RECOMMENDED_LENGTH
            );
        }
        Ok(Self {
            key_bytes: Arc::from(key_bytes),
        })
    }

    /// Parse a configured secret.
    ///
    /// `base64:<data>` is decoded, anything else is used as UTF-8 bytes.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value.strip_prefix("base64:") {
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
                    AuthError::Configuration(format!("signing secret is not valid base64: {e}"))
                })?;
                Self::new(bytes)
            }
            None => Self::new(value.as_bytes()),
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.key_bytes.len()
    }

    /// Always false for a constructed secret.
    pub fn is_empty(&self) -> bool {
        self.key_bytes.is_empty()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("key_length", &self.key_bytes.len())
            .finish_non_exhaustive()
    }
}

/// Auth core configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign and verify tokens.
    pub secret: SigningSecret,
    /// How long an issued token stays valid.
    pub token_validity: Duration,
}

impl AuthConfig {
    /// Create a config with the default token validity.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            token_validity: DEFAULT_TOKEN_VALIDITY,
        }
    }

    /// Set token validity.
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    /// Load from `KEYGATE_SIGNING_SECRET` and `KEYGATE_TOKEN_VALIDITY_SECS`.
    ///
    /// There is no fallback secret; a missing one is a configuration error.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(SECRET_ENV)
            .ok_or_else(|| AuthError::Configuration(format!("{SECRET_ENV} is not set")))?;
        let mut config = Self::new(SigningSecret::parse(&secret)?);

        if let Some(raw) = lookup(VALIDITY_ENV) {
            let secs = parse_validity_secs(&raw)?;
            config = config.with_token_validity(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Parse a validity value in whole seconds. Zero is rejected.
pub fn parse_validity_secs(raw: &str) -> Result<u64, AuthError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        AuthError::Configuration(format!("token validity must be a number of seconds: {raw:?}"))
    })?;
    if secs == 0 {
        return Err(AuthError::Configuration(
            "token validity must be positive".to_string(),
        ));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_secret_fails() {
        let err = AuthConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_empty_secret_fails() {
        assert!(SigningSecret::new(b"").is_err());
        assert!(AuthConfig::from_lookup(lookup(&[(SECRET_ENV, "")])).is_err());
    }

    #[test]
    fn test_default_validity() {
        let config = AuthConfig::from_lookup(lookup(&[(SECRET_ENV, "s3cret")])).unwrap();
        assert_eq!(config.token_validity, Duration::from_secs(86_400));
        assert_eq!(config.secret.as_bytes(), b"s3cret");
    }

    #[test]
    fn test_validity_override() {
        let config =
            AuthConfig::from_lookup(lookup(&[(SECRET_ENV, "k"), (VALIDITY_ENV, "900")])).unwrap();
        assert_eq!(config.token_validity, Duration::from_secs(900));

        assert!(AuthConfig::from_lookup(lookup(&[(SECRET_ENV, "k"), (VALIDITY_ENV, "0")])).is_err());
        assert!(
            AuthConfig::from_lookup(lookup(&[(SECRET_ENV, "k"), (VALIDITY_ENV, "1d")])).is_err()
        );
    }

    #[test]
    fn test_base64_secret() {
        let secret = SigningSecret::parse("base64:AAECAw==").unwrap();
        assert_eq!(secret.as_bytes(), &[0, 1, 2, 3]);
        assert!(SigningSecret::parse("base64:not base64!").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let secret = SigningSecret::new("super-secret-value").unwrap();
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("key_length"));
    }
}
