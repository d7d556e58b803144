//! CLI configuration.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use keygate_auth::{
    parse_validity_secs, AuthConfig, CredentialVerifier, SigningSecret, DEFAULT_TOKEN_VALIDITY,
    SECRET_ENV, VALIDITY_ENV,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Config file names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = ["keygate.toml", ".keygate.toml", "keygate.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Token signing configuration.
    #[serde(default)]
    pub token: TokenConfig,

    /// Password hashing configuration.
    #[serde(default)]
    pub password: PasswordConfig,

    /// User store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Build the auth core configuration.
    ///
    /// Environment variables win over the file. With no secret anywhere this
    /// fails: there is no built-in default key.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        self.auth_config_with(|key| std::env::var(key).ok())
    }

    /// [`CliConfig::auth_config`] with an explicit environment lookup.
    pub fn auth_config_with<F>(&self, env: F) -> Result<AuthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = env(SECRET_ENV)
            .or_else(|| self.token.signing_secret.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No signing secret configured. Set {} or token.signing_secret.",
                    SECRET_ENV
                )
            })?;
        let secret = SigningSecret::parse(&secret)?;

        let validity_secs = match env(VALIDITY_ENV) {
            Some(raw) => parse_validity_secs(&raw)?,
            None => self.token.validity_secs,
        };
        if validity_secs == 0 {
            return Err(anyhow!("token.validity_secs must be positive"));
        }

        Ok(AuthConfig::new(secret).with_token_validity(Duration::from_secs(validity_secs)))
    }

    /// Build the password verifier from the configured cost.
    pub fn verifier(&self) -> Result<CredentialVerifier> {
        CredentialVerifier::with_cost(
            self.password.memory_kib,
            self.password.iterations,
            self.password.lanes,
        )
        .context("Invalid [password] cost settings")
    }
}

/// Token signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Signing secret, raw text or `base64:<data>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    /// Token validity in seconds.
    #[serde(default = "default_validity_secs")]
    pub validity_secs: u64,
}

fn default_validity_secs() -> u64 {
    DEFAULT_TOKEN_VALIDITY.as_secs()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            validity_secs: default_validity_secs(),
        }
    }
}

/// Argon2 cost settings for new password hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_lanes")]
    pub lanes: u32,
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_lanes() -> u32 {
    1
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            lanes: default_lanes(),
        }
    }
}

/// User store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the users file, relative to the working directory.
    #[serde(default = "default_users_file")]
    pub users_file: String,
}

fn default_users_file() -> String {
    "users.toml".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            users_file: default_users_file(),
        }
    }
}

/// Generate a fresh random signing secret in `base64:` form.
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    format!("base64:{}", STANDARD.encode(bytes))
}

/// Generate a default keygate.toml config file.
pub fn generate_default_config(secret: &str) -> String {
    format!(
        r#"# Keygate configuration

[token]
# Raw text or base64:<data>. KEYGATE_SIGNING_SECRET overrides this value.
signing_secret = "{secret}"
# KEYGATE_TOKEN_VALIDITY_SECS overrides this value.
validity_secs = 86400

[password]
memory_kib = 19456
iterations = 2
lanes = 1

[store]
users_file = "users.toml"
"#,
        secret = secret
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let secret = generate_secret();
        let config: CliConfig = toml::from_str(&generate_default_config(&secret)).unwrap();

        assert_eq!(config.token.signing_secret.as_deref(), Some(secret.as_str()));
        assert_eq!(config.token.validity_secs, 86_400);
        assert_eq!(config.store.users_file, "users.toml");

        let auth = config.auth_config_with(no_env).unwrap();
        assert_eq!(auth.secret.len(), 32);
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let config = CliConfig::default();
        let err = config.auth_config_with(no_env).unwrap_err();
        assert!(err.to_string().contains(SECRET_ENV));
    }

    #[test]
    fn test_env_overrides_file() {
        let config: CliConfig = toml::from_str(
            r#"
            [token]
            signing_secret = "from-file"
            validity_secs = 60
            "#,
        )
        .unwrap();

        let auth = config
            .auth_config_with(|key| match key {
                SECRET_ENV => Some("from-env".to_string()),
                VALIDITY_ENV => Some("120".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(auth.secret.as_bytes(), b"from-env");
        assert_eq!(auth.token_validity, Duration::from_secs(120));

        let auth = config.auth_config_with(no_env).unwrap();
        assert_eq!(auth.secret.as_bytes(), b"from-file");
        assert_eq!(auth.token_validity, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_validity_rejected() {
        let config: CliConfig = toml::from_str(
            r#"
            [token]
            signing_secret = "k"
            validity_secs = 0
            "#,
        )
        .unwrap();
        assert!(config.auth_config_with(no_env).is_err());
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keygate.json");
        let path = path.to_str().unwrap();

        let mut config = CliConfig::default();
        config.token.signing_secret = Some("json-secret".to_string());
        config.save(path).unwrap();

        let loaded = CliConfig::load(path).unwrap();
        assert_eq!(loaded.token.signing_secret.as_deref(), Some("json-secret"));
        assert_eq!(loaded.password.iterations, 2);
    }
}
