//! Authentication errors.

use thiserror::Error;

/// Authentication error type.
///
/// Credential failures are deliberately coarse: a caller can never tell an
/// unknown username from a wrong password or a corrupt stored hash.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Token failed to parse or its signature did not verify.
    #[error("invalid token")]
    TokenInvalid,

    /// Token signature is valid but its validity window has passed.
    #[error("token expired")]
    TokenExpired,

    /// Token payload does not decode into the expected claim set.
    #[error("invalid token claims")]
    ClaimsMalformed,

    /// The request carried no metadata at all.
    #[error("missing metadata")]
    MissingCredentialsSource,

    /// Metadata was present but held no authorization value.
    #[error("authorization token not provided")]
    NoTokenSupplied,

    /// The token was valid but its subject no longer exists in the store.
    #[error("user profile not found: {0}")]
    ProfileNotFound(String),

    /// Startup configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::TokenInvalid
                | AuthError::TokenExpired
                | AuthError::ClaimsMalformed
                | AuthError::MissingCredentialsSource
                | AuthError::NoTokenSupplied
        )
    }

    /// Check if this error was caused by the server rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Internal(_) | AuthError::Configuration(_) | AuthError::ProfileNotFound(_)
        )
    }

    /// Stable error code for responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::ClaimsMalformed => "CLAIMS_MALFORMED",
            Self::MissingCredentialsSource => "MISSING_METADATA",
            Self::NoTokenSupplied => "NO_TOKEN",
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to hand back to the caller.
    ///
    /// Internal detail (store errors, signing failures) stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Configuration(_) => "internal error".to_string(),
            Self::ProfileNotFound(_) => "user profile not found".to_string(),
            other => other.to_string(),
        }
    }
}
