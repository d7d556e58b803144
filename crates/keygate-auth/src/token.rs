//! Signed identity tokens.
//!
//! Tokens are compact HS256 JWTs over a fixed claim set. The server keeps no
//! record of issued tokens: a token is valid iff its signature verifies
//! against the configured secret and the current time is before `exp`.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, AuthError};

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the token was issued to.
    #[serde(rename = "user_id")]
    pub subject_id: String,
    /// Unix timestamp when the token was issued.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Unix timestamp from which the token is no longer valid.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// Check if the claims are expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Seconds left until expiration at `now`.
    pub fn time_to_expiry(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}

/// A freshly signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Serialized token.
    pub token: String,
    /// Claims that were signed.
    pub claims: Claims,
}

/// Issues and verifies tokens with one secret and one validity window.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity: Duration,
}

impl TokenManager {
    /// Create a manager from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret.as_bytes();

        // Expiry is checked by `verify_at` so the clock can be supplied.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            validity: config.token_validity,
        }
    }

    /// Validity window applied to new tokens.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Generate a token for `subject_id`, valid from now.
    pub fn generate(&self, subject_id: &str) -> Result<String, AuthError> {
        self.issue_at(subject_id, current_timestamp())
            .map(|issued| issued.token)
    }

    /// Generate a token as if issued at `now`.
    pub fn generate_at(&self, subject_id: &str, now: i64) -> Result<String, AuthError> {
        self.issue_at(subject_id, now).map(|issued| issued.token)
    }

    /// Sign a new claim set issued at `now`.
    ///
    /// An empty `subject_id` is refused: it could never be verified.
    pub fn issue_at(&self, subject_id: &str, now: i64) -> Result<IssuedToken, AuthError> {
        if subject_id.is_empty() {
            return Err(AuthError::Internal(
                "refusing to sign a token without a subject".to_string(),
            ));
        }

        let validity = i64::try_from(self.validity.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            subject_id: subject_id.to_string(),
            issued_at: now,
            expires_at: now.saturating_add(validity),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, current_timestamp())
    }

    /// Verify a token as of `now`.
    ///
    /// Structure and signature are checked before the payload is trusted.
    /// A bad signature is `TokenInvalid` even when the token is also stale.
    /// A signed payload that is not a JSON object is rejected by the decoder
    /// itself and is also `TokenInvalid`; `ClaimsMalformed` covers objects
    /// whose `user_id` is missing, not a string or empty.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                AuthError::TokenInvalid
            })?;

        let claims: Claims = serde_json::from_value(data.claims).map_err(|e| {
            tracing::debug!("token claims rejected: {}", e);
            AuthError::ClaimsMalformed
        })?;

        if claims.subject_id.is_empty() {
            tracing::debug!("token claims rejected: empty user_id");
            return Err(AuthError::ClaimsMalformed);
        }

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

/// Get current Unix timestamp.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SigningSecret;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const DAY: i64 = 24 * 60 * 60;

    fn manager(secret: &str) -> TokenManager {
        TokenManager::new(&AuthConfig::new(SigningSecret::new(secret).unwrap()))
    }

    fn sign_raw(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_verify() {
        let tokens = manager(SECRET);
        let token = tokens.generate("user_123").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.subject_id, "user_123");
        assert_eq!(claims.expires_at - claims.issued_at, DAY);
    }

    #[test]
    fn test_token_shape() {
        let token = manager(SECRET).generate("user_1").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_window_boundaries() {
        let tokens = manager(SECRET);
        let issued_at = 1_700_000_000;
        let token = tokens.generate_at("user_1", issued_at).unwrap();

        assert!(tokens.verify_at(&token, issued_at).is_ok());
        assert!(tokens.verify_at(&token, issued_at + DAY - 1).is_ok());
        assert!(matches!(
            tokens.verify_at(&token, issued_at + DAY),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            tokens.verify_at(&token, issued_at + 30 * DAY),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_expired_with_wall_clock() {
        let config = AuthConfig::new(SigningSecret::new(SECRET).unwrap())
            .with_token_validity(Duration::ZERO);
        let tokens = TokenManager::new(&config);

        let token = tokens.generate("user_1").unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_different_secret_rejected() {
        let token = manager(SECRET).generate("user_1").unwrap();
        let other = manager("another-secret-another-secret-xx");

        assert!(matches!(other.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = manager(SECRET);
        let token = tokens.generate("alice").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let now = current_timestamp();
        let forged = serde_json::json!({ "user_id": "mallory", "iat": now, "exp": now + DAY });
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(matches!(tokens.verify(&tampered), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_bad_signature_beats_expiry() {
        let tokens = manager(SECRET);
        let issued_at = 1_600_000_000;
        let token = tokens.generate_at("alice", issued_at).unwrap();
        let truncated = &token[..token.len() - 2];

        assert!(matches!(
            tokens.verify_at(truncated, issued_at + 2 * DAY),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = manager(SECRET);
        for token in ["", "abc", "a.b.c", "Bearer x.y.z", "...."] {
            assert!(
                matches!(tokens.verify(token), Err(AuthError::TokenInvalid)),
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let tokens = manager(SECRET);
        let now = current_timestamp();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({ "user_id": "alice", "iat": now, "exp": now + DAY }))
                .unwrap(),
        );
        let token = format!("{header}.{payload}.");

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_missing_subject_is_malformed() {
        let tokens = manager(SECRET);
        let now = current_timestamp();
        let token = sign_raw(serde_json::json!({ "iat": now, "exp": now + DAY }));

        assert!(matches!(tokens.verify(&token), Err(AuthError::ClaimsMalformed)));
    }

    #[test]
    fn test_non_string_subject_is_malformed() {
        let tokens = manager(SECRET);
        let now = current_timestamp();

        for subject in [serde_json::json!(42), serde_json::json!(null), serde_json::json!(["a"])] {
            let token = sign_raw(serde_json::json!({ "user_id": subject, "iat": now, "exp": now + DAY }));
            assert!(matches!(tokens.verify(&token), Err(AuthError::ClaimsMalformed)));
        }
    }

    #[test]
    fn test_empty_subject_is_malformed() {
        let tokens = manager(SECRET);
        let now = current_timestamp();
        let token = sign_raw(serde_json::json!({ "user_id": "", "iat": now, "exp": now + DAY }));

        assert!(matches!(tokens.verify(&token), Err(AuthError::ClaimsMalformed)));
    }

    #[test]
    fn test_empty_subject_not_issued() {
        let tokens = manager(SECRET);
        assert!(matches!(tokens.generate(""), Err(AuthError::Internal(_))));
        assert!(matches!(
            tokens.issue_at("", 1_700_000_000),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn test_non_object_payload_is_invalid() {
        let tokens = manager(SECRET);

        for payload in [serde_json::json!([]), serde_json::json!("alice"), serde_json::json!(7)] {
            let token = sign_raw(payload.clone());
            assert!(
                matches!(tokens.verify(&token), Err(AuthError::TokenInvalid)),
                "{payload}"
            );
        }
    }

    #[test]
    fn test_claims_expiry_helpers() {
        let claims = Claims {
            subject_id: "user_1".to_string(),
            issued_at: 100,
            expires_at: 200,
        };
        assert!(!claims.is_expired_at(199));
        assert!(claims.is_expired_at(200));
        assert_eq!(claims.time_to_expiry(150), 50);
        assert_eq!(claims.time_to_expiry(500), 0);
    }
}
