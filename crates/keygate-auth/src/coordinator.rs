//! Login and profile request handling.

use crate::metadata::extract_token;
use crate::{
    AuthConfig, AuthError, Claims, CredentialVerifier, Profile, RequestContext, TokenManager,
    UserStore,
};

const DECOY_PASSWORD: &str = "keygate-decoy-password";

/// Request-handling core composing the store, the verifier and the tokens.
///
/// Holds no per-request state; share one instance behind an `Arc`.
#[derive(Debug)]
pub struct AuthCoordinator<S> {
    store: S,
    verifier: CredentialVerifier,
    tokens: TokenManager,
    // Verified against when no stored hash is available, with the same cost.
    decoy_hash: String,
}

impl<S: UserStore> AuthCoordinator<S> {
    /// Create a coordinator from its parts.
    ///
    /// Computes one password hash to prepare the decoy used for unknown users.
    pub fn new(store: S, verifier: CredentialVerifier, tokens: TokenManager) -> Self {
        let decoy_hash = verifier.hash(DECOY_PASSWORD).unwrap_or_else(|e| {
            tracing::error!("failed to prepare decoy password hash: {}", e);
            String::new()
        });

        Self {
            store,
            verifier,
            tokens,
            decoy_hash,
        }
    }

    /// Create a coordinator with the default verifier cost.
    pub fn from_config(store: S, config: &AuthConfig) -> Self {
        Self::new(store, CredentialVerifier::default(), TokenManager::new(config))
    }

    /// The user store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The credential verifier.
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    /// The token manager.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Verify a username and password and issue a token.
    ///
    /// Unknown users, store failures and wrong passwords all surface as
    /// `InvalidCredentials`, and each of them costs one hash verification.
    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, username = %username))]
    pub async fn login(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let credential = match ctx
            .bounded(self.store.find_credential_by_username(username))
            .await
        {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                tracing::warn!("login failed: unknown user");
                return self.reject_with_decoy(password).await;
            }
            Err(e) => {
                tracing::warn!("login failed: credential lookup error: {}", e);
                return self.reject_with_decoy(password).await;
            }
        };

        if let Err(e) = self.check_password(credential.password_hash, password).await {
            tracing::warn!("login failed: {}", e);
            return Err(e);
        }

        let token = self.tokens.generate(&credential.subject_id).map_err(|e| {
            tracing::error!(subject_id = %credential.subject_id, "failed to generate token: {}", e);
            e
        })?;

        tracing::info!(subject_id = %credential.subject_id, "login succeeded");
        Ok(token)
    }

    /// Authenticate the request's token and return its claims.
    pub fn authenticate(&self, ctx: &RequestContext) -> Result<Claims, AuthError> {
        let token = extract_token(ctx.metadata.as_ref())?;
        self.tokens.verify(token)
    }

    /// Resolve the profile of the user the request's token was issued to.
    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn get_profile(&self, ctx: &RequestContext) -> Result<Profile, AuthError> {
        let claims = self.authenticate(ctx).map_err(|e| {
            tracing::debug!("profile request rejected: {}", e);
            e
        })?;

        match ctx
            .bounded(self.store.find_profile_by_subject_id(&claims.subject_id))
            .await
        {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                tracing::error!(subject_id = %claims.subject_id, "token subject has no profile");
                Err(AuthError::ProfileNotFound(claims.subject_id))
            }
            Err(e) => {
                tracing::error!(subject_id = %claims.subject_id, "profile lookup failed: {}", e);
                Err(AuthError::Internal(format!(
                    "failed to retrieve user profile: {e}"
                )))
            }
        }
    }

    async fn reject_with_decoy(&self, password: &str) -> Result<String, AuthError> {
        let _ = self.check_password(self.decoy_hash.clone(), password).await;
        Err(AuthError::InvalidCredentials)
    }

    // Argon2 is deliberately slow, keep it off the async workers.
    async fn check_password(&self, hash: String, password: &str) -> Result<(), AuthError> {
        let verifier = self.verifier.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || verifier.verify(&hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("password check did not complete: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credential, MemoryUserStore, Metadata, SigningSecret};

    fn coordinator() -> AuthCoordinator<MemoryUserStore> {
        let verifier = CredentialVerifier::with_cost(1024, 1, 1).unwrap();
        let hash = verifier.hash("correct-pw").unwrap();
        let store = MemoryUserStore::new().with_credential(Credential::new("u-1", "alice", hash));
        let config = AuthConfig::new(SigningSecret::new("unit-test-secret-unit-test-secret").unwrap());
        AuthCoordinator::new(store, verifier, TokenManager::new(&config))
    }

    #[tokio::test]
    async fn test_login_then_authenticate() {
        let auth = coordinator();
        let token = auth
            .login(&RequestContext::new(), "alice", "correct-pw")
            .await
            .unwrap();

        let ctx = RequestContext::new().with_metadata(Metadata::new().with("authorization", token));
        let claims = auth.authenticate(&ctx).unwrap();
        assert_eq!(claims.subject_id, "u-1");
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_invalid_credentials() {
        let mut auth = coordinator();
        auth.store = MemoryUserStore::new().with_credential(Credential::new("u-2", "bob", "not-a-hash"));

        let err = auth
            .login(&RequestContext::new(), "bob", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_decoy_hash_uses_verifier_cost() {
        let auth = coordinator();
        let decoy = argon2::PasswordHash::new(&auth.decoy_hash).unwrap();

        assert_eq!(decoy.algorithm.as_str(), "argon2id");
        let params = argon2::Params::try_from(&decoy).unwrap();
        assert_eq!(params.m_cost(), 1024);
        assert_eq!(params.t_cost(), 1);
        assert_eq!(params.p_cost(), 1);
        assert!(auth.verifier.verify(&auth.decoy_hash, DECOY_PASSWORD).is_ok());
    }

    #[tokio::test]
    async fn test_decoy_password_never_logs_in() {
        let auth = coordinator();
        let err = auth
            .login(&RequestContext::new(), "ghost", DECOY_PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_without_metadata() {
        let auth = coordinator();
        assert!(matches!(
            auth.authenticate(&RequestContext::new()),
            Err(AuthError::MissingCredentialsSource)
        ));
    }
}
