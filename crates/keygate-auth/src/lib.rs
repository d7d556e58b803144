//! Authentication core for Keygate.
//!
//! Verifies user credentials, issues signed time-bound tokens, validates
//! them on later requests and resolves a token back to a user profile.
//!
//! # Example
//!
//! ```rust,ignore
//! use keygate_auth::prelude::*;
//!
//! let config = AuthConfig::from_env()?;
//! let auth = AuthCoordinator::from_config(store, &config);
//!
//! let token = auth.login(&RequestContext::new(), "alice", "correct-pw").await?;
//!
//! let ctx = RequestContext::new().with_metadata(Metadata::new().with("authorization", token));
//! let profile = auth.get_profile(&ctx).await?;
//! ```

mod config;
mod context;
mod coordinator;
mod error;
pub mod metadata;
mod password;
mod store;
mod token;

pub use config::{
    parse_validity_secs, AuthConfig, SigningSecret, DEFAULT_TOKEN_VALIDITY, SECRET_ENV,
    VALIDITY_ENV,
};
pub use context::{RequestContext, RequestId};
pub use coordinator::AuthCoordinator;
pub use error::AuthError;
pub use metadata::Metadata;
pub use password::CredentialVerifier;
pub use store::{Credential, MemoryUserStore, Profile, StoreError, UserStore};
pub use token::{current_timestamp, Claims, IssuedToken, TokenManager};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AuthConfig, AuthCoordinator, AuthError, Claims, Credential, CredentialVerifier,
        MemoryUserStore, Metadata, Profile, RequestContext, SigningSecret, TokenManager,
        UserStore,
    };
}
