//! User store contract.
//!
//! The store is an external collaborator: the core only reads credentials
//! and profiles through [`UserStore`] and never writes them back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stored login credential for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque subject identifier.
    pub subject_id: String,
    /// Login name.
    pub username: String,
    /// Password hash as produced by [`crate::CredentialVerifier::hash`].
    pub password_hash: String,
}

impl Credential {
    /// Create a credential.
    pub fn new(
        subject_id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Public profile for this credential.
    pub fn profile(&self) -> Profile {
        Profile {
            subject_id: self.subject_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Profile data resolved from a subject ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Opaque subject identifier.
    pub subject_id: String,
    /// Login name.
    pub username: String,
}

/// Errors raised by a store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or failed the query.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline passed before the store answered.
    #[error("store call exceeded the request deadline")]
    DeadlineExceeded,

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Read access to users.
///
/// `Ok(None)` means "not found"; `Err` means the lookup itself failed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the credential registered under `username`.
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, StoreError>;

    /// Find the profile of `subject_id`.
    async fn find_profile_by_subject_id(
        &self,
        subject_id: &str,
    ) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
impl<S: UserStore + ?Sized> UserStore for Arc<S> {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, StoreError> {
        (**self).find_credential_by_username(username).await
    }

    async fn find_profile_by_subject_id(
        &self,
        subject_id: &str,
    ) -> Result<Option<Profile>, StoreError> {
        (**self).find_profile_by_subject_id(subject_id).await
    }
}

/// In-memory store, populated up front and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    by_username: HashMap<String, Credential>,
    by_subject: HashMap<String, String>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a credential, replacing any with the same username.
    pub fn insert(&mut self, credential: Credential) {
        if let Some(previous) = self.by_username.remove(&credential.username) {
            self.by_subject.remove(&previous.subject_id);
        }
        self.by_subject
            .insert(credential.subject_id.clone(), credential.username.clone());
        self.by_username
            .insert(credential.username.clone(), credential);
    }

    /// Builder-style [`MemoryUserStore::insert`].
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.insert(credential);
        self
    }

    /// Remove a user by subject ID.
    pub fn remove_subject(&mut self, subject_id: &str) -> Option<Credential> {
        let username = self.by_subject.remove(subject_id)?;
        self.by_username.remove(&username)
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.by_username.len()
    }

    /// Whether the store holds no users.
    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty()
    }
}

impl FromIterator<Credential> for MemoryUserStore {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        let mut store = MemoryUserStore::new();
        for credential in iter {
            store.insert(credential);
        }
        store
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.by_username.get(username).cloned())
    }

    async fn find_profile_by_subject_id(
        &self,
        subject_id: &str,
    ) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .by_subject
            .get(subject_id)
            .and_then(|username| self.by_username.get(username))
            .map(Credential::profile))
    }
}
