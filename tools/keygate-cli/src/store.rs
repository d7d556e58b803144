//! TOML-file backed user store.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use keygate_auth::{Credential, MemoryUserStore, Profile, StoreError, UserStore};
use serde::{Deserialize, Serialize};

/// On-disk layout of the users file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersFile {
    /// Registered users.
    #[serde(default)]
    pub users: Vec<Credential>,
}

/// User store read from a TOML file at startup.
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    records: Vec<Credential>,
    index: MemoryUserStore,
}

impl FileUserStore {
    /// Load the users file. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read users file: {}", path.display()))?;
            toml::from_str::<UsersFile>(&content)
                .with_context(|| format!("Failed to parse users file: {}", path.display()))?
        } else {
            UsersFile::default()
        };

        let index = file.users.iter().cloned().collect();
        Ok(Self {
            path,
            records: file.users,
            index,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All users, in file order.
    pub fn users(&self) -> &[Credential] {
        &self.records
    }

    /// Register a new user. Usernames and subject IDs must be unique.
    pub fn add(&mut self, credential: Credential) -> Result<()> {
        if credential.username.is_empty() {
            bail!("Username must not be empty");
        }
        if credential.subject_id.is_empty() {
            bail!("Subject ID must not be empty");
        }
        if self.records.iter().any(|u| u.username == credential.username) {
            bail!("User already exists: {}", credential.username);
        }
        if self.records.iter().any(|u| u.subject_id == credential.subject_id) {
            bail!("Subject ID already in use: {}", credential.subject_id);
        }

        self.index.insert(credential.clone());
        self.records.push(credential);
        Ok(())
    }

    /// Write the users back to disk.
    pub fn save(&self) -> Result<()> {
        let file = UsersFile {
            users: self.records.clone(),
        };
        let content = toml::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write users file: {}", self.path.display()))
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, StoreError> {
        self.index.find_credential_by_username(username).await
    }

    async fn find_profile_by_subject_id(
        &self,
        subject_id: &str,
    ) -> Result<Option<Profile>, StoreError> {
        self.index.find_profile_by_subject_id(subject_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_save_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");

        let mut store = FileUserStore::load(&path).unwrap();
        assert!(store.users().is_empty());

        store.add(Credential::new("u-1", "alice", "$argon2id$x")).unwrap();
        store.add(Credential::new("u-2", "bob", "$argon2id$y")).unwrap();
        store.save().unwrap();

        let reloaded = FileUserStore::load(&path).unwrap();
        assert_eq!(reloaded.users().len(), 2);

        let credential = reloaded
            .find_credential_by_username("bob")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.subject_id, "u-2");

        let profile = reloaded.find_profile_by_subject_id("u-1").await.unwrap().unwrap();
        assert_eq!(profile.username, "alice");
    }

    #[test]
    fn test_duplicates_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileUserStore::load(dir.path().join("users.toml")).unwrap();

        store.add(Credential::new("u-1", "alice", "h")).unwrap();
        assert!(store.add(Credential::new("u-2", "alice", "h")).is_err());
        assert!(store.add(Credential::new("u-1", "carol", "h")).is_err());
        assert!(store.add(Credential::new("u-3", "", "h")).is_err());
        assert_eq!(store.users().len(), 1);
    }

    #[test]
    fn test_parse_error_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.toml");
        std::fs::write(&path, "[[users]]\nusername = 3\n").unwrap();

        let err = FileUserStore::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse users file"));
    }
}
