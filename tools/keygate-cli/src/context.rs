//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use keygate_auth::{AuthCoordinator, TokenManager};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;
use crate::store::FileUserStore;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Path the configuration was loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd)? {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        if let Some(ref path) = config_path {
            output.debug(&format!("Using config: {}", path.display()));
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    ///
    /// The nearest file wins; if it cannot be loaded the search stops with
    /// its error.
    fn find_config(start: &Path) -> Result<Option<(CliConfig, PathBuf)>> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    let path = config_path.to_str().with_context(|| {
                        format!("Config path is not valid UTF-8: {}", config_path.display())
                    })?;
                    let config = CliConfig::load(path)?;
                    return Ok(Some((config, config_path)));
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve a path relative to the config file, or the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            return candidate;
        }
        match self.config_path.as_ref().and_then(|p| p.parent()) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(candidate),
            _ => self.cwd.join(candidate),
        }
    }

    /// Load the configured users file.
    pub fn user_store(&self) -> Result<FileUserStore> {
        let path = self.resolve_path(&self.config.store.users_file);
        self.output
            .debug(&format!("Using users file: {}", path.display()));
        FileUserStore::load(path)
    }

    /// Build a token manager from the configured secret.
    pub fn token_manager(&self) -> Result<TokenManager> {
        let auth = self.config.auth_config()?;
        Ok(TokenManager::new(&auth))
    }

    /// Wire up a coordinator over the users file.
    pub fn coordinator(&self) -> Result<AuthCoordinator<FileUserStore>> {
        let auth = self.config.auth_config()?;
        Ok(AuthCoordinator::new(
            self.user_store()?,
            self.config.verifier()?,
            TokenManager::new(&auth),
        ))
    }
}
