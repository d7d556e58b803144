//! CLI command implementations.

pub mod config;
pub mod hash;
pub mod login;
pub mod profile;
pub mod token;
pub mod user;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use keygate_auth::AuthError;

/// Arguments for the hash command.
#[derive(Args)]
pub struct HashArgs {
    /// Password to hash (prompted when omitted).
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for the user command.
#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a new user in the users file.
    Add {
        /// Login name.
        username: String,

        /// Subject ID (random when omitted).
        #[arg(long)]
        id: Option<String>,

        /// Password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List registered users.
    List,
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Login name.
    pub username: String,

    /// Password (prompted when omitted).
    #[arg(short, long)]
    pub password: Option<String>,

    /// Store lookup deadline in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the profile command.
#[derive(Args)]
pub struct ProfileArgs {
    /// Authorization value, `Bearer <token>` or the bare token.
    #[arg(short, long)]
    pub authorization: Option<String>,

    /// Pass the authorization value to the core without stripping `Bearer `.
    #[arg(long)]
    pub raw: bool,

    /// Store lookup deadline in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the token command.
#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Issue a token for a subject without a password check.
    Issue {
        /// Subject ID.
        subject: String,
    },
    /// Verify a token and show its claims.
    Inspect {
        /// Token, with or without a `Bearer ` prefix.
        token: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Create a keygate.toml with a fresh signing secret.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration.
    Validate,
}

/// Read a password from the argument or an interactive prompt.
pub(crate) fn read_password(given: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt
        .allow_empty_password(true)
        .interact()
        .map_err(|e| anyhow!("Failed to read password: {}", e))
}

/// Turn a core error into the message shown to the caller.
pub(crate) fn rejected(err: AuthError) -> anyhow::Error {
    if err.is_internal() {
        tracing::error!("{}", err);
    }
    anyhow!("{} [{}]", err.public_message(), err.code())
}
