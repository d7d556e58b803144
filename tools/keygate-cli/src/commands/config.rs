//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use keygate_auth::SigningSecret;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, generate_secret};
use crate::context::Context;
use crate::output::format_duration;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let mut redacted = ctx.config.clone();
    if redacted.token.signing_secret.is_some() {
        redacted.token.signing_secret = Some("<redacted>".to_string());
    }

    if ctx.output.is_json() {
        ctx.output.json(&redacted);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    if let Some(ref path) = ctx.config_path {
        ctx.output.kv("file", &path.display().to_string());
    }

    ctx.output.info("[token]");
    ctx.output.kv(
        "signing_secret",
        redacted.token.signing_secret.as_deref().unwrap_or("(not set)"),
    );
    ctx.output.kv(
        "validity_secs",
        &format!(
            "{} ({})",
            ctx.config.token.validity_secs,
            format_duration(ctx.config.token.validity_secs)
        ),
    );

    ctx.output.info("[password]");
    ctx.output.kv("memory_kib", &ctx.config.password.memory_kib.to_string());
    ctx.output.kv("iterations", &ctx.config.password.iterations.to_string());
    ctx.output.kv("lanes", &ctx.config.password.lanes.to_string());

    ctx.output.info("[store]");
    ctx.output.kv("users_file", &ctx.config.store.users_file);

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("keygate.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config(&generate_secret()))?;

    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    match ctx.config.auth_config() {
        Ok(auth) => {
            if auth.secret.len() < SigningSecret::RECOMMENDED_LENGTH {
                warnings.push(format!(
                    "signing secret is {} bytes, at least {} recommended",
                    auth.secret.len(),
                    SigningSecret::RECOMMENDED_LENGTH
                ));
            }
        }
        Err(e) => errors.push(format!("{:#}", e)),
    }

    if let Err(e) = ctx.config.verifier() {
        errors.push(format!("{:#}", e));
    } else if ctx.config.password.memory_kib < 19 * 1024 || ctx.config.password.iterations < 2 {
        warnings.push("password cost is below the Argon2id recommendation".to_string());
    }

    match ctx.user_store() {
        Ok(store) if store.users().is_empty() => warnings.push(format!(
            "users file {} has no users",
            store.path().display()
        )),
        Ok(_) => {}
        Err(e) => errors.push(format!("{:#}", e)),
    }

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
