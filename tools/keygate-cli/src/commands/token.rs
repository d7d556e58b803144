//! Token operator commands.

use anyhow::Result;
use keygate_auth::{current_timestamp, metadata::strip_bearer};

use super::{rejected, TokenArgs, TokenCommand};
use crate::context::Context;
use crate::output::{format_duration, format_timestamp};

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    match args.command {
        TokenCommand::Issue { subject } => issue(&subject, ctx).await,
        TokenCommand::Inspect { token } => inspect(&token, ctx).await,
    }
}

async fn issue(subject: &str, ctx: &Context) -> Result<()> {
    let tokens = ctx.token_manager()?;
    let issued = tokens
        .issue_at(subject, current_timestamp())
        .map_err(rejected)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "access_token": issued.token,
            "subject_id": issued.claims.subject_id,
            "expires_at": issued.claims.expires_at,
        }));
        return Ok(());
    }

    ctx.output.plain(&issued.token);
    ctx.output.debug(&format!(
        "Expires {}",
        format_timestamp(issued.claims.expires_at)
    ));
    Ok(())
}

async fn inspect(token: &str, ctx: &Context) -> Result<()> {
    let tokens = ctx.token_manager()?;
    let now = current_timestamp();
    let claims = tokens
        .verify_at(strip_bearer(token), now)
        .map_err(rejected)?;

    if ctx.output.is_json() {
        ctx.output.json(&claims);
        return Ok(());
    }

    ctx.output.success("Token is valid");
    ctx.output.kv("subject_id", &claims.subject_id);
    ctx.output.kv("issued_at", &format_timestamp(claims.issued_at));
    ctx.output.kv("expires_at", &format_timestamp(claims.expires_at));
    ctx.output.kv(
        "expires_in",
        &format_duration(claims.time_to_expiry(now) as u64),
    );
    Ok(())
}
