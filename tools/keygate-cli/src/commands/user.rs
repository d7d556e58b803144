//! User management commands.

use anyhow::Result;
use keygate_auth::Credential;
use rand::Rng;

use super::{read_password, UserArgs, UserCommand};
use crate::context::Context;

/// Run the user command.
pub async fn run(args: UserArgs, ctx: &Context) -> Result<()> {
    match args.command {
        UserCommand::Add {
            username,
            id,
            password,
        } => add_user(username, id, password, ctx).await,
        UserCommand::List => list_users(ctx).await,
    }
}

async fn add_user(
    username: String,
    id: Option<String>,
    password: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let mut store = ctx.user_store()?;
    let password = read_password(password, true)?;
    let verifier = ctx.config.verifier()?;

    let hash = tokio::task::spawn_blocking(move || verifier.hash(&password)).await??;
    let subject_id = id.unwrap_or_else(generate_subject_id);

    store.add(Credential::new(subject_id.clone(), username.clone(), hash))?;
    store.save()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "subject_id": subject_id,
            "username": username,
        }));
    } else {
        ctx.output.success(&format!("Added user {}", username));
        ctx.output.kv("subject_id", &subject_id);
        ctx.output.kv("users_file", &store.path().display().to_string());
    }

    Ok(())
}

async fn list_users(ctx: &Context) -> Result<()> {
    let store = ctx.user_store()?;

    if ctx.output.is_json() {
        let users: Vec<_> = store.users().iter().map(Credential::profile).collect();
        ctx.output.json(&users);
        return Ok(());
    }

    ctx.output.header(&format!("Users ({})", store.users().len()));
    for user in store.users() {
        ctx.output.kv(&user.username, &user.subject_id);
    }

    Ok(())
}

/// Random 128-bit subject ID in hex.
fn generate_subject_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
