//! Password hashing command.

use anyhow::Result;

use super::{read_password, HashArgs};
use crate::context::Context;

/// Run the hash command.
pub async fn run(args: HashArgs, ctx: &Context) -> Result<()> {
    let password = read_password(args.password, true)?;
    let verifier = ctx.config.verifier()?;

    let hash = tokio::task::spawn_blocking(move || verifier.hash(&password)).await??;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "hash": hash }));
    } else {
        ctx.output.plain(&hash);
    }

    Ok(())
}
