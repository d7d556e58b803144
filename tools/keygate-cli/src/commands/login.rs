//! Login command.

use std::time::Duration;

use anyhow::Result;
use keygate_auth::RequestContext;

use super::{read_password, rejected, LoginArgs};
use crate::context::Context;

/// Run the login command.
pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let auth = ctx.coordinator()?;
    let password = read_password(args.password, false)?;

    let mut request = RequestContext::new();
    if let Some(ms) = args.timeout_ms {
        request = request.with_timeout(Duration::from_millis(ms));
    }
    ctx.output
        .debug(&format!("Request ID: {}", request.request_id));

    let token = auth
        .login(&request, &args.username, &password)
        .await
        .map_err(rejected)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "access_token": token }));
    } else {
        ctx.output.plain(&token);
    }

    Ok(())
}
