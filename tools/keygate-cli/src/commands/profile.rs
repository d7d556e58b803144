//! Profile lookup command.
//!
//! The CLI plays the transport here: it turns `--authorization` into request
//! metadata the way an RPC server would, stripping any `Bearer ` scheme first.

use std::time::Duration;

use anyhow::Result;
use keygate_auth::metadata::{strip_bearer, AUTHORIZATION};
use keygate_auth::{Metadata, RequestContext};

use super::{rejected, ProfileArgs};
use crate::context::Context;

/// Run the profile command.
pub async fn run(args: ProfileArgs, ctx: &Context) -> Result<()> {
    let auth = ctx.coordinator()?;

    let mut request = RequestContext::new();
    if let Some(metadata) = build_metadata(args.authorization.as_deref(), args.raw) {
        request = request.with_metadata(metadata);
    }
    if let Some(ms) = args.timeout_ms {
        request = request.with_timeout(Duration::from_millis(ms));
    }
    ctx.output
        .debug(&format!("Request ID: {}", request.request_id));

    let profile = auth.get_profile(&request).await.map_err(rejected)?;

    if ctx.output.is_json() {
        ctx.output.json(&profile);
    } else {
        ctx.output.header("Profile");
        ctx.output.kv("subject_id", &profile.subject_id);
        ctx.output.kv("username", &profile.username);
    }

    Ok(())
}

/// Build request metadata from a command-line authorization value.
///
/// No value means the request carries no metadata at all.
fn build_metadata(authorization: Option<&str>, raw: bool) -> Option<Metadata> {
    let value = authorization?;
    let token = if raw { value } else { strip_bearer(value) };
    Some(Metadata::new().with(AUTHORIZATION, token))
}
