//! Keygate CLI - Command line front end for the Keygate authentication core.
//!
//! Commands:
//! - `keygate hash` - Hash a password
//! - `keygate user` - Manage the users file
//! - `keygate login` - Verify credentials and issue a token
//! - `keygate profile` - Resolve a token to a user profile
//! - `keygate token` - Issue or inspect tokens directly
//! - `keygate config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, HashArgs, LoginArgs, ProfileArgs, TokenArgs, UserArgs};

/// Keygate CLI - Verify credentials and manage signed session tokens
#[derive(Parser)]
#[command(name = "keygate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password for the users file
    Hash(HashArgs),

    /// Manage users
    User(UserArgs),

    /// Log in and print an access token
    Login(LoginArgs),

    /// Show the profile behind an access token
    Profile(ProfileArgs),

    /// Issue or inspect tokens
    Token(TokenArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Hash(args) => commands::hash::run(args, &ctx).await,
        Commands::User(args) => commands::user::run(args, &ctx).await,
        Commands::Login(args) => commands::login::run(args, &ctx).await,
        Commands::Profile(args) => commands::profile::run(args, &ctx).await,
        Commands::Token(args) => commands::token::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
