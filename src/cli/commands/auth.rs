//! cli::commands::auth
//!
//! Store, inspect or remove the GitHub token.
//!
//! # Design
//!
//! The token is written to the secret store under
//! [`GITHUB_TOKEN_KEY`](crate::secrets::GITHUB_TOKEN_KEY). This command
//! never prints a token, only where one was found.

use std::io::{self, Write};

use anyhow::{bail, Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::secrets::{self, resolve_token, SecretStore, GITHUB_TOKEN_KEY};
use crate::ui::output;

/// Run the auth command.
pub fn auth(ctx: &Context, token: Option<&str>, status: bool, logout: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;

    if status {
        return show_status(store.as_ref(), ctx);
    }
    if logout {
        return do_logout(store.as_ref(), ctx);
    }

    let token = read_token(ctx, token)?;
    validate_token(&token)?;
    store
        .set(GITHUB_TOKEN_KEY, &token)
        .context("Failed to store token")?;

    output::print("Token stored.", ctx.verbosity());
    Ok(())
}

fn show_status(store: &dyn SecretStore, ctx: &Context) -> Result<()> {
    let resolved = resolve_token(|name| std::env::var(name).ok(), store)
        .context("Failed to read stored token")?;

    match resolved {
        Some(_) if ctx.quiet => println!("authenticated"),
        Some(resolved) => println!("Using the token from {}.", resolved.source),
        None if ctx.quiet => println!("not_authenticated"),
        None => {
            println!("No GitHub token configured.");
            println!("Run 'tabledit auth' or set TABLEDIT_TOKEN.");
        }
    }
    Ok(())
}

fn do_logout(store: &dyn SecretStore, ctx: &Context) -> Result<()> {
    let removed = store
        .delete(GITHUB_TOKEN_KEY)
        .context("Failed to remove stored token")?;

    let message = if removed {
        "Stored token removed."
    } else {
        "No stored token to remove."
    };
    output::print(message, ctx.verbosity());
    Ok(())
}

fn read_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(token) = token_arg {
        return Ok(token.trim().to_string());
    }

    if !ctx.interactive {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("GitHub personal access token: ");
    io::stdout().flush()?;
    let token = rpassword::read_password().context("Failed to read token")?;
    Ok(token.trim().to_string())
}

/// Reject values that cannot be a token. No network check is made.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}
