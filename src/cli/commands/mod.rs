//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the working directory
//! 2. Builds a store and a pipeline through [`open_pipeline`]
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that reach the store are async. Their public entry points are
//! synchronous wrappers that block on a fresh `tokio` runtime.

mod auth;
mod config_cmd;
mod edit;
mod init;
mod show;

pub use auth::auth;
pub use config_cmd::{get as config_get, list as config_list, path as config_path};
pub use edit::{edit, EditRequest};
pub use init::init;
pub use show::show;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::StorePath;
use crate::pipeline::PublishPipeline;
use crate::secrets::{self, resolve_token};
use crate::store::{create_store, RemoteStore, StoreProvider};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Show {
            path,
            format,
            limit,
            raw,
        } => show::show(ctx, &path, format, limit, raw),
        Command::Edit {
            path,
            format,
            sets,
            add_rows,
            delete_rows,
            message,
            reapply_on_conflict,
            dry_run,
        } => edit::edit(
            ctx,
            EditRequest {
                path,
                format,
                sets,
                add_rows,
                delete_rows,
                message,
                reapply_on_conflict,
                dry_run,
            },
        ),
        Command::Init {
            path,
            columns,
            format,
            message,
        } => init::init(ctx, &path, columns, format, message.as_deref()),
        Command::Auth {
            token,
            status,
            logout,
        } => auth::auth(ctx, token.as_deref(), status, logout),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::List => config_cmd::list(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
    }
}

/// Load configuration for the context's working directory.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let dir = ctx.workdir()?;
    Config::load(Some(&dir)).context("Failed to load configuration")
}

/// Build the configured store, resolving a token for the github provider.
pub(crate) fn open_store(config: &Config) -> Result<Arc<dyn RemoteStore>> {
    let token = if StoreProvider::parse(config.store_provider()) == Some(StoreProvider::GitHub) {
        let secret_store = secrets::create_store(config.secrets_provider())
            .context("Failed to initialize secret store")?;
        resolve_token(|name| std::env::var(name).ok(), secret_store.as_ref())
            .context("Failed to read stored token")?
            .map(|resolved| {
                tracing::debug!(source = %resolved.source, "resolved github token");
                resolved.token
            })
    } else {
        None
    };

    let settings = config
        .store_settings(token)
        .context("Invalid store configuration")?;
    create_store(&settings).context("Failed to create store")
}

/// A pipeline over the configured store with the configured retry policy.
pub(crate) fn open_pipeline(ctx: &Context) -> Result<PublishPipeline> {
    let config = load_config(ctx)?;
    let store = open_store(&config)?;
    Ok(PublishPipeline::new(store).with_retry(config.retry_policy()))
}

pub(crate) fn store_path(path: &str) -> Result<StorePath> {
    StorePath::new(path).with_context(|| format!("Invalid path '{}'", path))
}
