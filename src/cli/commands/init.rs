//! init command - Create a new dataset file in the store

use anyhow::{bail, Context as _, Result};

use super::{open_pipeline, store_path};
use crate::cli::Context;
use crate::dataset::Format;
use crate::pipeline::PublishResult;
use crate::ui::output;

/// Create `path` holding only a header row (or an empty record list).
///
/// The write is create-only: an existing file is reported and left alone.
pub fn init(
    ctx: &Context,
    path: &str,
    columns: Vec<String>,
    format: Option<Format>,
    message: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(init_async(ctx, path, columns, format, message))
}

async fn init_async(
    ctx: &Context,
    path: &str,
    columns: Vec<String>,
    format: Option<Format>,
    message: Option<&str>,
) -> Result<()> {
    let path = store_path(path)?;
    let mut pipeline = open_pipeline(ctx)?;

    pipeline
        .create(path.clone(), columns, format)
        .with_context(|| format!("Cannot create '{}'", path))?;

    let message = message
        .map(str::to_string)
        .unwrap_or_else(|| format!("Create {}", path));

    match pipeline.publish(&message).await {
        PublishResult::Published(receipt) => {
            output::print(
                format!("Created {} at revision {}", path, receipt.marker.short()),
                ctx.verbosity(),
            );
            Ok(())
        }
        PublishResult::Conflicted { .. } => {
            bail!("'{}' already exists; nothing was written", path)
        }
        other => bail!(output::describe_publish(&other)),
    }
}
