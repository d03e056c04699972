//! cli::commands::show
//!
//! Fetch a dataset and print it.

use std::io::Write;

use anyhow::{Context as _, Result};

use super::{load_config, open_store, store_path};
use crate::cli::Context;
use crate::core::codec;
use crate::dataset::Format;
use crate::pipeline::PublishPipeline;
use crate::ui::output;

/// Run the show command.
pub fn show(
    ctx: &Context,
    path: &str,
    format: Option<Format>,
    limit: Option<usize>,
    raw: bool,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(show_async(ctx, path, format, limit, raw))
}

async fn show_async(
    ctx: &Context,
    path: &str,
    format: Option<Format>,
    limit: Option<usize>,
    raw: bool,
) -> Result<()> {
    let path = store_path(path)?;
    let config = load_config(ctx)?;
    let store = open_store(&config)?;

    if raw {
        let fetched = store
            .fetch(&path)
            .await
            .with_context(|| format!("Failed to fetch '{}'", path))?;
        let bytes = codec::decode(&fetched.content)
            .with_context(|| format!("Failed to decode '{}'", path))?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
        return Ok(());
    }

    let mut pipeline = PublishPipeline::new(store).with_retry(config.retry_policy());
    match format {
        Some(format) => pipeline.load_as(path.clone(), format).await,
        None => pipeline.load(path.clone()).await,
    }
    .with_context(|| format!("Failed to load '{}'", path))?;

    if let Some(dataset) = pipeline.dataset() {
        output::print(
            format!(
                "{} @ {} ({}, {} rows)",
                path,
                pipeline.marker().map(|m| m.short()).unwrap_or("-"),
                pipeline.format().map(|f| f.name()).unwrap_or("-"),
                dataset.row_count()
            ),
            ctx.verbosity(),
        );
        print!("{}", output::render_table(dataset, limit));
    }
    Ok(())
}
