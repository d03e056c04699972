//! cli::commands::edit
//!
//! Load a dataset, apply edits from flags and publish.
//!
//! # Conflicts
//!
//! A conflicting publish never overwrites the remote. With
//! `--reapply-on-conflict` the command reloads, applies the same edits to the
//! fresh copy and publishes once more; any edit that no longer fits aborts
//! the command before that second publish.

use anyhow::{bail, Context as _, Result};

use super::{open_pipeline, store_path};
use crate::cli::args::{RowArg, SetArg};
use crate::cli::Context;
use crate::dataset::{ColumnType, Dataset, Format, Value};
use crate::pipeline::{PublishPipeline, PublishResult};
use crate::session::EditOperation;
use crate::ui::output;

/// Arguments of the edit command.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub path: String,
    pub format: Option<Format>,
    pub sets: Vec<SetArg>,
    pub add_rows: Vec<RowArg>,
    pub delete_rows: Vec<usize>,
    pub message: Option<String>,
    pub reapply_on_conflict: bool,
    pub dry_run: bool,
}

/// Run the edit command.
pub fn edit(ctx: &Context, request: EditRequest) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(edit_async(ctx, request))
}

async fn edit_async(ctx: &Context, request: EditRequest) -> Result<()> {
    let verbosity = ctx.verbosity();
    let path = store_path(&request.path)?;
    let mut pipeline = open_pipeline(ctx)?;

    match request.format {
        Some(format) => pipeline.load_as(path.clone(), format).await,
        None => pipeline.load(path.clone()).await,
    }
    .with_context(|| format!("Failed to load '{}'", path))?;

    let ops = match pipeline.dataset() {
        Some(dataset) => build_operations(dataset, &request)?,
        None => bail!("Nothing loaded from '{}'", path),
    };
    if ops.is_empty() {
        bail!("No edits given. Use --set, --add-row or --delete-row.");
    }

    for op in &ops {
        output::debug(format!("applying: {}", op), verbosity);
        pipeline
            .apply(op.clone())
            .with_context(|| format!("Cannot {}", op))?;
    }

    if request.dry_run {
        if let Some(dataset) = pipeline.dataset() {
            print!("{}", output::render_table(dataset, None));
        }
        output::print(
            format!("Dry run: {} edit(s) not published.", ops.len()),
            verbosity,
        );
        return Ok(());
    }

    let message = request
        .message
        .clone()
        .unwrap_or_else(|| format!("Update {}", path));

    let mut result = pipeline.publish(&message).await;
    if matches!(result, PublishResult::Conflicted { .. }) && request.reapply_on_conflict {
        output::warn(
            "the remote changed since it was loaded; reapplying edits to the new revision",
            verbosity,
        );
        result = reapply_and_publish(&mut pipeline, &message).await?;
    }

    report(result, verbosity)
}

async fn reapply_and_publish(pipeline: &mut PublishPipeline, message: &str) -> Result<PublishResult> {
    let discarded = pipeline
        .reload()
        .await
        .context("Failed to reload after conflict")?;

    let rejected = pipeline.reapply(discarded);
    if !rejected.is_empty() {
        let reasons: Vec<String> = rejected
            .iter()
            .map(|r| format!("  {}: {}", r.operation, r.error))
            .collect();
        bail!(
            "{} edit(s) no longer apply to the new revision; nothing was published:\n{}",
            rejected.len(),
            reasons.join("\n")
        );
    }

    Ok(pipeline.publish(message).await)
}

fn report(result: PublishResult, verbosity: output::Verbosity) -> Result<()> {
    let summary = output::describe_publish(&result);
    match result {
        PublishResult::Published(_) | PublishResult::NothingToPublish => {
            output::print(summary, verbosity);
            Ok(())
        }
        PublishResult::Conflicted { .. } => bail!(
            "{}\nNothing was overwritten. Run the command again, or pass --reapply-on-conflict.",
            summary
        ),
        PublishResult::Cancelled | PublishResult::Failed { .. } => bail!(summary),
    }
}

/// Translate flags into operations, typing values by their target column.
pub(crate) fn build_operations(
    dataset: &Dataset,
    request: &EditRequest,
) -> Result<Vec<EditOperation>> {
    let mut ops = Vec::new();

    for set in &request.sets {
        let value = typed_value(dataset, &set.column, &set.value)?;
        ops.push(EditOperation::set_cell(set.row, set.column.clone(), value));
    }

    for row in &request.add_rows {
        let record = row
            .0
            .iter()
            .map(|(column, text)| Ok((column.clone(), typed_value(dataset, column, text)?)))
            .collect::<Result<Vec<_>>>()?;
        ops.push(EditOperation::add_row(record));
    }

    ops.extend(request.delete_rows.iter().map(|&row| EditOperation::delete_row(row)));
    Ok(ops)
}

/// An unknown column is typed loosely here; validation reports it.
fn typed_value(dataset: &Dataset, column: &str, text: &str) -> Result<Value> {
    let ty = dataset.column_type(column).unwrap_or(ColumnType::Any);
    match Value::from_input(text, ty) {
        Some(value) => Ok(value),
        None => bail!(
            "'{}' is not a valid {} value for column '{}'",
            text,
            ty,
            column
        ),
    }
}
