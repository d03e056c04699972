//! ui::output
//!
//! Terminal output for the CLI.
//!
//! # Design
//!
//! Results go to stdout and diagnostics to stderr. Everything except errors
//! and requested data respects `--quiet`.

use std::fmt::Display;

use crate::dataset::{Dataset, Value};
use crate::pipeline::PublishResult;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors and requested data only
    Quiet,
    Normal,
    /// Normal output plus `[debug]` lines
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags; `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Longest cell rendered by [`render_table`] before truncation.
pub const MAX_CELL_WIDTH: usize = 40;

/// Render a dataset as an aligned text table.
///
/// The first column is the row index used by edit operations. Nulls render
/// as `-`. At most `limit` rows are shown, followed by a count of the rest.
///
/// # Example
///
/// ```
/// use tabledit::dataset::{parse, Format};
/// use tabledit::ui::output::render_table;
///
/// let d = parse(b"id,name\n1,ada\n2,\n", Format::Csv).unwrap();
/// assert_eq!(
///     render_table(&d, None),
///     "#  id  name\n0  1   ada\n1  2   -\n"
/// );
/// ```
pub fn render_table(dataset: &Dataset, limit: Option<usize>) -> String {
    let shown = limit
        .unwrap_or(usize::MAX)
        .min(dataset.row_count());

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
    grid.push(
        std::iter::once("#".to_string())
            .chain(dataset.columns().iter().map(|c| truncate(c)))
            .collect(),
    );
    for (idx, row) in dataset.rows().iter().take(shown).enumerate() {
        grid.push(
            std::iter::once(idx.to_string())
                .chain(row.iter().map(render_cell))
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..grid[0].len())
        .map(|col| {
            grid.iter()
                .map(|line| line[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in &grid {
        let last = line.len() - 1;
        for (col, cell) in line.iter().enumerate() {
            out.push_str(cell);
            if col < last {
                let pad = widths[col] - cell.chars().count() + 2;
                out.extend(std::iter::repeat(' ').take(pad));
            }
        }
        out.push('\n');
    }

    let hidden = dataset.row_count() - shown;
    if hidden > 0 {
        out.push_str(&format!("... {} more row(s)\n", hidden));
    }
    out
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        other => truncate(&other.to_string()),
    }
}

fn truncate(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        single_line
    } else {
        let head: String = single_line.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", head)
    }
}

/// One-line summary of a publish outcome.
pub fn describe_publish(result: &PublishResult) -> String {
    match result {
        PublishResult::Published(receipt) => {
            let mut line = format!("Published revision {}", receipt.marker.short());
            if let Some(commit) = &receipt.commit {
                line.push_str(&format!(" (commit {})", short_id(&commit.id)));
            }
            if receipt.reconciled {
                line.push_str(" [confirmed after an interrupted push]");
            }
            line
        }
        PublishResult::NothingToPublish => "Nothing to publish.".to_string(),
        PublishResult::Cancelled => "Publish cancelled; edits kept.".to_string(),
        PublishResult::Conflicted { message, .. } => {
            format!("The remote changed since it was loaded: {}", message)
        }
        PublishResult::Failed { kind, message } => format!("Publish failed ({}): {}", kind, message),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
