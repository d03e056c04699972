//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::dataset::Format;

/// tabledit - fetch, edit and publish tabular datasets
#[derive(Parser, Debug)]
#[command(name = "tabledit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tabledit was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never prompt for input
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are allowed unless disabled by a flag or stdin is not a TTY.
    pub fn interactive(&self) -> bool {
        !(self.no_interactive || self.quiet) && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a dataset and print it
    #[command(
        name = "show",
        long_about = "Fetch a dataset from the configured store and print it as a table.\n\n\
            The first column of the table is the row index that edit commands use.",
        after_help = "\
EXAMPLES:
    # Print the whole table
    tabledit show data/prices.csv

    # First 20 rows only
    tabledit show data/prices.csv --limit 20

    # The file exactly as stored
    tabledit show data/prices.csv --raw"
    )]
    Show {
        /// Path of the file in the store
        path: String,

        /// Read as this format instead of guessing from the extension
        #[arg(long, value_parser = parse_format)]
        format: Option<Format>,

        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Print the stored bytes instead of a table
        #[arg(long, conflicts_with = "limit")]
        raw: bool,
    },

    /// Edit a dataset and publish the result
    #[command(
        name = "edit",
        long_about = "Load a dataset, apply edits and publish it back as one revision.\n\n\
            Edits are applied in this order: every --set, then every --add-row, then \
            every --delete-row, each in the order given. Row indexes refer to the \
            dataset as it stands when that edit runs.\n\n\
            The publish is conditioned on the revision that was loaded. If someone \
            else published in between, nothing is overwritten and the command fails \
            unless --reapply-on-conflict is given.",
        after_help = "\
EXAMPLES:
    # Change one cell
    tabledit edit data.csv --set 0:val=99 -m \"Fix price\"

    # Append a row and drop another
    tabledit edit data.csv --add-row id=3,val=30 --delete-row 1

    # Check the result without publishing
    tabledit edit data.csv --set 0:val=99 --dry-run"
    )]
    Edit {
        /// Path of the file in the store
        path: String,

        /// Read and write as this format instead of guessing from the extension
        #[arg(long, value_parser = parse_format)]
        format: Option<Format>,

        /// Set a cell: ROW:COLUMN=VALUE (empty VALUE sets null)
        #[arg(long = "set", value_name = "ROW:COLUMN=VALUE", value_parser = parse_set)]
        sets: Vec<SetArg>,

        /// Append a row: COLUMN=VALUE[,COLUMN=VALUE...]
        #[arg(long = "add-row", value_name = "COLUMN=VALUE,...", value_parser = parse_row)]
        add_rows: Vec<RowArg>,

        /// Delete the row at this index
        #[arg(long = "delete-row", value_name = "ROW")]
        delete_rows: Vec<usize>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// On conflict, reload and apply the edits again before a second publish
        #[arg(long)]
        reapply_on_conflict: bool,

        /// Apply the edits and print the result without publishing
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a new, empty dataset file
    #[command(
        name = "init",
        long_about = "Create a dataset file holding only a header.\n\n\
            Fails without writing anything if the file already exists.",
        after_help = "\
EXAMPLES:
    tabledit init data/new.csv --columns id,name,price
    tabledit init data/events.jsonl --columns ts,kind"
    )]
    Init {
        /// Path of the file to create
        path: String,

        /// Column names, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Write this format instead of guessing from the extension
        #[arg(long, value_parser = parse_format)]
        format: Option<Format>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Store or remove the GitHub token
    #[command(
        name = "auth",
        long_about = "Manage the GitHub token used by the github store.\n\n\
            The token is stored in ~/.tabledit/secrets.toml with owner-only \
            permissions. $TABLEDIT_TOKEN and $GITHUB_TOKEN take precedence over \
            the stored token.",
        after_help = "\
EXAMPLES:
    # Prompt for a token
    tabledit auth

    # Non-interactive
    tabledit auth --token ghp_xxxx

    # Where the token comes from
    tabledit auth --status"
    )]
    Auth {
        /// Token to store (prompted for when omitted)
        #[arg(long, conflicts_with_all = ["status", "logout"])]
        token: Option<String>,

        /// Show which token source is in effect
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove the stored token
        #[arg(long)]
        logout: bool,
    },

    /// Show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print one effective value, e.g. `store.provider`
    Get {
        /// Configuration key
        key: String,
    },
    /// Print the effective configuration
    List,
    /// Print the paths of the loaded configuration files
    Path,
}

/// A parsed `--set` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct SetArg {
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// A parsed `--add-row` argument, fields in the order given.
#[derive(Debug, Clone, PartialEq)]
pub struct RowArg(pub Vec<(String, String)>);

fn parse_format(s: &str) -> Result<Format, String> {
    Format::parse(s).ok_or_else(|| {
        let names: Vec<_> = Format::all().iter().map(|f| f.name()).collect();
        format!("unknown format '{}' (valid: {})", s, names.join(", "))
    })
}

fn parse_set(s: &str) -> Result<SetArg, String> {
    let (target, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROW:COLUMN=VALUE, got '{}'", s))?;
    let (row, column) = target
        .split_once(':')
        .ok_or_else(|| format!("expected ROW:COLUMN before '=', got '{}'", target))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("row must be a non-negative integer, got '{}'", row))?;
    if column.is_empty() {
        return Err("column name cannot be empty".into());
    }
    Ok(SetArg {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn parse_row(s: &str) -> Result<RowArg, String> {
    let mut fields = Vec::new();
    for field in s.split(',') {
        let (column, value) = field
            .split_once('=')
            .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", field))?;
        if column.is_empty() {
            return Err("column name cannot be empty".into());
        }
        if fields.iter().any(|(c, _): &(String, String)| c == column) {
            return Err(format!("column '{}' given twice", column));
        }
        fields.push((column.to_string(), value.to_string()));
    }
    Ok(RowArg(fields))
}
