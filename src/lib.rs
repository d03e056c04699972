//! tabledit - fetch, edit and publish tabular datasets
//!
//! tabledit reads a CSV, TSV, JSON or JSON Lines file from a versioned
//! store, applies validated edits to it and writes it back as a new
//! revision, conditioned on the revision it read.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, the base64 blob codec and configuration
//! - [`store`] - The [`RemoteStore`](store::RemoteStore) trait with GitHub,
//!   local directory, disabled and in-memory implementations
//! - [`dataset`] - Parsing and serialising datasets
//! - [`session`] - Validated edits against a working copy
//! - [`pipeline`] - The fetch, edit and publish state machine
//! - [`secrets`] - Token storage and resolution
//! - [`cli`] / [`ui`] - The `tabledit` command
//!
//! # Correctness Invariants
//!
//! 1. A publish never overwrites a revision it did not read
//! 2. Invalid edits leave the working copy untouched
//! 3. Serialisation is deterministic and round-trips through parsing
//! 4. Tokens never appear in logs, errors or `Debug` output

pub mod cli;
pub mod core;
pub mod dataset;
pub mod pipeline;
pub mod secrets;
pub mod session;
pub mod store;
pub mod ui;
