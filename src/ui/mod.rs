//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing, table rendering and publish
//!   summaries
//!
//! # Design
//!
//! The library reports through `tracing`; only the CLI prints, and it does
//! so through this module.

pub mod output;
