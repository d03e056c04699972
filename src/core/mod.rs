//! core
//!
//! Core domain types, blob encoding and configuration for tabledit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: StorePath, RevisionMarker, ErrorKind
//! - [`codec`] - Base64 transport encoding of file content
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod codec;
pub mod config;
pub mod types;
