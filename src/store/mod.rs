//! store
//!
//! Versioned blob stores the pipeline fetches from and publishes to.
//!
//! # Architecture
//!
//! The [`RemoteStore`] trait is the only thing the pipeline knows about a
//! store. Concrete stores are chosen once, by [`create_store`], from
//! configuration.
//!
//! # Modules
//!
//! - `traits`: [`RemoteStore`], [`StoreError`] and request/response types
//! - [`github`]: GitHub contents API
//! - [`local`]: a directory on disk
//! - [`disabled`]: the store used when nothing is configured
//! - [`mock`]: in-memory store for deterministic testing
//! - `factory`: store selection and creation

pub mod disabled;
mod factory;
pub mod github;
pub mod local;
pub mod mock;
mod traits;

pub use factory::{create_store, valid_store_names, StoreProvider, StoreSettings};
pub use traits::*;
