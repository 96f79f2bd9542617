//! Shared utilities for folio.
//!
//! This crate provides common utilities used across the folio workspace:
//! - ULID-based identifier generation for versions and content entities
//! - Logging setup with tracing
//! - Config and data directory resolution

pub mod id;
pub mod log;
pub mod path;

pub use id::{IdPrefix, Identifier};
