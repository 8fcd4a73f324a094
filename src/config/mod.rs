//! Configuration module for the scan-archiver.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{CatalogConfig, Config, PackConfig, RetryConfig, ScansConfig};
pub use validation::{validate_config, validate_split, validate_walk_request};
