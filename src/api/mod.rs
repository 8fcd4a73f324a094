//! HTTP module.
//!
//! This module provides:
//! - Catalog search client
//! - Scan image client behind the `PageFetcher` trait
//! - Retry policy with exponential backoff

pub mod client;
pub mod retry;

pub use client::{CatalogClient, PageFetcher, PageResponse, ScanClient};
pub use retry::RetryPolicy;
