//! Scan Archiver - manga scan downloader and CBZ packer
//!
//! This library searches a manga catalog, downloads chapter scans page by page
//! and packs downloaded titles into CBZ archives.
//!
//! # Features
//!
//! - Catalog search and whole-catalog sweeps
//! - Resumable chapter/page walk with a plain-text checkpoint
//! - Exponential backoff with jitter on network failures
//! - Splitting of overly tall images into reader-sized pages
//! - Size-capped, multi-part CBZ packing
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use scan_archiver::{Config, DownloadState, ScanClient, ScanSource, WalkRequest, Walker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let client = ScanClient::new(&config)?;
//!     let walker = Walker::new(
//!         &client,
//!         ScanSource::from_config(&config)?,
//!         &config.scans.scans_directory,
//!         config.retry_policy(),
//!     );
//!
//!     let request = WalkRequest {
//!         title: "One Piece".to_string(),
//!         start_chapter: 1,
//!         start_page: 1,
//!         max_chapter: 10,
//!     };
//!     let mut state = DownloadState::new(request.title.clone());
//!     walker.walk(&request, &mut state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod output;
pub mod postprocess;

// Re-exports for convenience
pub use api::{CatalogClient, PageFetcher, RetryPolicy, ScanClient};
pub use catalog::SearchResult;
pub use config::Config;
pub use download::{DownloadState, Position, Progress, ResumeState, ScanSource, WalkRequest, Walker};
pub use error::{Error, Result};
pub use postprocess::{pack_title, PackSummary, SplitOptions};
