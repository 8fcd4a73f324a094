//! Download module for scan pages.
//!
//! This module provides:
//! - Download state tracking
//! - The progress checkpoint and resume decision
//! - The sequential chapter/page walker

pub mod progress;
pub mod state;
pub mod walker;

pub use progress::{load_progress, resume_state, save_progress, Position, Progress, ResumeState};
pub use state::{DownloadState, SkippedPage};
pub use walker::{ScanSource, WalkRequest, Walker};
