//! Download state tracking.

use std::path::PathBuf;

use reqwest::StatusCode;

use crate::download::progress::Position;

/// A page skipped because the server answered with an unexpected status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPage {
    pub chapter: u32,
    pub page: u32,
    pub status: StatusCode,
}

/// Per-title download state.
#[derive(Debug, Default)]
pub struct DownloadState {
    // Title info
    pub title: Option<String>,
    pub title_dir: Option<PathBuf>,

    // Last checkpointed position
    pub position: Option<Position>,

    /// The checkpoint already said `Completed`; nothing was requested.
    pub already_completed: bool,
    /// This run reached the end and wrote the sentinel.
    pub completed: bool,

    // Statistics
    /// HTTP requests sent, retries included.
    pub requests: u64,
    pub pages_saved: u64,
    pub pages_present: u64,
    pub bytes_saved: u64,
    pub chapters_completed: u64,
    pub restarts: u32,

    /// Gaps left in the archive by unexpected statuses.
    pub skipped: Vec<SkippedPage>,
}

impl DownloadState {
    /// Create a new download state for a title.
    pub fn new(title: String) -> Self {
        Self {
            title: Some(title),
            ..Default::default()
        }
    }

    /// Record a page written to disk.
    pub fn record_saved(&mut self, bytes: usize) {
        self.pages_saved += 1;
        self.bytes_saved += bytes as u64;
    }

    /// Record a page found on disk and not requested again.
    pub fn record_present(&mut self) {
        self.pages_present += 1;
    }

    /// Record a chapter whose page sequence ended with a 404.
    pub fn record_chapter_done(&mut self) {
        self.chapters_completed += 1;
    }

    /// Record a page skipped on an unexpected status.
    pub fn record_skipped(&mut self, chapter: u32, page: u32, status: StatusCode) {
        self.skipped.push(SkippedPage {
            chapter,
            page,
            status,
        });
    }

    /// Number of pages skipped on unexpected statuses.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
