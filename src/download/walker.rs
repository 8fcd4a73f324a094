//! Sequential chapter/page walk with checkpointing.
//!
//! Pages live at `{base}/{title}/{chapter}/{page}.{ext}`. Within a chapter the
//! page counter climbs until the server answers 404, which moves the walk to
//! page 1 of the next chapter. The checkpoint is rewritten after every step.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use tokio::fs;
use tokio::time::sleep;
use url::Url;

use crate::api::{PageFetcher, RetryPolicy};
use crate::config::{validate_walk_request, Config};
use crate::download::progress::{
    load_progress, resume_state, save_progress, Position, Progress, ResumeState,
};
use crate::download::state::DownloadState;
use crate::error::{Error, Result};
use crate::fs::{page_filename, progress_file, title_folder};

/// What to download: a title, where to start, and the last chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRequest {
    pub title: String,
    pub start_chapter: u32,
    pub start_page: u32,
    pub max_chapter: u32,
}

impl WalkRequest {
    /// Continue a title from a checkpointed position.
    pub fn resume(title: &str, position: Position) -> Self {
        Self {
            title: title.to_string(),
            start_chapter: position.chapter,
            start_page: position.page,
            max_chapter: position.max_chapter,
        }
    }

    pub fn start(&self) -> Position {
        Position {
            chapter: self.start_chapter,
            page: self.start_page,
            max_chapter: self.max_chapter,
        }
    }
}

/// Builds page URLs on the scan host.
#[derive(Debug, Clone)]
pub struct ScanSource {
    base_url: Url,
    extension: String,
}

impl ScanSource {
    pub fn new(base_url: &str, extension: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Image base URL cannot hold a path: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            extension: extension.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.scans.image_base_url, &config.scans.image_extension)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// URL of one page.
    ///
    /// The title is percent-encoded, except `/` which stays a path separator
    /// as on the scan host. `.` and `..` segments are dropped.
    pub fn page_url(&self, title: &str, chapter: u32, page: u32) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "Image base URL cannot hold a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(title.split('/'))
            .push(&chapter.to_string())
            .push(&format!("{}.{}", page, self.extension));
        Ok(url)
    }
}

/// Walks a title's pages through a `PageFetcher`, saving them under the
/// scans directory.
pub struct Walker<'a, F: PageFetcher> {
    fetcher: &'a F,
    source: ScanSource,
    scans_dir: PathBuf,
    retry: RetryPolicy,
    page_delay_ms: (u64, u64),
}

impl<'a, F: PageFetcher> Walker<'a, F> {
    pub fn new(fetcher: &'a F, source: ScanSource, scans_dir: &Path, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            source,
            scans_dir: scans_dir.to_path_buf(),
            retry,
            page_delay_ms: (0, 0),
        }
    }

    /// Pause a random number of milliseconds in `min..=max` after each saved page.
    pub fn with_page_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.page_delay_ms = (min_ms, max_ms.max(min_ms));
        self
    }

    /// Folder holding a title's pages and checkpoint.
    pub fn title_dir(&self, title: &str) -> Result<PathBuf> {
        title_folder(&self.scans_dir, title)
    }

    /// Classify the checkpoint of `title`.
    pub async fn resume_state(&self, title: &str) -> Result<ResumeState> {
        resume_state(&progress_file(&self.title_dir(title)?)).await
    }

    /// Walk from the request's start position to the end of its last chapter.
    ///
    /// Network failures that outlast the retry policy abort the walk; the
    /// checkpoint then points at the page that failed.
    pub async fn walk(&self, request: &WalkRequest, state: &mut DownloadState) -> Result<()> {
        validate_walk_request(request)?;

        let title_dir = self.title_dir(&request.title)?;
        let checkpoint = progress_file(&title_dir);
        state.title_dir = Some(title_dir.clone());

        match load_progress(&checkpoint).await {
            Ok(Some(Progress::Completed)) => {
                tracing::info!(
                    "All chapters for {} have already been downloaded.",
                    request.title
                );
                state.already_completed = true;
                return Ok(());
            }
            Ok(_) => {}
            Err(Error::CorruptProgress(reason)) => {
                tracing::warn!("Overwriting unreadable checkpoint: {}", reason);
            }
            Err(e) => return Err(e),
        }

        fs::create_dir_all(&title_dir).await?;

        let mut pos = request.start();
        tracing::info!(
            "Walking {} from chapter {}, page {} to chapter {}",
            request.title,
            pos.chapter,
            pos.page,
            pos.max_chapter
        );

        while !pos.is_past_end() {
            pos = self.step(&request.title, &title_dir, pos, state).await?;
            save_progress(&checkpoint, &Progress::InProgress(pos)).await?;
            state.position = Some(pos);
        }

        save_progress(&checkpoint, &Progress::Completed).await?;
        state.completed = true;
        tracing::info!("Download complete!");

        Ok(())
    }

    /// Walk, restarting up to `restarts` times from the checkpoint when the
    /// network gives out.
    pub async fn walk_with_restarts(
        &self,
        request: &WalkRequest,
        restarts: u32,
        state: &mut DownloadState,
    ) -> Result<()> {
        let mut request = request.clone();

        loop {
            match self.walk(&request, state).await {
                Ok(()) => return Ok(()),
                Err(e) if state.restarts < restarts && is_network_failure(&e) => {
                    state.restarts += 1;
                    tracing::warn!("{}", e);
                    tracing::info!("Retrying... ({}/{})", state.restarts, restarts);

                    if let ResumeState::Resume(position) =
                        self.resume_state(&request.title).await?
                    {
                        request = WalkRequest::resume(&request.title, position);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Handle one (chapter, page) and return the next position.
    async fn step(
        &self,
        title: &str,
        title_dir: &Path,
        mut pos: Position,
        state: &mut DownloadState,
    ) -> Result<Position> {
        let filename = page_filename(pos.chapter, pos.page, self.source.extension());
        let target = title_dir.join(&filename);

        if fs::try_exists(&target).await? {
            tracing::debug!("Skipping existing file: {}", target.display());
            state.record_present();
            pos.page += 1;
            return Ok(pos);
        }

        let url = self.source.page_url(title, pos.chapter, pos.page)?;
        tracing::info!("Downloading: Chapter {}, Page {}", pos.chapter, pos.page);

        let fetcher = self.fetcher;
        let url = &url;
        let requests = &mut state.requests;
        let response = self
            .retry
            .run(move || {
                *requests += 1;
                fetcher.fetch_page(url)
            })
            .await?;

        match response.status {
            StatusCode::OK => {
                write_page(&target, &response.body).await?;
                state.record_saved(response.body.len());
                tracing::info!("Saved: {}", filename);
                pos.page += 1;
                self.pause_after_page().await;
            }
            StatusCode::NOT_FOUND => {
                tracing::info!(
                    "Page {} not found (404). Moving to next chapter.",
                    pos.page
                );
                tracing::info!(
                    "Completed Chapter {}/{} - {:.2}%",
                    pos.chapter,
                    pos.max_chapter,
                    pos.percent()
                );
                state.record_chapter_done();
                pos.chapter += 1;
                pos.page = 1;
            }
            status => {
                tracing::warn!(
                    "Error {} on chapter {} page {}, skipping...",
                    status,
                    pos.chapter,
                    pos.page
                );
                state.record_skipped(pos.chapter, pos.page, status);
                pos.page += 1;
            }
        }

        Ok(pos)
    }

    async fn pause_after_page(&self) {
        let (min_ms, max_ms) = self.page_delay_ms;
        if max_ms == 0 {
            return;
        }

        let delay = rand::thread_rng().gen_range(min_ms..=max_ms);
        tracing::debug!("Waiting {} ms...", delay);
        sleep(Duration::from_millis(delay)).await;
    }
}

/// Write a page through a temporary file so a crash never leaves a
/// truncated image that a later run would take for a finished page.
async fn write_page(target: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = target.with_extension("part");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, target).await?;
    Ok(())
}

fn is_network_failure(error: &Error) -> bool {
    matches!(error, Error::RetriesExhausted { .. }) || error.is_transient()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PageResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    const BASE: &str = "https://scans.example.com/s2/scans/";
    const TITLE: &str = "One Piece";

    /// Serves `chapters[c]` pages for chapter `c`, 404 past the last page.
    #[derive(Default)]
    struct ScriptedFetcher {
        chapters: HashMap<u32, u32>,
        statuses: HashMap<(u32, u32), StatusCode>,
        failures: Mutex<HashMap<(u32, u32), u32>>,
        requested: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedFetcher {
        fn with_chapters(chapters: &[(u32, u32)]) -> Self {
            Self {
                chapters: chapters.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn status(mut self, chapter: u32, page: u32, status: StatusCode) -> Self {
            self.statuses.insert((chapter, page), status);
            self
        }

        fn fail(self, chapter: u32, page: u32, times: u32) -> Self {
            self.failures.lock().unwrap().insert((chapter, page), times);
            self
        }

        fn requested(&self) -> Vec<(u32, u32)> {
            self.requested.lock().unwrap().clone()
        }
    }

    fn parse_page(url: &Url) -> (u32, u32) {
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        let n = segments.len();
        let chapter = segments[n - 2].parse().unwrap();
        let page = segments[n - 1].split('.').next().unwrap().parse().unwrap();
        (chapter, page)
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, url: &Url) -> Result<PageResponse> {
            let key = parse_page(url);
            self.requested.lock().unwrap().push(key);

            if let Some(left) = self.failures.lock().unwrap().get_mut(&key) {
                if *left > 0 {
                    *left -= 1;
                    return Err(Error::Network("connection reset".into()));
                }
            }

            if let Some(status) = self.statuses.get(&key) {
                return Ok(PageResponse::status(*status));
            }

            let (chapter, page) = key;
            match self.chapters.get(&chapter) {
                Some(&pages) if page <= pages => {
                    Ok(PageResponse::ok(format!("c{}p{}", chapter, page).into_bytes()))
                }
                _ => Ok(PageResponse::status(StatusCode::NOT_FOUND)),
            }
        }
    }

    fn request(start_chapter: u32, start_page: u32, max_chapter: u32) -> WalkRequest {
        WalkRequest {
            title: TITLE.to_string(),
            start_chapter,
            start_page,
            max_chapter,
        }
    }

    fn walker<'a>(
        fetcher: &'a ScriptedFetcher,
        dir: &Path,
        attempts: u32,
    ) -> Walker<'a, ScriptedFetcher> {
        let source = ScanSource::new(BASE, "jpg").unwrap();
        Walker::new(fetcher, source, dir, RetryPolicy::immediate(attempts))
    }

    fn checkpoint(dir: &Path) -> String {
        std::fs::read_to_string(dir.join(TITLE).join("progress.txt")).unwrap()
    }

    fn page_exists(dir: &Path, chapter: u32, page: u32) -> bool {
        dir.join(TITLE).join(page_filename(chapter, page, "jpg")).exists()
    }

    #[test]
    fn test_page_url_encodes_title() {
        let source = ScanSource::new(BASE, "jpg").unwrap();
        let url = source.page_url(TITLE, 12, 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://scans.example.com/s2/scans/One%20Piece/12/3.jpg"
        );

        let source = ScanSource::new("https://scans.example.com/s2/scans", "png").unwrap();
        let url = source.page_url("Fate/Zero", 1, 1).unwrap();
        assert_eq!(url.as_str(), "https://scans.example.com/s2/scans/Fate/Zero/1/1.png");

        let url = source.page_url("../admin", 2, 5).unwrap();
        assert_eq!(url.as_str(), "https://scans.example.com/s2/scans/admin/2/5.png");
    }

    #[tokio::test]
    async fn test_title_with_ellipsis_is_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let title = "Kaguya-sama... Love is War";
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let mut state = DownloadState::new(title.to_string());

        let request = WalkRequest {
            title: title.to_string(),
            start_chapter: 1,
            start_page: 1,
            max_chapter: 1,
        };
        assert_ok!(walker(&fetcher, dir.path(), 1).walk(&request, &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 1), (1, 2)]);
        assert!(dir.path().join(title).join("ch001_p001.jpg").exists());
    }

    #[tokio::test]
    async fn test_unreadable_checkpoint_aborts_walk() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the checkpoint cannot be read as text
        std::fs::create_dir_all(dir.path().join(TITLE).join("progress.txt")).unwrap();

        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let mut state = DownloadState::new(TITLE.to_string());
        let result = walker(&fetcher, dir.path(), 1)
            .walk(&request(1, 1, 1), &mut state)
            .await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let title_dir = dir.path().join(TITLE);
        std::fs::create_dir_all(&title_dir).unwrap();
        std::fs::write(title_dir.join("progress.txt"), "garbage").unwrap();

        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let mut state = DownloadState::new(TITLE.to_string());
        assert_ok!(walker(&fetcher, dir.path(), 1).walk(&request(1, 1, 1), &mut state).await);

        assert_eq!(checkpoint(dir.path()), "Completed");
    }

    #[tokio::test]
    async fn test_walks_pages_then_chapters_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 3), (2, 2)]);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(walker(&fetcher, dir.path(), 3).walk(&request(1, 1, 2), &mut state).await);

        let requested = fetcher.requested();
        assert_eq!(
            requested,
            vec![(1, 1), (1, 2), (1, 3), (1, 4), (2, 1), (2, 2), (2, 3)]
        );
        assert!(requested.windows(2).all(|w| w[0] < w[1]));

        for (chapter, page) in [(1, 1), (1, 2), (1, 3), (2, 1), (2, 2)] {
            assert!(page_exists(dir.path(), chapter, page));
        }
        let saved = std::fs::read(dir.path().join(TITLE).join("ch002_p001.jpg")).unwrap();
        assert_eq!(saved, b"c2p1");

        assert_eq!(checkpoint(dir.path()), "Completed");
        assert_eq!(state.pages_saved, 5);
        assert_eq!(state.chapters_completed, 2);
        assert_eq!(state.requests, 7);
        assert!(state.completed);
    }

    #[tokio::test]
    async fn test_not_found_on_first_page_moves_to_next_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 0), (2, 1)]);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(walker(&fetcher, dir.path(), 3).walk(&request(1, 1, 2), &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 1), (2, 1), (2, 2)]);
        assert!(!page_exists(dir.path(), 1, 1));
        assert!(page_exists(dir.path(), 2, 1));
    }

    #[tokio::test]
    async fn test_unexpected_status_leaves_gap_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 3)])
            .status(1, 2, StatusCode::INTERNAL_SERVER_ERROR);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(walker(&fetcher, dir.path(), 5).walk(&request(1, 1, 1), &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 1), (1, 2), (1, 3), (1, 4)]);
        assert!(page_exists(dir.path(), 1, 1));
        assert!(!page_exists(dir.path(), 1, 2));
        assert!(page_exists(dir.path(), 1, 3));
        assert_eq!(state.skipped_count(), 1);
        assert_eq!(state.skipped[0].status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]).fail(1, 1, 2);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(walker(&fetcher, dir.path(), 3).walk(&request(1, 1, 1), &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 1), (1, 1), (1, 1), (1, 2)]);
        assert!(page_exists(dir.path(), 1, 1));
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_and_checkpoint_failing_page() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 5), (2, 5)]).fail(1, 3, 10);
        let mut state = DownloadState::new(TITLE.to_string());

        let result = walker(&fetcher, dir.path(), 2)
            .walk(&request(1, 1, 2), &mut state)
            .await;

        assert!(matches!(result, Err(Error::RetriesExhausted { attempts: 2, .. })));
        assert_eq!(checkpoint(dir.path()), "1 3 2 50.00%");
        assert!(page_exists(dir.path(), 1, 2));
        assert!(!page_exists(dir.path(), 1, 3));
        assert!(!state.completed);
    }

    #[tokio::test]
    async fn test_resume_continues_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();

        let flaky = ScriptedFetcher::with_chapters(&[(1, 3), (2, 2)]).fail(1, 3, 10);
        let mut state = DownloadState::new(TITLE.to_string());
        let first = walker(&flaky, dir.path(), 1)
            .walk(&request(1, 1, 2), &mut state)
            .await;
        assert!(first.is_err());

        let fetcher = ScriptedFetcher::with_chapters(&[(1, 3), (2, 2)]);
        let walker = walker(&fetcher, dir.path(), 1);
        let position = match walker.resume_state(TITLE).await.unwrap() {
            ResumeState::Resume(position) => position,
            other => panic!("expected a resumable checkpoint, got {:?}", other),
        };
        assert_eq!((position.chapter, position.page), (1, 3));

        let mut state = DownloadState::new(TITLE.to_string());
        assert_ok!(walker.walk(&WalkRequest::resume(TITLE, position), &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 3), (1, 4), (2, 1), (2, 2), (2, 3)]);
        assert_eq!(state.pages_saved, 3);
        let files = std::fs::read_dir(dir.path().join(TITLE)).unwrap().count();
        // five pages plus the checkpoint
        assert_eq!(files, 6);
    }

    #[tokio::test]
    async fn test_completed_title_makes_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let mut state = DownloadState::new(TITLE.to_string());
        assert_ok!(walker(&fetcher, dir.path(), 1).walk(&request(1, 1, 1), &mut state).await);

        let again = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let walker = walker(&again, dir.path(), 1);
        assert_eq!(walker.resume_state(TITLE).await.unwrap(), ResumeState::Completed);

        let mut state = DownloadState::new(TITLE.to_string());
        assert_ok!(walker.walk(&request(1, 1, 1), &mut state).await);
        assert!(again.requested().is_empty());
        assert!(state.already_completed);
    }

    #[tokio::test]
    async fn test_existing_pages_are_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let title_dir = dir.path().join(TITLE);
        std::fs::create_dir_all(&title_dir).unwrap();
        std::fs::write(title_dir.join("ch001_p001.jpg"), b"old").unwrap();

        let fetcher = ScriptedFetcher::with_chapters(&[(1, 2)]);
        let mut state = DownloadState::new(TITLE.to_string());
        assert_ok!(walker(&fetcher, dir.path(), 1).walk(&request(1, 1, 1), &mut state).await);

        assert_eq!(fetcher.requested(), vec![(1, 2), (1, 3)]);
        assert_eq!(std::fs::read(title_dir.join("ch001_p001.jpg")).unwrap(), b"old");
        assert_eq!(state.pages_present, 1);
    }

    #[tokio::test]
    async fn test_start_beyond_max_completes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 1)]);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(walker(&fetcher, dir.path(), 1).walk(&request(4, 1, 3), &mut state).await);

        assert!(fetcher.requested().is_empty());
        assert_eq!(checkpoint(dir.path()), "Completed");
    }

    #[tokio::test]
    async fn test_restart_resumes_after_exhausted_retries() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 2)]).fail(1, 2, 3);
        let mut state = DownloadState::new(TITLE.to_string());

        assert_ok!(
            walker(&fetcher, dir.path(), 2)
                .walk_with_restarts(&request(1, 1, 1), 1, &mut state)
                .await
        );

        assert_eq!(
            fetcher.requested(),
            vec![(1, 1), (1, 2), (1, 2), (1, 2), (1, 2), (1, 3)]
        );
        assert_eq!(state.restarts, 1);
        assert_eq!(state.pages_saved, 2);
        assert_eq!(checkpoint(dir.path()), "Completed");
    }

    #[tokio::test]
    async fn test_restarts_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::with_chapters(&[(1, 2)]).fail(1, 1, 100);
        let mut state = DownloadState::new(TITLE.to_string());

        let result = walker(&fetcher, dir.path(), 2)
            .walk_with_restarts(&request(1, 1, 1), 1, &mut state)
            .await;

        assert!(result.is_err());
        assert_eq!(fetcher.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::default();
        let mut state = DownloadState::default();

        let result = walker(&fetcher, dir.path(), 1)
            .walk(&request(1, 0, 1), &mut state)
            .await;
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }
}
