//! Progress checkpoint persisted next to the downloaded pages.
//!
//! The file holds either `"{chapter} {page} {max_chapter} {percent:.2}%"`
//! (the percentage is informational and ignored on read) or the literal
//! `Completed`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tokio::fs;

use crate::error::{Error, Result};

/// Sentinel written once every chapter has been walked.
pub const COMPLETED: &str = "Completed";

/// Next page to fetch, and the last chapter to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub chapter: u32,
    pub page: u32,
    pub max_chapter: u32,
}

impl Position {
    /// Share of chapters already walked, as a percentage.
    pub fn percent(&self) -> f64 {
        if self.max_chapter == 0 {
            return 0.0;
        }
        f64::from(self.chapter) / f64::from(self.max_chapter) * 100.0
    }

    /// Whether the walk has run past the last chapter.
    pub fn is_past_end(&self) -> bool {
        self.chapter > self.max_chapter
    }
}

/// Persisted state of a title's download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    InProgress(Position),
    Completed,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Completed => write!(f, "{}", COMPLETED),
            Progress::InProgress(pos) => write!(
                f,
                "{} {} {} {:.2}%",
                pos.chapter,
                pos.page,
                pos.max_chapter,
                pos.percent()
            ),
        }
    }
}

impl FromStr for Progress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let content = s.trim();
        if content == COMPLETED {
            return Ok(Progress::Completed);
        }

        let fields: Vec<&str> = content.split_whitespace().take(3).collect();
        if fields.len() < 3 {
            return Err(Error::CorruptProgress(format!(
                "expected 'chapter page max_chapter', got '{}'",
                content
            )));
        }

        let parse = |name: &str, value: &str| -> Result<u32> {
            match value.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(Error::CorruptProgress(format!(
                    "{} must be a positive integer, got '{}'",
                    name, value
                ))),
            }
        };

        let position = Position {
            chapter: parse("chapter", fields[0])?,
            page: parse("page", fields[1])?,
            max_chapter: parse("max_chapter", fields[2])?,
        };

        if position.chapter > position.max_chapter.saturating_add(1) {
            return Err(Error::CorruptProgress(format!(
                "chapter {} is beyond max chapter {}",
                position.chapter, position.max_chapter
            )));
        }

        Ok(Progress::InProgress(position))
    }
}

/// What a fresh invocation should do for a title, judged from its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeState {
    /// No checkpoint: start values must be supplied.
    Fresh,
    /// Everything was downloaded; nothing to do.
    Completed,
    /// Continue exactly where the last run stopped.
    Resume(Position),
    /// The checkpoint is unreadable: start values must be supplied again.
    Corrupt(String),
}

/// Read the checkpoint at `path`, `None` if there is none.
pub async fn load_progress(path: &Path) -> Result<Option<Progress>> {
    match fs::read_to_string(path).await {
        Ok(content) => content.parse().map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Classify the checkpoint at `path`.
pub async fn resume_state(path: &Path) -> Result<ResumeState> {
    match load_progress(path).await {
        Ok(None) => Ok(ResumeState::Fresh),
        Ok(Some(Progress::Completed)) => Ok(ResumeState::Completed),
        Ok(Some(Progress::InProgress(position))) => Ok(ResumeState::Resume(position)),
        Err(Error::CorruptProgress(reason)) => Ok(ResumeState::Corrupt(reason)),
        Err(e) => Err(e),
    }
}

/// Overwrite the checkpoint at `path`.
///
/// The content goes to a sibling temporary file first and is renamed into
/// place, so an interrupted write never leaves a truncated checkpoint.
pub async fn save_progress(path: &Path, progress: &Progress) -> Result<()> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, progress.to_string()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(chapter: u32, page: u32, max_chapter: u32) -> Position {
        Position {
            chapter,
            page,
            max_chapter,
        }
    }

    #[test]
    fn test_format_in_progress() {
        let progress = Progress::InProgress(pos(2, 12, 52));
        assert_eq!(progress.to_string(), "2 12 52 3.85%");
    }

    #[test]
    fn test_format_completed() {
        assert_eq!(Progress::Completed.to_string(), "Completed");
    }

    #[test]
    fn test_parse_ignores_percentage() {
        let progress: Progress = "2 12 52 3.85%".parse().unwrap();
        assert_eq!(progress, Progress::InProgress(pos(2, 12, 52)));

        let progress: Progress = "7 1 9\n".parse().unwrap();
        assert_eq!(progress, Progress::InProgress(pos(7, 1, 9)));
    }

    #[test]
    fn test_parse_sentinel() {
        assert_eq!("Completed\n".parse::<Progress>().unwrap(), Progress::Completed);
    }

    #[test]
    fn test_parse_corrupted() {
        for content in ["", "garbage", "1 2", "a b c", "1 -2 3", "0 1 5", "9 1 5"] {
            assert!(
                matches!(content.parse::<Progress>(), Err(Error::CorruptProgress(_))),
                "{:?} should be rejected",
                content
            );
        }
    }

    #[test]
    fn test_one_past_last_chapter_is_valid() {
        let progress: Progress = "6 1 5".parse().unwrap();
        match progress {
            Progress::InProgress(p) => assert!(p.is_past_end()),
            Progress::Completed => panic!("expected a position"),
        }
    }

    #[tokio::test]
    async fn test_resume_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");

        assert_eq!(resume_state(&path).await.unwrap(), ResumeState::Fresh);

        save_progress(&path, &Progress::InProgress(pos(3, 4, 10)))
            .await
            .unwrap();
        assert_eq!(
            resume_state(&path).await.unwrap(),
            ResumeState::Resume(pos(3, 4, 10))
        );

        save_progress(&path, &Progress::Completed).await.unwrap();
        assert_eq!(resume_state(&path).await.unwrap(), ResumeState::Completed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Completed");

        std::fs::write(&path, "not a checkpoint").unwrap();
        assert!(matches!(
            resume_state(&path).await.unwrap(),
            ResumeState::Corrupt(_)
        ));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.txt");

        save_progress(&path, &Progress::InProgress(pos(1, 1, 1)))
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
