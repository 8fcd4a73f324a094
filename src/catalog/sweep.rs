//! Whole-catalog enumeration through many broad searches.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::time::sleep;

use crate::error::Result;

/// Broad terms that together cover most of the catalog.
pub const BROAD_TERMS: &[&str] = &[
    "", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
    "s", "t", "u", "v", "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    "the", "no", "de", "la", "le", "ni", "ga", "wa", "wo", "to", "anime", "manga", "san", "kun",
    "chan", "sama",
];

/// Frequent two-letter and syllable combinations for a more thorough sweep.
pub const SYLLABLE_TERMS: &[&str] = &[
    "an", "ar", "at", "er", "he", "in", "it", "on", "or", "re", "st", "th", "no", "ni", "na", "ne",
    "ga", "go", "ka", "ki", "ku", "ko", "ma", "mi", "mu", "mo", "sa", "shi", "su", "so", "ta",
    "te", "to", "wa", "wo", "ya", "yu", "yo", "ra", "ri", "ru", "ro",
];

/// Pause between two sweep requests.
pub const SWEEP_PAUSE: Duration = Duration::from_millis(100);

/// Run `search` for every term and return the sorted union of all results.
///
/// A failing term is logged and skipped.
pub async fn sweep_catalog<F, Fut>(
    terms: &[&str],
    pause: Duration,
    progress: &ProgressBar,
    mut search: F,
) -> Vec<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<String>>>,
{
    let mut all = BTreeSet::new();

    for (i, term) in terms.iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            sleep(pause).await;
        }

        progress.set_message(format!("Searching '{}'", term));
        match search(term.to_string()).await {
            Ok(found) => {
                let before = all.len();
                all.extend(found);
                tracing::debug!("'{}': {} new results", term, all.len() - before);
            }
            Err(e) => tracing::warn!("Search for '{}' failed: {}", term, e),
        }
        progress.inc(1);
    }

    all.into_iter().collect()
}
