//! Extraction of search results from the catalog's HTML fragments.
//!
//! The search endpoint answers with a list of anchor cards:
//! `<a href="{url}"> ... <h3>{title}</h3> ... <p class="text-xs truncate
//! opacity-70 italic mt-1">{description}</p> ... </a>`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;

static CARD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<a[^>]+href="([^"]+)"[^>]*>.*?<h3[^>]*>(.*?)</h3>.*?<p class="text-xs truncate opacity-70 italic mt-1">(.*?)</p>.*?</a>"#,
    )
    .expect("card pattern is valid")
});

static DESCRIPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<p class="text-xs truncate opacity-70 italic mt-1">(.*?)</p>"#)
        .expect("description pattern is valid")
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// One catalog entry returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl SearchResult {
    /// URL-safe identifier of the entry: the last segment of its link.
    pub fn slug(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} ({})", self.title, self.description)
        }
    }
}

/// Extract every complete card from a search response.
pub fn extract_search_results(html: &str) -> Vec<SearchResult> {
    CARD_PATTERN
        .captures_iter(html)
        .map(|caps| SearchResult {
            url: caps[1].trim().to_string(),
            title: clean_text(&caps[2]),
            description: clean_text(&caps[3]),
        })
        .collect()
}

/// Extract the italic subtitle line of every card, skipping empty ones.
pub fn extract_descriptions(html: &str) -> Vec<String> {
    DESCRIPTION_PATTERN
        .captures_iter(html)
        .map(|caps| clean_text(&caps[1]))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract the unique slugs of all links below `catalog_url_prefix`, sorted.
pub fn extract_slugs(html: &str, catalog_url_prefix: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(&format!(
        r#"href="{}([^"]+)""#,
        regex::escape(catalog_url_prefix)
    ))?;

    let slugs: BTreeSet<String> = pattern
        .captures_iter(html)
        .map(|caps| caps[1].trim_end_matches('/').to_string())
        .filter(|slug| !slug.is_empty())
        .collect();

    Ok(slugs.into_iter().collect())
}

/// Strip markup, decode the common entities and trim whitespace.
fn clean_text(fragment: &str) -> String {
    let text = TAG_PATTERN.replace_all(fragment, "");
    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
