//! Catalog module.
//!
//! Provides:
//! - Regex extraction of search results, subtitles and slugs
//! - Whole-catalog sweeps over broad search terms

pub mod parser;
pub mod sweep;

pub use parser::{extract_descriptions, extract_search_results, extract_slugs, SearchResult};
pub use sweep::{sweep_catalog, BROAD_TERMS, SWEEP_PAUSE, SYLLABLE_TERMS};
