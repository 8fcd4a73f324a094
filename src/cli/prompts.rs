//! Interactive prompts for per-run values.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::catalog::SearchResult;
use crate::download::WalkRequest;
use crate::error::Result;

/// Words ending the search loop.
const QUIT_WORDS: &[&str] = &["q", "quit", "exit"];

/// Whether `input` asks to leave the search loop.
pub fn is_quit(input: &str) -> bool {
    QUIT_WORDS.contains(&input.trim().to_lowercase().as_str())
}

/// Ask for a search term, `None` when the user quits.
pub fn ask_search_query() -> Result<Option<String>> {
    let query: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Search a title (q to quit)")
        .interact_text()?;

    if is_quit(&query) {
        return Ok(None);
    }

    Ok(Some(query.trim().to_string()))
}

/// Pick one search result, `None` when the selection is cancelled.
pub fn select_result(results: &[SearchResult]) -> Result<Option<usize>> {
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a title")
        .items(results)
        .default(0)
        .interact_opt()?;

    Ok(selection)
}

fn ask_number(prompt: &str, default: Option<u32>) -> Result<u32> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<u32>::with_theme(&theme).with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default);
    }

    let value = input
        .validate_with(|value: &u32| -> std::result::Result<(), &str> {
            if *value >= 1 {
                Ok(())
            } else {
                Err("must be at least 1")
            }
        })
        .interact_text()?;

    Ok(value)
}

/// Ask for the start position and last chapter of a fresh download.
pub fn ask_walk_request(title: &str) -> Result<WalkRequest> {
    let start_chapter = ask_number("Start chapter", Some(1))?;
    let start_page = ask_number("Start page", Some(1))?;
    let max_chapter = ask_number("Last chapter", None)?;

    Ok(WalkRequest {
        title: title.to_string(),
        start_chapter,
        start_page,
        max_chapter,
    })
}

/// Ask which downloaded title to pack.
pub fn ask_pack_title() -> Result<String> {
    let title: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Title folder to pack")
        .validate_with(|value: &String| -> std::result::Result<(), &str> {
            if value.trim().is_empty() {
                Err("title cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(title.trim().to_string())
}

/// Ask whether tall images should be split before packing.
pub fn ask_split() -> Result<bool> {
    let split = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Split tall images into pages?")
        .default(true)
        .interact()?;

    Ok(split)
}

/// Ask for the target page height in pixels.
pub fn ask_page_height(default: u32) -> Result<u32> {
    ask_number("Page height (px)", Some(default))
}
