//! Filename generation and ordering.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{Error, Result};

/// Image extensions picked up by post-processing (lowercase, without dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Sanitize a path component (folder or file name).
///
/// Separators and reserved characters are replaced with underscores, so the
/// result is always a single component. `.`, `..` and empty names are rejected.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    // Reject null bytes
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    // Reject path traversal attempts
    if sanitized == "." || sanitized == ".." {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    Ok(sanitized.to_string())
}

/// Name of a downloaded page: `ch{chapter:03}_p{page:03}.{ext}`.
pub fn page_filename(chapter: u32, page: u32, extension: &str) -> String {
    format!("ch{:03}_p{:03}.{}", chapter, page, extension)
}

/// Name of the `index`-th (1-based) slice of a split image.
///
/// `extension` keeps its leading dot, or is empty.
pub fn slice_filename(stem: &str, index: u32, extension: &str) -> String {
    format!("{}_page{:02}{}", stem, index, extension)
}

/// Name of the `index`-th (1-based) entry inside an archive.
pub fn archive_entry_name(index: usize, extension: &str) -> String {
    format!("{:05}{}", index, extension)
}

/// Name of an archive: `{base}.cbz`, or `{base}_part{NN}.cbz` for multi-part output.
pub fn archive_filename(base: &str, part: Option<usize>) -> String {
    match part {
        Some(part) => format!("{}_part{:02}.cbz", base, part),
        None => format!("{}.cbz", base),
    }
}

/// Extension of `path` with its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Whether `path` has one of the supported image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Compare two names, treating runs of ASCII digits as numbers.
///
/// `ch999_p001` sorts before `ch1000_p001`, which plain byte order gets wrong.
/// Ties between equal numbers with different padding fall back to byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a_rest, mut b_rest) = (a, b);

    loop {
        match (a_rest.chars().next(), b_rest.chars().next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let a_len = a_rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(a_rest.len());
                let b_len = b_rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(b_rest.len());
                let (a_num, b_num) = (&a_rest[..a_len], &b_rest[..b_len]);

                let a_trim = a_num.trim_start_matches('0');
                let b_trim = b_num.trim_start_matches('0');
                let ord = a_trim
                    .len()
                    .cmp(&b_trim.len())
                    .then_with(|| a_trim.cmp(b_trim));
                if ord != Ordering::Equal {
                    return ord;
                }

                a_rest = &a_rest[a_len..];
                b_rest = &b_rest[b_len..];
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                a_rest = &a_rest[ca.len_utf8()..];
                b_rest = &b_rest[cb.len_utf8()..];
            }
        }
    }
}
