//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::{is_image_file, natural_cmp, sanitize_path_component};

/// Name of the checkpoint file inside a title folder.
pub const PROGRESS_FILENAME: &str = "progress.txt";

/// Folder holding the downloaded pages of `title`: `{scans_dir}/{title}`.
pub fn title_folder(scans_dir: &Path, title: &str) -> Result<PathBuf> {
    Ok(scans_dir.join(sanitize_path_component(title)?))
}

/// Checkpoint file of a title folder.
pub fn progress_file(title_dir: &Path) -> PathBuf {
    title_dir.join(PROGRESS_FILENAME)
}

/// Temporary folder receiving split images: `{output_dir}/{title}`.
pub fn split_folder(output_dir: &Path, title: &str) -> Result<PathBuf> {
    Ok(output_dir.join(sanitize_path_component(title)?))
}

/// Archive path without extension: `{output_dir}/{title}`.
///
/// Same location as the split folder; archives get a `.cbz` suffix.
pub fn archive_base(output_dir: &Path, title: &str) -> Result<PathBuf> {
    split_folder(output_dir, title)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// List the image files directly inside `dir`, in natural filename order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }

    images.sort_by(|a, b| {
        let a = a.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let b = b.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        natural_cmp(&a, &b)
    });

    Ok(images)
}
