//! Post-processing of downloaded titles.
//!
//! Handles:
//! - Splitting overly tall images into page-sized slices
//! - Packing image folders into size-capped CBZ archives

pub mod pack;
pub mod split;

use std::path::Path;

use indicatif::ProgressBar;

use crate::error::{Error, Result};
use crate::fs::{archive_base, ensure_dir, split_folder, title_folder};

pub use pack::{create_cbz_archives, plan_batches, PackedArchive};
pub use split::{slice_spans, split_long_images, SplitOptions, SplitReport};

/// Result of packing a title.
#[derive(Debug, Default)]
pub struct PackSummary {
    /// Present when splitting ran.
    pub split: Option<SplitReport>,
    pub archives: Vec<PackedArchive>,
}

/// Pack the downloaded pages of `title` into `output_dir`.
///
/// With `split`, pages go through a temporary `{output_dir}/{title}` folder
/// which is removed once the archives are written. Without it, the title
/// folder is packed as is.
pub fn pack_title(
    scans_dir: &Path,
    output_dir: &Path,
    title: &str,
    split: Option<&SplitOptions>,
    max_archive_bytes: u64,
    progress: &ProgressBar,
) -> Result<PackSummary> {
    let source = title_folder(scans_dir, title)?;
    if !source.is_dir() {
        return Err(Error::NoImages(source));
    }

    ensure_dir(output_dir)?;
    let base = archive_base(output_dir, title)?;

    let Some(options) = split else {
        tracing::info!("Packing {} without splitting", source.display());
        let archives = create_cbz_archives(&source, &base, max_archive_bytes, progress)?;
        return Ok(PackSummary {
            split: None,
            archives,
        });
    };

    let temp = split_folder(output_dir, title)?;
    if temp == source {
        return Err(Error::Config(format!(
            "Output folder {} is the title folder itself",
            temp.display()
        )));
    }

    // Pages left by an interrupted run would end up in the archives
    remove_temp_folder(&temp)?;

    tracing::info!(
        "Splitting {} into {} (page height {}px)",
        source.display(),
        temp.display(),
        options.page_height
    );

    let result = split_long_images(&source, &temp, options, progress).and_then(|report| {
        progress.reset();
        let archives = create_cbz_archives(&temp, &base, max_archive_bytes, progress)?;
        Ok(PackSummary {
            split: Some(report),
            archives,
        })
    });

    let cleanup = remove_temp_folder(&temp);
    let summary = result?;
    cleanup?;

    Ok(summary)
}

fn remove_temp_folder(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!("Removed temporary folder {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
