//! CBZ packing with a per-archive size cap.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::fs::{archive_entry_name, archive_filename, dotted_extension, list_images};

/// An archive written by [`create_cbz_archives`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArchive {
    pub path: PathBuf,
    pub images: usize,
    /// Summed size of the packed images.
    pub bytes: u64,
}

/// Group consecutive items into batches whose summed size stays within `cap`.
///
/// A new batch starts when the next item would push the current one over the
/// cap and the current one is not empty. An item larger than the cap ends up
/// alone in its own batch.
pub fn plan_batches(sizes: &[u64], cap: u64) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut current = 0u64;

    for (i, &size) in sizes.iter().enumerate() {
        if i > start && current.saturating_add(size) > cap {
            batches.push(start..i);
            start = i;
            current = 0;
        }
        current = current.saturating_add(size);
    }

    if start < sizes.len() {
        batches.push(start..sizes.len());
    }

    batches
}

/// Path of an archive next to `base`: `{base}.cbz` or `{base}_partNN.cbz`.
fn archive_path(base: &Path, part: Option<usize>) -> PathBuf {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(archive_filename(&name, part))
}

/// Pack the images of `images_dir` into CBZ archives of at most
/// `max_archive_bytes` each.
///
/// Images are taken in natural filename order. A single archive is named
/// `{base}.cbz`; otherwise parts are numbered from 1. Entries are renamed
/// `00001.ext`, `00002.ext`... inside each archive and stored uncompressed.
pub fn create_cbz_archives(
    images_dir: &Path,
    base: &Path,
    max_archive_bytes: u64,
    progress: &ProgressBar,
) -> Result<Vec<PackedArchive>> {
    let images = list_images(images_dir)?;
    if images.is_empty() {
        return Err(Error::NoImages(images_dir.to_path_buf()));
    }

    let sizes = images
        .iter()
        .map(|p| Ok(std::fs::metadata(p)?.len()))
        .collect::<Result<Vec<u64>>>()?;

    let batches = plan_batches(&sizes, max_archive_bytes);
    let multi_part = batches.len() > 1;

    progress.set_length(images.len() as u64);

    let mut archives = Vec::with_capacity(batches.len());
    for (i, batch) in batches.into_iter().enumerate() {
        let path = archive_path(base, multi_part.then_some(i + 1));
        let bytes: u64 = sizes[batch.clone()].iter().sum();

        write_cbz(&path, &images[batch.clone()], progress)?;
        tracing::info!(
            "Created {} ({} images, {:.1} MB)",
            path.display(),
            batch.len(),
            bytes as f64 / (1024.0 * 1024.0)
        );

        archives.push(PackedArchive {
            path,
            images: batch.len(),
            bytes,
        });
    }

    Ok(archives)
}

fn write_cbz(path: &Path, images: &[PathBuf], progress: &ProgressBar) -> Result<()> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(path)?));

    for (i, image) in images.iter().enumerate() {
        let size = std::fs::metadata(image)?.len();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(size >= u64::from(u32::MAX));

        zip.start_file(archive_entry_name(i + 1, &dotted_extension(image)), options)?;
        let mut source = File::open(image)?;
        io::copy(&mut source, &mut zip)?;
        progress.inc(1);
    }

    zip.finish()?.flush()?;
    Ok(())
}
