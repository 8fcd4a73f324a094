//! Splitting of overly tall images into page-sized slices.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use indicatif::ProgressBar;

use crate::error::Result;
use crate::fs::{dotted_extension, ensure_dir, list_images, slice_filename};

/// JPEG quality used when re-encoding pages.
const JPEG_QUALITY: u8 = 95;

/// Splitting geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    /// Target page height in pixels.
    pub page_height: u32,
    /// Images taller than `page_height * height_threshold` are split.
    pub height_threshold: f64,
}

impl SplitOptions {
    pub fn needs_split(&self, height: u32) -> bool {
        f64::from(height) > f64::from(self.page_height) * self.height_threshold
    }
}

/// Outcome of a splitting pass.
#[derive(Debug, Default)]
pub struct SplitReport {
    pub images_read: usize,
    pub images_split: usize,
    pub pages_written: usize,
    /// Files that could not be decoded or written.
    pub failed: Vec<PathBuf>,
}

/// `(top, height)` of each slice of an image `height` pixels tall.
///
/// Slices are `page_height` tall except the last, which takes the remainder.
pub fn slice_spans(height: u32, page_height: u32) -> Vec<(u32, u32)> {
    if page_height == 0 {
        return vec![(0, height)];
    }

    (0..height.div_ceil(page_height))
        .map(|i| {
            let top = i * page_height;
            (top, page_height.min(height - top))
        })
        .collect()
}

/// Split every tall image of `input_dir` into `output_dir`; other images are
/// re-saved there unchanged.
///
/// A file that fails is logged and skipped.
pub fn split_long_images(
    input_dir: &Path,
    output_dir: &Path,
    options: &SplitOptions,
    progress: &ProgressBar,
) -> Result<SplitReport> {
    ensure_dir(output_dir)?;

    let images = list_images(input_dir)?;
    progress.set_length(images.len() as u64);

    let mut report = SplitReport::default();

    for path in images {
        match split_one(&path, output_dir, options) {
            Ok(pages) => {
                report.images_read += 1;
                report.pages_written += pages;
                if pages > 1 {
                    report.images_split += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to process {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
        progress.inc(1);
    }

    tracing::info!(
        "Split {} of {} images into {} pages",
        report.images_split,
        report.images_read,
        report.pages_written
    );

    Ok(report)
}

/// Process one image, returning the number of files written.
fn split_one(path: &Path, output_dir: &Path, options: &SplitOptions) -> Result<usize> {
    let img = image::open(path)?;
    let (width, height) = (img.width(), img.height());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !options.needs_split(height) {
        tracing::debug!("{} - height {}px - OK (copy)", name, height);
        save_image(&img, &output_dir.join(&name))?;
        return Ok(1);
    }

    let spans = slice_spans(height, options.page_height);
    tracing::debug!(
        "{} - height {}px - splitting into {} pages",
        name,
        height,
        spans.len()
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = dotted_extension(path);

    for (i, (top, slice_height)) in spans.iter().enumerate() {
        let slice = img.crop_imm(0, *top, width, *slice_height);
        let target = output_dir.join(slice_filename(&stem, i as u32 + 1, &extension));
        save_image(&slice, &target)?;
    }

    Ok(spans.len())
}

/// Save an image in the format implied by its extension.
fn save_image(img: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)?;

    if format == ImageFormat::Jpeg {
        let mut writer = BufWriter::new(File::create(path)?);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        img.to_rgb8().write_with_encoder(encoder)?;
        writer.flush()?;
    } else {
        img.save_with_format(path, format)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save(dir.join(name))
            .unwrap();
    }

    fn height_of(path: &Path) -> u32 {
        image::open(path).unwrap().height()
    }

    #[test]
    fn test_slice_spans_exact_multiple() {
        let spans = slice_spans(300, 100);
        assert_eq!(spans, vec![(0, 100), (100, 100), (200, 100)]);
    }

    #[test]
    fn test_slice_spans_remainder() {
        let spans = slice_spans(250, 100);
        assert_eq!(spans, vec![(0, 100), (100, 100), (200, 50)]);
        assert_eq!(spans.iter().map(|(_, h)| h).sum::<u32>(), 250);
    }

    #[test]
    fn test_threshold_is_strict() {
        let options = SplitOptions {
            page_height: 100,
            height_threshold: 1.2,
        };
        assert!(!options.needs_split(120));
        assert!(options.needs_split(121));
    }

    #[test]
    fn test_three_page_image_yields_three_slices() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_png(input.path(), "ch001_p001.png", 20, 300);

        let options = SplitOptions {
            page_height: 100,
            height_threshold: 1.0,
        };
        let report =
            split_long_images(input.path(), output.path(), &options, &ProgressBar::hidden())
                .unwrap();

        assert_eq!(report.images_split, 1);
        assert_eq!(report.pages_written, 3);

        let heights: Vec<u32> = (1..=3)
            .map(|i| height_of(&output.path().join(format!("ch001_p001_page{:02}.png", i))))
            .collect();
        assert_eq!(heights.iter().sum::<u32>(), 300);
        assert!(heights[2] <= 100);
    }

    #[test]
    fn test_short_images_are_copied_and_broken_ones_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_png(input.path(), "ch001_p001.png", 20, 110);
        std::fs::write(input.path().join("ch001_p002.jpg"), b"not an image").unwrap();
        std::fs::write(input.path().join("progress.txt"), b"Completed").unwrap();

        let options = SplitOptions {
            page_height: 100,
            height_threshold: 1.2,
        };
        let report =
            split_long_images(input.path(), output.path(), &options, &ProgressBar::hidden())
                .unwrap();

        assert_eq!(report.images_read, 1);
        assert_eq!(report.images_split, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(height_of(&output.path().join("ch001_p001.png")), 110);
        assert!(!output.path().join("progress.txt").exists());
    }

    #[test]
    fn test_jpeg_slices_keep_extension() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(16, 250, Rgb([10, 20, 30]))
            .save(input.path().join("long.jpg"))
            .unwrap();

        let options = SplitOptions {
            page_height: 100,
            height_threshold: 1.5,
        };
        split_long_images(input.path(), output.path(), &options, &ProgressBar::hidden()).unwrap();

        assert_eq!(height_of(&output.path().join("long_page01.jpg")), 100);
        assert_eq!(height_of(&output.path().join("long_page03.jpg")), 50);
        assert!(!output.path().join("long_page04.jpg").exists());
    }
}
