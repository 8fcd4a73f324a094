//! Statistics reporting.

use console::style;

use crate::download::DownloadState;
use crate::postprocess::PackSummary;

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Print statistics for a download run.
pub fn print_download_stats(state: &DownloadState) {
    let title = state.title.as_deref().unwrap_or("unknown");

    println!();
    println!("{}", style(format!("Statistics for {}:", title)).bold());
    println!("  Pages saved:    {}", state.pages_saved);
    println!("  Already there:  {}", state.pages_present);
    println!("  Chapters done:  {}", state.chapters_completed);
    println!("  Requests:       {}", state.requests);
    println!("  Downloaded:     {:.1} MB", megabytes(state.bytes_saved));
    if state.restarts > 0 {
        println!("  Restarts:       {}", style(state.restarts).yellow());
    }

    if state.skipped_count() > 0 {
        println!(
            "  Skipped pages:  {}",
            style(state.skipped_count()).yellow()
        );
        for gap in &state.skipped {
            println!(
                "    chapter {} page {} ({})",
                gap.chapter, gap.page, gap.status
            );
        }
    }
}

/// Print the outcome of a pack run.
pub fn print_pack_summary(summary: &PackSummary) {
    println!();
    println!("{}", style("═".repeat(50)).dim());

    if let Some(split) = &summary.split {
        println!("{}", style("Splitting:").bold());
        println!("  Images read:  {}", split.images_read);
        println!("  Images split: {}", split.images_split);
        println!("  Pages:        {}", split.pages_written);
        if !split.failed.is_empty() {
            println!("  Failed:       {}", style(split.failed.len()).red());
        }
    }

    println!("{}", style("Archives:").bold());
    for archive in &summary.archives {
        println!(
            "  {} ({} images, {:.1} MB)",
            style(archive.path.display()).green(),
            archive.images,
            megabytes(archive.bytes)
        );
    }
    println!("{}", style("═".repeat(50)).dim());
}
