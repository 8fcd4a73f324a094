//! Console output utilities.

use console::style;

use crate::catalog::SearchResult;
use crate::download::Position;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Scan Archiver                                     ║
║     Manga scan downloader and CBZ packer              ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(scans_dir: &str, output_dir: &str, max_attempts: u32) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Scans:   {}", scans_dir);
    println!("  Output:  {}", output_dir);
    println!("  Retries: {} attempts per page", max_attempts);
    println!();
}

/// Print the results of a search.
pub fn print_search_results(query: &str, results: &[SearchResult]) {
    if results.is_empty() {
        print_warning(&format!("No results for '{}'", query));
        return;
    }

    println!();
    println!(
        "{}",
        style(format!("{} result(s) for '{}':", results.len(), query)).bold()
    );
    for result in results {
        println!(
            "  {} {}",
            style(&result.title).green(),
            style(format!("[{}]", result.slug())).dim()
        );
        if !result.description.is_empty() {
            println!("      {}", style(&result.description).italic());
        }
    }
    println!();
}

/// Print where a download resumes from.
pub fn print_resume(title: &str, position: &Position) {
    print_info(&format!(
        "Resuming {} at chapter {} page {} (up to chapter {}, {:.2}%)",
        title,
        position.chapter,
        position.page,
        position.max_chapter,
        position.percent()
    ));
}
