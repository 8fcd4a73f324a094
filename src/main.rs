//! Scan Archiver - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use scan_archiver::{
    api::{CatalogClient, ScanClient},
    catalog::{sweep_catalog, SearchResult, BROAD_TERMS, SWEEP_PAUSE, SYLLABLE_TERMS},
    cli::{
        prompts::{
            ask_page_height, ask_pack_title, ask_search_query, ask_split, ask_walk_request,
            select_result,
        },
        Args, Command,
    },
    config::{validate_config, validate_split, Config},
    download::{DownloadState, ResumeState, ScanSource, WalkRequest, Walker},
    error::{exit_codes, Error, Result},
    output::{
        create_item_bar, create_spinner, print_banner, print_config_summary,
        print_download_stats, print_error, print_info, print_pack_summary, print_resume,
        print_search_results, print_success, print_warning,
    },
    postprocess::{pack_title, SplitOptions},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(Error::Aborted) => {
            print_warning("Aborted.");
            ExitCode::from(exit_codes::ABORT as u8)
        }
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Http(_)
                | Error::Network(_)
                | Error::RetriesExhausted { .. }
                | Error::Search(_) => ExitCode::from(exit_codes::NETWORK_ERROR as u8),
                Error::CorruptProgress(_) | Error::InvalidFilename(_) | Error::UrlParse(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                Error::Image(_) | Error::Archive(_) | Error::NoImages(_) => {
                    ExitCode::from(exit_codes::POSTPROCESS_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    print_config_summary(
        &config.scans.scans_directory.display().to_string(),
        &config.pack.output_directory.display().to_string(),
        config.retry.max_attempts,
    );

    match args.command() {
        Command::Download => run_download(&config).await,
        Command::Pack => run_pack(&config),
        Command::Catalog { names, thorough } => run_catalog(&config, names, thorough).await,
    }
}

/// Search, select and download a title.
async fn run_download(config: &Config) -> Result<()> {
    let catalog = CatalogClient::new(config)?;

    let Some(selected) = find_title(&catalog).await? else {
        print_info("Goodbye!");
        return Ok(());
    };
    let title = selected.title;
    print_info(&format!("Selected: {}", title));

    let client = ScanClient::new(config)?;
    let walker = Walker::new(
        &client,
        ScanSource::from_config(config)?,
        &config.scans.scans_directory,
        config.retry_policy(),
    )
    .with_page_delay(config.scans.page_delay_min_ms, config.scans.page_delay_max_ms);

    let request = match walker.resume_state(&title).await? {
        ResumeState::Completed => {
            print_success(&format!(
                "All chapters for {} have already been downloaded.",
                title
            ));
            return Ok(());
        }
        ResumeState::Resume(position) => {
            print_resume(&title, &position);
            WalkRequest::resume(&title, position)
        }
        ResumeState::Fresh => ask_walk_request(&title)?,
        ResumeState::Corrupt(reason) => {
            print_warning(&format!("Progress file is unreadable: {}", reason));
            ask_walk_request(&title)?
        }
    };

    let mut state = DownloadState::new(title.clone());
    let result = walker
        .walk_with_restarts(&request, config.scans.run_retries, &mut state)
        .await;

    print_download_stats(&state);
    result?;

    if state.completed {
        print_success(&format!("All chapters of {} downloaded", title));
    }

    Ok(())
}

/// Loop over search prompts until a title is picked, `None` if the user quits.
async fn find_title(catalog: &CatalogClient) -> Result<Option<SearchResult>> {
    loop {
        let Some(query) = ask_search_query()? else {
            return Ok(None);
        };

        let spinner = create_spinner(&format!("Searching '{}'...", query));
        let results = catalog.search(&query).await;
        spinner.finish_and_clear();

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                print_error(&format!("Search failed: {}", e));
                continue;
            }
        };

        print_search_results(&query, &results);
        if results.is_empty() {
            continue;
        }

        if let Some(index) = select_result(&results)? {
            return Ok(results.into_iter().nth(index));
        }
    }
}

/// Split and pack a downloaded title.
fn run_pack(config: &Config) -> Result<()> {
    let title = ask_pack_title()?;

    let split = if ask_split()? {
        let page_height = ask_page_height(config.pack.page_height)?;
        validate_split(page_height, config.pack.height_threshold)?;
        Some(SplitOptions {
            page_height,
            height_threshold: config.pack.height_threshold,
        })
    } else {
        None
    };

    let bar = create_item_bar("Processing");
    let summary = pack_title(
        &config.scans.scans_directory,
        &config.pack.output_directory,
        &title,
        split.as_ref(),
        config.max_archive_bytes(),
        &bar,
    );
    bar.finish_and_clear();

    let summary = summary?;
    print_pack_summary(&summary);
    print_success(&format!(
        "{} packed into {} archive(s)",
        title,
        summary.archives.len()
    ));

    Ok(())
}

/// Sweep the catalog and print every slug (or name) as JSON.
async fn run_catalog(config: &Config, names: bool, thorough: bool) -> Result<()> {
    let catalog = CatalogClient::new(config)?;
    let catalog = &catalog;

    let mut terms: Vec<&str> = BROAD_TERMS.to_vec();
    if thorough {
        for term in SYLLABLE_TERMS {
            if !terms.contains(term) {
                terms.push(term);
            }
        }
    }

    print_info(&format!("Sweeping the catalog with {} terms", terms.len()));
    let bar = create_item_bar("Sweeping");
    bar.set_length(terms.len() as u64);

    let found = if names {
        sweep_catalog(&terms, SWEEP_PAUSE, &bar, |term| async move {
            catalog.search_names(&term).await
        })
        .await
    } else {
        sweep_catalog(&terms, SWEEP_PAUSE, &bar, |term| async move {
            catalog.search_slugs(&term).await
        })
        .await
    };
    bar.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&found)?);
    print_success(&format!("{} titles found", found.len()));

    Ok(())
}
