//! Configuration validation logic.

use regex::Regex;
use url::Url;

use crate::config::loader::Config;
use crate::download::WalkRequest;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_url("catalog.home_url", &config.catalog.home_url)?;
    validate_url("catalog.search_url", &config.catalog.search_url)?;
    validate_url("catalog.catalog_url_prefix", &config.catalog.catalog_url_prefix)?;
    validate_url("scans.image_base_url", &config.scans.image_base_url)?;
    validate_image_extension(&config.scans.image_extension)?;

    if config.scans.page_delay_min_ms > config.scans.page_delay_max_ms {
        return Err(Error::ConfigValidation {
            field: "scans.page_delay_min_ms".to_string(),
            message: format!(
                "Minimum delay ({} ms) is greater than maximum delay ({} ms)",
                config.scans.page_delay_min_ms, config.scans.page_delay_max_ms
            ),
        });
    }

    if config.scans.request_timeout_seconds == 0 {
        return Err(Error::ConfigValidation {
            field: "scans.request_timeout_seconds".to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        });
    }

    if config.retry.max_attempts == 0 {
        return Err(Error::ConfigValidation {
            field: "retry.max_attempts".to_string(),
            message: "At least one attempt is required".to_string(),
        });
    }

    validate_split(config.pack.page_height, config.pack.height_threshold)?;

    if config.pack.max_archive_mb == 0 {
        return Err(Error::ConfigValidation {
            field: "pack.max_archive_mb".to_string(),
            message: "Archive size cap must be positive".to_string(),
        });
    }

    Ok(())
}

/// Validate that a configured URL is absolute http(s).
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::ConfigValidation {
        field: field.to_string(),
        message: format!("'{}' is not a valid URL: {}", value, e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!("Unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(())
}

/// Validate the image file extension.
pub fn validate_image_extension(extension: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z0-9]{1,5}$")?;
    if !pattern.is_match(extension) {
        return Err(Error::ConfigValidation {
            field: "scans.image_extension".to_string(),
            message: format!(
                "Extension '{}' must be 1-5 alphanumeric characters without a dot",
                extension
            ),
        });
    }
    Ok(())
}

/// Validate splitting geometry.
pub fn validate_split(page_height: u32, height_threshold: f64) -> Result<()> {
    if page_height == 0 {
        return Err(Error::ConfigValidation {
            field: "pack.page_height".to_string(),
            message: "Page height must be positive".to_string(),
        });
    }

    if !(height_threshold.is_finite() && height_threshold > 0.0) {
        return Err(Error::ConfigValidation {
            field: "pack.height_threshold".to_string(),
            message: format!("Threshold must be a positive number (got {})", height_threshold),
        });
    }

    Ok(())
}

/// Validate the bounds of a download walk.
pub fn validate_walk_request(request: &WalkRequest) -> Result<()> {
    if request.title.trim().is_empty() {
        return Err(Error::ConfigValidation {
            field: "title".to_string(),
            message: "Title cannot be empty".to_string(),
        });
    }

    for (field, value) in [
        ("start_chapter", request.start_chapter),
        ("start_page", request.start_page),
        ("max_chapter", request.max_chapter),
    ] {
        if value == 0 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: "Chapters and pages are numbered from 1".to_string(),
            });
        }
    }

    Ok(())
}
