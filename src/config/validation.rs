use crate::config::types::{
    Config, PostcodeConfig, ScraperConfig, ServerConfig, SiteConfig, UserAgentConfig,
};
use crate::listings::{page_url, SiteSelectors};
use crate::location::Location;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_postcode_config(&config.postcodes)?;
    validate_sites(&config.sites)?;

    if config.enabled_sites().next().is_none() {
        tracing::warn!("No listing sites are enabled; every search will return zero results");
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = &config.static_dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "static-dir cannot be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 100, got {}",
            config.max_pages
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.search_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "search_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_postcode_config(config: &PostcodeConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "postcodes path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates listing site entries
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }

        validate_search_url(site)?;

        // Compiled again per search; this only proves the selectors parse.
        SiteSelectors::compile(site)?;
    }

    Ok(())
}

/// Validates a site's URL template
///
/// Without `{{pageNo}}` every page would fetch the same document and
/// listings would be counted once per page.
fn validate_search_url(site: &SiteConfig) -> Result<(), ConfigError> {
    if !site.search_url.contains("{{pageNo}}") {
        return Err(ConfigError::Validation(format!(
            "search-url for site '{}' must contain the {{{{pageNo}}}} placeholder",
            site.name
        )));
    }

    let sample = Location {
        suburb: "sample suburb".to_string(),
        state: "nsw".to_string(),
        postcode: "2000".to_string(),
    };
    let url = Url::parse(&page_url(site, &sample, 1)).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid search-url for site '{}': {}",
            site.name, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "search-url for site '{}' must use http or https, got '{}'",
            site.name,
            url.scheme()
        )));
    }

    Ok(())
}
