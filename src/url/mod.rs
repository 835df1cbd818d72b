//! URL handling module for mangareader-dl
//!
//! This module validates series URLs against the configured source site and
//! derives the series short name used as storage key and folder name.

mod domain;

use crate::{UrlError, UrlResult};
use url::Url;

pub use domain::{extract_domain, same_site};

/// A series (the whole comic) on the source site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Canonical series URL, without trailing slash
    pub url: String,

    /// The single path segment of the URL, e.g. `onepunch-man`
    pub name: String,
}

impl Series {
    /// Parses and validates a series URL
    ///
    /// Leading/trailing slashes and whitespace are stripped first, so
    /// `http://www.mangareader.net/onepunch-man/` is accepted.
    ///
    /// # Errors
    ///
    /// * `UrlError::Parse` - not a URL at all
    /// * `UrlError::ForeignDomain` - host differs from the source site
    /// * `UrlError::SiteRoot` - no path, i.e. the site's main page
    /// * `UrlError::NotASeries` - more than one path segment
    pub fn parse(raw: &str, base: &Url) -> UrlResult<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

        if !same_site(&url, base) {
            return Err(UrlError::ForeignDomain {
                url: trimmed.to_string(),
                expected: base.to_string(),
            });
        }

        let path = url.path().trim_matches('/');
        if path.is_empty() {
            return Err(UrlError::SiteRoot(trimmed.to_string()));
        }

        if path.split('/').count() > 1 {
            return Err(UrlError::NotASeries(trimmed.to_string()));
        }

        Ok(Self {
            url: trimmed.to_string(),
            name: path.to_string(),
        })
    }
}

/// Returns true when `url` addresses exactly one series on the source site
///
/// Failures are logged with the reason.
pub fn validate_series_url(url: &str, base: &Url) -> bool {
    tracing::debug!("Validating URL: {}", url);

    match Series::parse(url, base) {
        Ok(series) => {
            tracing::debug!("URL [{}] is a valid series URL ({})", url, series.name);
            true
        }
        Err(e) => {
            tracing::error!("{}", e);
            false
        }
    }
}
