//! Distribution discovery from the regulator's catalog page.
//!
//! The catalog is scanned for a fixed archive URL prefix rather than parsed as
//! HTML; every match up to the next `"` is a candidate archive link. Candidate
//! file names must look like `cnsfailsYYYYMMa` / `cnsfailsYYYYMMb`.

use std::collections::BTreeMap;

use reqwest::Url;
use time::Month;
use tracing::{info, warn};

use crate::domain::{DistributionDescriptor, Half};
use crate::error::{FetchError, SyncError};
use crate::fetcher::RateLimitedFetcher;

pub const ARCHIVE_NAME_PREFIX: &str = "cnsfails";

/// Collects every run of text starting at `marker` (matched case-insensitively)
/// and ending before the next `"`, deduplicated case-insensitively.
///
/// Links are returned sorted by their lowercased form; the first spelling seen wins.
pub fn scrape_links(text: &str, marker: &str) -> Vec<String> {
    let marker = marker.to_ascii_lowercase();
    if marker.is_empty() {
        return Vec::new();
    }

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let mut links = BTreeMap::new();
    let mut cursor = 0;

    while let Some(found) = lowered[cursor..].find(&marker) {
        let start = cursor + found;
        let Some(length) = text[start..].find('"') else {
            break;
        };
        let end = start + length;
        links
            .entry(lowered[start..end].to_owned())
            .or_insert_with(|| text[start..end].to_owned());
        cursor = end;
    }

    links.into_values().collect()
}

/// Makes a catalog link absolute against `host`.
pub fn normalize_link(link: &str, host: &str) -> String {
    let link = link.trim();
    if link.to_ascii_lowercase().starts_with("http") {
        return link.to_owned();
    }

    let host = host.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{host}{link}")
    } else {
        format!("{host}/{link}")
    }
}

/// File name of a URL's last path segment, without its extension.
pub fn file_stem(url: &str) -> Option<String> {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_owned())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or(url).to_owned());

    let name = path.rsplit('/').next()?;
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    };
    (!stem.is_empty()).then(|| stem.to_owned())
}

/// Decodes `cnsfails` + `YYYY` + `MM` + `a|b` into its `(year, month, half)` triple.
pub fn parse_archive_name(stem: &str) -> Option<(i32, Month, Half)> {
    let name = stem.trim().to_ascii_lowercase();
    let token = name.strip_prefix(ARCHIVE_NAME_PREFIX)?;
    if token.len() != 7 || !token.is_ascii() {
        return None;
    }

    let (digits, half) = token.split_at(6);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = digits[0..4].parse().ok()?;
    let month = Month::try_from(digits[4..6].parse::<u8>().ok()?).ok()?;
    let half = Half::from_letter(half.chars().next()?)?;

    Some((year, month, half))
}

/// Turns catalog page text into distribution descriptors sorted by publication date.
pub fn distributions_from_catalog(text: &str, marker: &str, host: &str) -> Vec<DistributionDescriptor> {
    let mut distributions: Vec<DistributionDescriptor> = scrape_links(text, marker)
        .into_iter()
        .filter_map(|link| {
            let url = normalize_link(&link, host);
            let (year, month, half) = parse_archive_name(&file_stem(&url)?)?;
            DistributionDescriptor::new(url, year, month, half)
        })
        .collect();

    distributions.sort_by(|left, right| {
        left.publication_date
            .cmp(&right.publication_date)
            .then_with(|| left.archive_url.cmp(&right.archive_url))
    });
    distributions
}

/// Scrapes the catalog page for archive links.
#[derive(Clone)]
pub struct Discoverer {
    fetcher: RateLimitedFetcher,
    catalog_url: String,
    marker: String,
    host: String,
}

impl Discoverer {
    pub fn new(
        fetcher: RateLimitedFetcher,
        catalog_url: impl Into<String>,
        marker: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            catalog_url: catalog_url.into(),
            marker: marker.into(),
            host: host.into(),
        }
    }

    /// Lists distributions in ascending publication order.
    ///
    /// An empty or temporarily unreachable catalog yields an empty list; only a
    /// catalog URL that cannot be requested at all is an error.
    pub async fn discover(&self) -> Result<Vec<DistributionDescriptor>, SyncError> {
        let text = match self.fetcher.get_text(&self.catalog_url).await {
            Ok(text) => text,
            Err(FetchError::Unsendable { message, .. }) => {
                return Err(SyncError::DiscoveryUnavailable { reason: message });
            }
            Err(error) => {
                warn!(error = %error, "catalog unavailable");
                return Ok(Vec::new());
            }
        };

        if text.trim().is_empty() {
            warn!(url = %self.catalog_url, "catalog page is empty");
            return Ok(Vec::new());
        }

        let distributions = distributions_from_catalog(&text, &self.marker, &self.host);
        info!(count = distributions.len(), "discovered distributions");
        Ok(distributions)
    }
}
