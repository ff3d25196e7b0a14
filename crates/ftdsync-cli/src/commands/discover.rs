use std::sync::Arc;

use ftdsync_core::dates::format_yyyymmdd;
use ftdsync_core::{Discoverer, DistributionDescriptor, ReqwestHttpClient, SyncConfig};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct DiscoveredDistribution {
    title: String,
    publication_date: String,
    coverage_start: String,
    coverage_end: String,
    archive_url: String,
}

impl From<DistributionDescriptor> for DiscoveredDistribution {
    fn from(distribution: DistributionDescriptor) -> Self {
        Self {
            publication_date: format_yyyymmdd(distribution.publication_date),
            coverage_start: format_yyyymmdd(distribution.coverage_start),
            coverage_end: format_yyyymmdd(distribution.coverage_end),
            title: distribution.title,
            archive_url: distribution.archive_url,
        }
    }
}

pub async fn run(config: SyncConfig) -> Result<CommandResult, CliError> {
    config.validate()?;
    let discoverer = Discoverer::new(
        config.fetcher(Arc::new(ReqwestHttpClient::new())),
        config.catalog_url.clone(),
        config.archive_marker.clone(),
        config.archive_host.clone(),
    );

    let distributions: Vec<DiscoveredDistribution> = discoverer
        .discover()
        .await?
        .into_iter()
        .map(DiscoveredDistribution::from)
        .collect();
    Ok(CommandResult::ok(serde_json::to_value(distributions)?))
}
