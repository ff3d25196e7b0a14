//! Run orchestration.
//!
//! ```text
//! precondition ─▶ discover ─▶ filter ─▶ one task per distribution ─▶ flush
//!                                        fetch ─▶ process (blocking)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use time::{Date, OffsetDateTime};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::archive::{ArchiveProcessor, ArchiveSummary};
use crate::config::SyncConfig;
use crate::dates::format_yyyymmdd;
use crate::discovery::Discoverer;
use crate::domain::DistributionDescriptor;
use crate::error::SyncError;
use crate::fetcher::RateLimitedFetcher;
use crate::http_client::HttpClient;
use crate::mapping::SymbolMapper;
use crate::registry::PendingLines;
use crate::store::FlatFileStore;

/// Outcome of one distribution task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    /// At least one record was staged.
    Processed,
    /// The archive decoded but no record survived.
    Empty,
    /// The archive does not exist upstream.
    NotFound,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
    pub title: String,
    pub publication_date: String,
    pub archive_url: String,
    pub status: DistributionStatus,
    #[serde(flatten)]
    pub summary: ArchiveSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DistributionReport {
    fn new(distribution: &DistributionDescriptor, status: DistributionStatus) -> Self {
        Self {
            title: distribution.title.clone(),
            publication_date: distribution.publication_key(),
            archive_url: distribution.archive_url.clone(),
            status,
            summary: ArchiveSummary::default(),
            error: None,
        }
    }

    fn failed(distribution: &DistributionDescriptor, error: &SyncError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(distribution, DistributionStatus::Failed)
        }
    }
}

/// Summary of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub as_of: String,
    pub discovered: usize,
    pub skipped_future: usize,
    pub skipped_processed: usize,
    pub distributions: Vec<DistributionReport>,
    pub issuers_flushed: usize,
    pub flush_failures: Vec<String>,
    /// True when at least one distribution contributed a record in this run.
    pub success: bool,
}

/// Drives discovery, per-distribution tasks and the final flush.
pub struct Orchestrator {
    config: SyncConfig,
    fetcher: RateLimitedFetcher,
    mapper: Arc<dyn SymbolMapper>,
}

impl Orchestrator {
    /// Validates `config` and builds the shared fetcher over `client`.
    pub fn new(
        config: SyncConfig,
        client: Arc<dyn HttpClient>,
        mapper: Arc<dyn SymbolMapper>,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        let fetcher = config.fetcher(client);
        Ok(Self {
            config,
            fetcher,
            mapper,
        })
    }

    pub fn discoverer(&self) -> Discoverer {
        Discoverer::new(
            self.fetcher.clone(),
            self.config.catalog_url.clone(),
            self.config.archive_marker.clone(),
            self.config.archive_host.clone(),
        )
    }

    pub async fn run(&self) -> Result<RunReport, SyncError> {
        self.run_as_of(OffsetDateTime::now_utc().date()).await
    }

    /// Runs the pipeline treating `today` as "now" for the future-date filter.
    pub async fn run_as_of(&self, today: Date) -> Result<RunReport, SyncError> {
        let run_id = Uuid::new_v4();
        self.execute(run_id, today)
            .instrument(info_span!("sync", %run_id))
            .await
    }

    async fn execute(&self, run_id: Uuid, today: Date) -> Result<RunReport, SyncError> {
        if !self.mapper.is_available() {
            return Err(SyncError::MissingPrerequisite {
                path: self.config.map_file_dir.clone(),
            });
        }

        let discovered = self.discoverer().discover().await?;
        let mut report = RunReport {
            run_id,
            as_of: format_yyyymmdd(today),
            discovered: discovered.len(),
            skipped_future: 0,
            skipped_processed: 0,
            distributions: Vec::new(),
            issuers_flushed: 0,
            flush_failures: Vec::new(),
            success: false,
        };

        let store = FlatFileStore::open(&self.config.destination, self.config.skip_processed)?;
        let mut pending_distributions = Vec::new();
        for distribution in discovered {
            if distribution.publication_date > today {
                debug!(title = %distribution.title, "not yet published");
                report.skipped_future += 1;
            } else if self.config.skip_processed && store.has_universe(distribution.publication_date) {
                debug!(title = %distribution.title, "already processed");
                report.skipped_processed += 1;
            } else {
                pending_distributions.push(distribution);
            }
        }

        let pending = Arc::new(PendingLines::new());
        let processor = ArchiveProcessor::new(Arc::clone(&self.mapper), store.clone(), Arc::clone(&pending));
        report.distributions = self.dispatch(pending_distributions, processor).await;

        let flush = {
            let store = store.clone();
            let pending = Arc::clone(&pending);
            tokio::task::spawn_blocking(move || store.flush(&pending))
                .await
                .map_err(|err| SyncError::Task(err.to_string()))?
        };
        report.issuers_flushed = flush.issuers_written;
        report.flush_failures = flush
            .failures
            .into_iter()
            .map(|(issuer, reason)| format!("{issuer}: {reason}"))
            .collect();

        report.success = report
            .distributions
            .iter()
            .any(|distribution| distribution.status == DistributionStatus::Processed);
        info!(
            success = report.success,
            processed = report
                .distributions
                .iter()
                .filter(|distribution| distribution.status == DistributionStatus::Processed)
                .count(),
            issuers = report.issuers_flushed,
            "sync finished"
        );
        Ok(report)
    }

    /// Runs one task per distribution and waits for all of them.
    async fn dispatch(
        &self,
        distributions: Vec<DistributionDescriptor>,
        processor: ArchiveProcessor,
    ) -> Vec<DistributionReport> {
        let mut outstanding: BTreeMap<String, DistributionDescriptor> = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for distribution in distributions {
            outstanding.insert(distribution.archive_url.clone(), distribution.clone());
            let fetcher = self.fetcher.clone();
            let processor = processor.clone();
            tasks.spawn(
                sync_distribution(fetcher, processor, distribution).in_current_span(),
            );
        }

        let mut reports = Vec::with_capacity(outstanding.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    outstanding.remove(&report.archive_url);
                    reports.push(report);
                }
                Err(err) => error!(error = %err, "distribution task aborted"),
            }
        }
        let aborted = SyncError::Task(String::from("task aborted"));
        reports.extend(
            outstanding
                .values()
                .map(|distribution| DistributionReport::failed(distribution, &aborted)),
        );

        reports.sort_by(|left, right| {
            left.publication_date
                .cmp(&right.publication_date)
                .then_with(|| left.archive_url.cmp(&right.archive_url))
        });
        reports
    }
}

/// Fetch then process one distribution; every failure ends up in the report.
async fn sync_distribution(
    fetcher: RateLimitedFetcher,
    processor: ArchiveProcessor,
    distribution: DistributionDescriptor,
) -> DistributionReport {
    let bytes = match fetcher.get_bytes(&distribution.archive_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = SyncError::from(err);
            error!(title = %distribution.title, error = %err, "distribution failed");
            return DistributionReport::failed(&distribution, &err);
        }
    };
    if bytes.is_empty() {
        info!(title = %distribution.title, "distribution not found");
        return DistributionReport::new(&distribution, DistributionStatus::NotFound);
    }

    let task_distribution = distribution.clone();
    let outcome = tokio::task::spawn_blocking(move || processor.process(&task_distribution, &bytes))
        .await
        .map_err(|err| SyncError::Task(err.to_string()))
        .and_then(|result| result);

    match outcome {
        Ok(summary) => {
            info!(
                title = %distribution.title,
                publication_date = %distribution.publication_key(),
                lines = summary.lines_read,
                kept = summary.kept,
                skipped = summary.skipped,
                unmapped = summary.unmapped,
                "distribution processed"
            );
            let status = if summary.processed() {
                DistributionStatus::Processed
            } else {
                DistributionStatus::Empty
            };
            DistributionReport {
                summary,
                ..DistributionReport::new(&distribution, status)
            }
        }
        Err(err) => {
            error!(title = %distribution.title, error = %err, "distribution failed");
            DistributionReport::failed(&distribution, &err)
        }
    }
}
