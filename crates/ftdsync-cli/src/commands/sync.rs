use std::sync::Arc;

use ftdsync_core::{DistributionStatus, MapFileMapper, Orchestrator, ReqwestHttpClient, SyncConfig};

use crate::commands::CommandResult;
use crate::error::CliError;

pub async fn run(config: SyncConfig) -> Result<CommandResult, CliError> {
    config.validate()?;
    let mapper = MapFileMapper::load(&config.map_file_dir)?;
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(mapper),
    )?;

    let report = orchestrator.run().await?;
    let result = CommandResult::ok(serde_json::to_value(&report)?);
    if report.success {
        return Ok(result);
    }

    let failed = report
        .distributions
        .iter()
        .filter(|distribution| distribution.status == DistributionStatus::Failed)
        .count();
    Ok(result.with_failure(CliError::Unsuccessful {
        attempted: report.distributions.len(),
        failed,
    }))
}
