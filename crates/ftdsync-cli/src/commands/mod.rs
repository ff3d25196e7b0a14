mod discover;
mod sync;

use std::time::Duration;

use ftdsync_core::SyncConfig;
use serde_json::Value;

use crate::cli::{Cli, Command, FetchArgs, SyncArgs};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    /// Reported after `data` has been written.
    pub failure: Option<CliError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            failure: None,
        }
    }

    pub fn with_failure(mut self, failure: CliError) -> Self {
        self.failure = Some(failure);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Sync(args) => sync::run(sync_config(SyncConfig::from_env(), args)).await,
        Command::Discover(args) => {
            discover::run(fetch_config(SyncConfig::from_env(), args)).await
        }
    }
}

/// Applies fetch flags over `config`; flags win over environment and defaults.
fn fetch_config(mut config: SyncConfig, args: &FetchArgs) -> SyncConfig {
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }
    if let Some(rate_limit) = args.rate_limit {
        config.requests_per_second = rate_limit;
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(timeout_secs);
    }
    config
}

fn sync_config(config: SyncConfig, args: &SyncArgs) -> SyncConfig {
    let mut config = fetch_config(config, &args.fetch);
    if let Some(destination) = &args.destination {
        config.destination = destination.clone();
    }
    if let Some(map_files) = &args.map_files {
        config.map_file_dir = map_files.clone();
    }
    if args.no_skip_processed {
        config.skip_processed = false;
    }
    config
}
