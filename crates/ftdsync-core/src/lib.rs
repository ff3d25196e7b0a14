//! # ftdsync Core
//!
//! Incremental synchronisation of the regulator's twice-monthly fails-to-deliver
//! reports into per-issuer history files and per-publication universe files.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`archive`] | Archive decoding and record staging |
//! | [`config`] | Run configuration and environment overrides |
//! | [`dates`] | `YYYYMMDD` parsing and calendar helpers |
//! | [`discovery`] | Catalog scraping and archive name decoding |
//! | [`domain`] | Distribution, record and row models |
//! | [`error`] | Error types |
//! | [`fetcher`] | Rate-limited, retrying GET requests |
//! | [`http_client`] | HTTP client abstraction |
//! | [`mapping`] | Ticker-to-identifier resolution |
//! | [`orchestrator`] | Run orchestration and reporting |
//! | [`parser`] | Raw report line parsing |
//! | [`registry`] | Concurrent pending-line registry |
//! | [`retry`] | Retry policy |
//! | [`store`] | Incremental flat-file stores |
//! | [`throttling`] | Global request rate limiting |
//! | [`ticker`] | Ticker normalization |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ftdsync_core::{MapFileMapper, Orchestrator, ReqwestHttpClient, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::from_env();
//!     let mapper = MapFileMapper::load(&config.map_file_dir)?;
//!     let orchestrator = Orchestrator::new(
//!         config,
//!         Arc::new(ReqwestHttpClient::new()),
//!         Arc::new(mapper),
//!     )?;
//!
//!     let report = orchestrator.run().await?;
//!     println!("success: {}", report.success);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Orchestrator   │────▶│ Discoverer       │
//! └────────┬────────┘     └────────┬─────────┘
//!          │ task per distribution │
//!          ▼                       ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ ArchiveProcessor│     │ RateLimitedFetcher│──▶ HttpClient
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PendingLines    │────▶│ FlatFileStore    │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod archive;
pub mod config;
pub mod dates;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod mapping;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod retry;
pub mod store;
pub mod throttling;
pub mod ticker;

pub use archive::{ArchiveProcessor, ArchiveSummary};
pub use config::SyncConfig;
pub use discovery::Discoverer;
pub use domain::{CanonicalSymbol, DistributionDescriptor, Half, RawRecord};
pub use error::{ConfigError, FetchError, LineReject, MappingError, SyncError, TickerReject};
pub use fetcher::RateLimitedFetcher;
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use mapping::{MapFileMapper, SymbolMapper};
pub use orchestrator::{DistributionReport, DistributionStatus, Orchestrator, RunReport};
pub use registry::PendingLines;
pub use retry::{Backoff, RetryConfig};
pub use store::{FlatFileStore, FlushReport, WriteMode, WriteOutcome};
pub use throttling::RequestThrottle;
