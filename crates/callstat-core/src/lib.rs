//! # callstat core
//!
//! Collects call-detail statistics from a telephony API that builds reports
//! asynchronously: a signed report request yields a job key, the job is
//! polled until it completes, and the rows come back one page at a time.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`params`] | Filtering and type-checking of candidate parameters |
//! | [`query`] | Validated [`StatisticsQuery`] and its builder |
//! | [`signer`] | Canonical JSON and SHA-256 request signatures |
//! | [`api`] | Job submission and result fetching |
//! | [`poller`] | Job polling state machine |
//! | [`pagination`] | Page accumulation and the caller-facing result |
//! | [`recovery`] | Transport failure policy |
//! | [`collector`] | [`CallStatsClient`], wiring all of the above |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`retry`] | Poll delays and cooldown |
//!
//! ## Flow
//!
//! ```text
//! StatisticsQuery ──▶ filter ──▶ sign ──▶ create job ──▶ poll ──▶ accumulate
//!                                   ▲                              │
//!                                   └──────── next offset ─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use callstat_core::{CallStatsClient, ClientConfig, Credentials, PageSize, StatisticsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CallStatsClient::with_reqwest(
//!         Credentials::new("api-key", "api-salt"),
//!         ClientConfig::new("https://api.example.com/"),
//!     );
//!
//!     let query = StatisticsQuery::builder("01.01.2024 00:00:00", "31.01.2024 23:59:59")
//!         .limit(PageSize::Thousand)
//!         .build()?;
//!
//!     let stats = client.collect(&query).await?;
//!     println!("{} calls, columns: {:?}", stats.rows.len(), stats.columns());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod pagination;
pub mod params;
pub mod poller;
pub mod query;
pub mod recovery;
pub mod retry;
pub mod signer;

pub use api::StatsApi;
pub use collector::CallStatsClient;
pub use config::{ClientConfig, Endpoints, SUCCESS_RESULT_CODE};
pub use error::{ParamKind, ProtocolError, QueryRule, StatsError, TransportFailure, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use model::{CallRecord, JobHandle, PageSummary, ResultPage, ResultResponse};
pub use pagination::{Accumulator, CollectedStatistics, Completion, PageDecision};
pub use params::{filter_params, ParamMap};
pub use poller::{PollOutcome, PollState, Poller};
pub use query::{PageSize, QueryDate, StatisticsQuery, StatisticsQueryBuilder};
pub use recovery::{Recovery, RecoveryPolicy};
pub use retry::PollConfig;
pub use signer::{canonical_json, sign, signature, Credentials, SignedPayload};
