//! End-to-end collection of one statistics query.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::api::StatsApi;
use crate::config::ClientConfig;
use crate::error::{ProtocolError, StatsError};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::pagination::{Accumulator, CollectedStatistics, Completion, PageDecision};
use crate::params::refilter;
use crate::poller::{PollOutcome, Poller};
use crate::query::StatisticsQuery;
use crate::recovery::{Recovery, RecoveryPolicy};
use crate::signer::Credentials;

/// Client that turns a [`StatisticsQuery`] into the full set of call records.
///
/// The client holds no per-query state; concurrent `collect` calls are
/// independent.
#[derive(Clone)]
pub struct CallStatsClient {
    api: StatsApi,
    recovery: RecoveryPolicy,
}

impl CallStatsClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Credentials,
        config: ClientConfig,
    ) -> Self {
        let recovery = RecoveryPolicy::new(config.poll.cooldown);
        Self {
            api: StatsApi::new(http_client, credentials, config),
            recovery,
        }
    }

    pub fn with_reqwest(credentials: Credentials, config: ClientConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), credentials, config)
    }

    /// Runs the query page by page until the data runs out.
    ///
    /// # Errors
    ///
    /// Validation, protocol and timeout errors are always returned. A
    /// transport failure is returned only while nothing has been collected;
    /// afterwards the partial rows come back with [`Completion::Degraded`].
    pub async fn collect(&self, query: &StatisticsQuery) -> Result<CollectedStatistics, StatsError> {
        let span = info_span!(
            "collect",
            start = %query.start(),
            end = %query.end(),
            limit = query.limit().get()
        );
        self.collect_pages(query).instrument(span).await
    }

    async fn collect_pages(&self, query: &StatisticsQuery) -> Result<CollectedStatistics, StatsError> {
        let poll_config = &self.api.config().poll;
        let limit = query.limit();
        let mut offset = query.initial_offset();
        let mut accumulator = Accumulator::new();

        loop {
            let params = refilter(&query.params_at(offset))?;

            let job = match self.api.submit_job(&params).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    return Err(ProtocolError::MalformedResponse {
                        endpoint: self.api.config().url_for(&self.api.config().endpoints.create_job),
                        reason: String::from("response has no job key"),
                    }
                    .into())
                }
                Err(error) => return self.recover(error, accumulator).await,
            };

            let outcome = match Poller::new(&self.api, poll_config).run(&job).await {
                Ok(outcome) => outcome,
                Err(error) => return self.recover(error, accumulator).await,
            };

            match outcome {
                PollOutcome::Unexpected { status } => {
                    info!(
                        rows = accumulator.row_count(),
                        "stopping collection on unknown job status"
                    );
                    return Ok(accumulator.finish(Completion::Unexpected { status }));
                }
                PollOutcome::Complete(page) => {
                    let received = page.len();
                    match accumulator.absorb(page, limit, offset) {
                        PageDecision::Finished => {
                            info!(
                                pages = accumulator.pages(),
                                rows = accumulator.row_count(),
                                "collection finished"
                            );
                            return Ok(accumulator.finish(Completion::Exhausted));
                        }
                        PageDecision::Continue { next_offset } => {
                            info!(
                                received,
                                rows = accumulator.row_count(),
                                next_offset,
                                "page collected, moving to next offset"
                            );
                            offset = next_offset;
                        }
                    }
                }
            }
        }
    }

    async fn recover(
        &self,
        error: StatsError,
        accumulator: Accumulator,
    ) -> Result<CollectedStatistics, StatsError> {
        let rows = accumulator.row_count();
        match self.recovery.decide(error, rows) {
            Recovery::Abort(error) => Err(error),
            Recovery::Settle(failure) => {
                self.recovery.cool_down(&failure, rows).await;
                Ok(accumulator.finish(Completion::Degraded { failure }))
            }
        }
    }
}
