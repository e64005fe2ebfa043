//! Polling a report job until it yields a page.
//!
//! Every poll reads `result` and `status`:
//!
//! | `result` | `status` | Next state |
//! |----------|----------|------------|
//! | ≠ success code | any | [`PollState::Failed`] |
//! | success | `complete` | [`PollState::Complete`] |
//! | success | `request`, `work` | [`PollState::Pending`], or [`PollState::TimedOut`] once the budget is spent |
//! | success | `error`, `not-found` | [`PollState::Failed`] |
//! | success | anything else | [`PollState::Unexpected`] |

use tracing::{debug, info};

use crate::api::StatsApi;
use crate::error::{ProtocolError, StatsError};
use crate::model::{JobHandle, ResultPage, ResultResponse};
use crate::retry::PollConfig;

/// States of a single job poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// About to send poll number `attempt` (0-based).
    Requesting { attempt: u32 },
    /// The job is still running after poll `attempt`.
    Pending { attempt: u32 },
    Complete(ResultPage),
    Failed(ProtocolError),
    /// Unknown status: stop polling, nothing more to extract.
    Unexpected { status: Option<String> },
    TimedOut { attempts: u32 },
}

impl PollState {
    /// Transition taken when poll `attempt` returns `response`.
    pub fn on_response(
        attempt: u32,
        response: ResultResponse,
        success_code: i64,
        max_attempts: u32,
    ) -> Self {
        if response.result != Some(success_code) {
            return Self::Failed(ProtocolError::ResultCode {
                code: response.result,
                status: response.status,
            });
        }

        match response.status.as_deref() {
            Some("complete") => Self::Complete(ResultPage::from_blocks(response.data)),
            Some("request") | Some("work") => {
                if attempt + 1 >= max_attempts {
                    Self::TimedOut {
                        attempts: attempt + 1,
                    }
                } else {
                    Self::Pending { attempt }
                }
            }
            Some(status @ ("error" | "not-found")) => Self::Failed(ProtocolError::JobFailed {
                status: status.to_owned(),
            }),
            _ => Self::Unexpected {
                status: response.status,
            },
        }
    }
}

/// Terminal result of polling that lets collection continue.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Complete(ResultPage),
    Unexpected { status: Option<String> },
}

/// Drives [`PollState`] for one job against the API.
pub struct Poller<'a> {
    api: &'a StatsApi,
    config: &'a PollConfig,
}

impl<'a> Poller<'a> {
    pub fn new(api: &'a StatsApi, config: &'a PollConfig) -> Self {
        Self { api, config }
    }

    /// Polls `job` until it completes, fails, or the attempt budget runs out.
    ///
    /// # Errors
    ///
    /// - [`StatsError::Protocol`] for a bad result code or a failed job
    /// - [`StatsError::JobTimeout`] when the job is still pending after the last poll
    /// - [`StatsError::Transport`] when a poll cannot reach the server
    pub async fn run(&self, job: &JobHandle) -> Result<PollOutcome, StatsError> {
        let max_attempts = self.config.max_attempts.max(1);
        let success_code = self.api.config().success_code;
        let mut state = PollState::Requesting { attempt: 0 };

        loop {
            state = match state {
                PollState::Requesting { attempt } => {
                    let response = self.api.fetch_result(job).await?;
                    debug!(job = %job, attempt, status = ?response.status, result = ?response.result, "polled report job");
                    PollState::on_response(attempt, response, success_code, max_attempts)
                }
                PollState::Pending { attempt } => {
                    let delay = self.config.delay;
                    info!(
                        job = %job,
                        attempts_left = max_attempts - attempt - 1,
                        delay_secs = delay.as_secs_f64(),
                        "report job still processing, waiting before next poll"
                    );
                    tokio::time::sleep(delay).await;
                    PollState::Requesting {
                        attempt: attempt + 1,
                    }
                }
                PollState::Complete(page) => return Ok(PollOutcome::Complete(page)),
                PollState::Unexpected { status } => {
                    info!(job = %job, status = ?status, "report job returned an unknown status");
                    return Ok(PollOutcome::Unexpected { status });
                }
                PollState::Failed(error) => return Err(error.into()),
                PollState::TimedOut { attempts } => {
                    return Err(StatsError::JobTimeout {
                        key: job.to_string(),
                        attempts,
                    })
                }
            };
        }
    }
}
