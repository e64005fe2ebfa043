//! What to do when a network call in the collection loop fails.
//!
//! Before any row has arrived every failure is fatal. Once rows are held, a
//! transport failure ends collection early: after a cooldown the rows
//! gathered so far are returned as a best-effort result. Protocol errors and
//! timeouts stay fatal either way.

use std::time::Duration;

use tracing::warn;

use crate::error::{StatsError, TransportFailure};

/// Decision taken for a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    Abort(StatsError),
    /// Stop and hand back what has been accumulated.
    Settle(TransportFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    cooldown: Duration,
}

impl RecoveryPolicy {
    pub const fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn decide(&self, error: StatsError, accumulated_rows: usize) -> Recovery {
        match error {
            StatsError::Transport(failure) if accumulated_rows > 0 => Recovery::Settle(failure),
            other => Recovery::Abort(other),
        }
    }

    /// Logs the downgraded failure and waits out the cooldown.
    pub async fn cool_down(&self, failure: &TransportFailure, accumulated_rows: usize) {
        warn!(
            endpoint = %failure.endpoint,
            status = ?failure.status,
            error = %failure.message,
            accumulated_rows,
            cooldown_secs = self.cooldown.as_secs_f64(),
            "server error after partial collection, returning rows gathered so far"
        );
        tokio::time::sleep(self.cooldown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    fn transport() -> StatsError {
        StatsError::Transport(TransportFailure::status("https://api.test/x", 500, "oops"))
    }

    #[test]
    fn transport_failure_without_rows_aborts() {
        let policy = RecoveryPolicy::new(Duration::ZERO);
        assert!(matches!(policy.decide(transport(), 0), Recovery::Abort(StatsError::Transport(_))));
    }

    #[test]
    fn transport_failure_with_rows_settles() {
        let policy = RecoveryPolicy::new(Duration::ZERO);
        match policy.decide(transport(), 3) {
            Recovery::Settle(failure) => assert_eq!(failure.status, Some(500)),
            other => panic!("expected settle, got {other:?}"),
        }
    }

    #[test]
    fn protocol_errors_abort_regardless_of_rows() {
        let policy = RecoveryPolicy::new(Duration::ZERO);
        let error = StatsError::Protocol(ProtocolError::JobFailed {
            status: String::from("error"),
        });
        assert_eq!(policy.decide(error.clone(), 100), Recovery::Abort(error));

        let timeout = StatsError::JobTimeout {
            key: String::from("k"),
            attempts: 5,
        };
        assert_eq!(policy.decide(timeout.clone(), 100), Recovery::Abort(timeout));
    }
}
