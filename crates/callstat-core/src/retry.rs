//! Poll pacing and the post-failure cooldown.

use std::time::Duration;

/// How long to wait for a report job, and how long to pause after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Result polls per page before the job counts as timed out.
    pub max_attempts: u32,
    /// Pause between two polls of a pending job.
    pub delay: Duration,
    /// Pause before returning a best-effort result after a transport failure.
    pub cooldown: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(30),
            cooldown: Duration::from_secs(10),
        }
    }
}

impl PollConfig {
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay,
            ..Self::default()
        }
    }

    /// No waiting at all; intended for tests and replayed fixtures.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
            cooldown: Duration::ZERO,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_five_times_thirty_seconds_apart() {
        let config = PollConfig::default();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.delay, Duration::from_secs(30));
        assert_eq!(config.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn fixed_keeps_the_default_cooldown() {
        let config = PollConfig::fixed(Duration::from_secs(2), 8);

        assert_eq!(config.max_attempts, 8);
        assert_eq!(config.delay, Duration::from_secs(2));
        assert_eq!(config.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn immediate_config_never_waits() {
        let config = PollConfig::immediate(3).with_cooldown(Duration::from_millis(5));

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.cooldown, Duration::from_millis(5));
    }
}
