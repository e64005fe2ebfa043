use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] callstat_core::ValidationError),

    #[error(transparent)]
    Stats(callstat_core::StatsError),

    #[error("missing setting '{flag}' (or ${env})")]
    MissingSetting {
        flag: &'static str,
        env: &'static str,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<callstat_core::StatsError> for CliError {
    fn from(error: callstat_core::StatsError) -> Self {
        match error {
            callstat_core::StatsError::Validation(error) => Self::Validation(error),
            other => Self::Stats(other),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::MissingSetting { .. } => 2,
            Self::Stats(callstat_core::StatsError::JobTimeout { .. }) => 7,
            Self::Stats(_) => 6,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.code(),
            Self::Stats(error) => error.code(),
            Self::MissingSetting { .. } => "cli.missing_setting",
            Self::Serialization(_) => "cli.serialization",
            Self::Io(_) => "cli.io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callstat_core::{StatsError, TransportFailure, ValidationError};

    #[test]
    fn validation_inside_stats_error_keeps_its_exit_code() {
        let validation = ValidationError::InvalidParameter {
            name: "start_date",
            expected: callstat_core::ParamKind::DateString,
        };
        let error = CliError::from(StatsError::Validation(validation.clone()));
        assert!(matches!(&error, CliError::Validation(inner) if *inner == validation));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn timeouts_have_their_own_exit_code() {
        let timeout = CliError::from(StatsError::JobTimeout {
            key: String::from("k"),
            attempts: 5,
        });
        let transport = CliError::from(StatsError::Transport(TransportFailure::connection(
            "https://api.test/x",
            "refused",
        )));
        assert_eq!(timeout.exit_code(), 7);
        assert_eq!(transport.exit_code(), 6);
        assert_eq!(transport.code(), "transport.failure");
    }
}
