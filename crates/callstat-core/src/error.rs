use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Semantic type a recognized request parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// String in `DD.MM.YYYY HH:MM:SS` form.
    DateString,
    Integer,
    Text,
    /// String holding a non-negative integer, e.g. `"100"`.
    NumericString,
    List,
}

impl ParamKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateString => "date string (DD.MM.YYYY HH:MM:SS)",
            Self::Integer => "integer",
            Self::Text => "string",
            Self::NumericString => "numeric string",
            Self::List => "list",
        }
    }
}

impl Display for ParamKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic constraints a statistics query must satisfy before any call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRule {
    DateSpanExceeded {
        start: String,
        end: String,
        max_days: i64,
    },
    RecallStatusNotAllowed {
        context_type: Option<Vec<i64>>,
        context_status: Option<i64>,
    },
    PageSizeNotAllowed {
        value: String,
    },
}

impl Display for QueryRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateSpanExceeded {
                start,
                end,
                max_days,
            } => write!(
                f,
                "date range {start} .. {end} exceeds the maximum of {max_days} days"
            ),
            Self::RecallStatusNotAllowed {
                context_type,
                context_status,
            } => write!(
                f,
                "recall_status is only allowed with context_type=1 and context_status=0 \
                 (got context_type={context_type:?}, context_status={context_status:?})"
            ),
            Self::PageSizeNotAllowed { value } => write!(
                f,
                "limit '{value}' is not allowed, expected one of 1, 5, 10, 20, 50, 100, 500, 1000, 2000, 5000"
            ),
        }
    }
}

/// Errors raised while validating a query, before anything is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid parameter '{name}': expected {expected}")]
    InvalidParameter {
        name: &'static str,
        expected: ParamKind,
    },

    #[error("invalid query: {0}")]
    InvalidQueryRule(QueryRule),
}

impl ValidationError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "validation.invalid_parameter",
            Self::InvalidQueryRule(_) => "validation.invalid_query_rule",
        }
    }
}

/// The remote API answered, but with something the job protocol does not allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// `result` differed from the success code.
    ResultCode {
        code: Option<i64>,
        status: Option<String>,
    },
    /// The job reported `error` or `not-found`.
    JobFailed { status: String },
    MalformedResponse { endpoint: String, reason: String },
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResultCode { code, status } => {
                let code = code.map_or_else(|| String::from("<missing>"), |code| code.to_string());
                let status = status.as_deref().unwrap_or("<missing>");
                write!(f, "remote result code {code} (status '{status}')")
            }
            Self::JobFailed { status } => write!(f, "report job failed with status '{status}'"),
            Self::MalformedResponse { endpoint, reason } => {
                write!(f, "malformed response from '{endpoint}': {reason}")
            }
        }
    }
}

/// Network or HTTP-level failure of a single signed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportFailure {
    pub endpoint: String,
    /// HTTP status when the server answered with a non-2xx code.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportFailure {
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn status(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        let mut message = body.trim().to_owned();
        if message.len() > 200 {
            let mut cut = 200;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
            message,
        }
    }
}

impl Display for TransportFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "'{}' returned HTTP {status}: {}",
                self.endpoint, self.message
            ),
            None => write!(f, "'{}' unreachable: {}", self.endpoint, self.message),
        }
    }
}

/// Top-level error type for statistics collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("transport failure: {0}")]
    Transport(TransportFailure),

    #[error("report job '{key}' did not finish after {attempts} polls")]
    JobTimeout { key: String, attempts: u32 },
}

impl StatsError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.code(),
            Self::Protocol(ProtocolError::ResultCode { .. }) => "protocol.result_code",
            Self::Protocol(ProtocolError::JobFailed { .. }) => "protocol.job_failed",
            Self::Protocol(ProtocolError::MalformedResponse { .. }) => "protocol.malformed_response",
            Self::Transport(_) => "transport.failure",
            Self::JobTimeout { .. } => "job.timeout",
        }
    }
}

impl From<ProtocolError> for StatsError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

impl From<TransportFailure> for StatsError {
    fn from(error: TransportFailure) -> Self {
        Self::Transport(error)
    }
}
