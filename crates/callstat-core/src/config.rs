use crate::retry::PollConfig;

/// Result code the API reports for a successfully processed request.
pub const SUCCESS_RESULT_CODE: i64 = 1000;

/// Paths of the two report endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub create_job: String,
    pub fetch_result: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            create_job: String::from("vpbx/stats/calls/request/"),
            fetch_result: String::from("vpbx/stats/calls/result/"),
        }
    }
}

/// Client settings injected by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub poll: PollConfig,
    pub request_timeout_ms: u64,
    pub success_code: i64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints: Endpoints::default(),
            poll: PollConfig::default(),
            request_timeout_ms: 30_000,
            success_code: SUCCESS_RESULT_CODE,
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Joins `path` onto the base URL with exactly one slash between them.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
