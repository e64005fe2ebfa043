//! Signed calls against the two report endpoints.
//!
//! Neither call retries. Transport failures come back as
//! [`StatsError::Transport`] and the collection loop decides what to do.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, StatsError, TransportFailure};
use crate::http_client::{HttpClient, HttpRequest};
use crate::model::{JobCreated, JobHandle, ResultResponse};
use crate::params::ParamMap;
use crate::signer::{sign, Credentials};

/// Transport plus credentials for the report API.
#[derive(Clone)]
pub struct StatsApi {
    http_client: Arc<dyn HttpClient>,
    credentials: Credentials,
    config: ClientConfig,
}

impl StatsApi {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Credentials,
        config: ClientConfig,
    ) -> Self {
        Self {
            http_client,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submits a report definition and returns the job key.
    ///
    /// A response without a `key` yields `Ok(None)`.
    pub async fn submit_job(&self, params: &ParamMap) -> Result<Option<JobHandle>, StatsError> {
        let created: JobCreated = self
            .signed_call(&self.config.endpoints.create_job, params)
            .await?;

        match created.key {
            Some(key) if !key.is_empty() => {
                debug!(job = %key, "report job created");
                Ok(Some(JobHandle::new(key)))
            }
            _ => {
                warn!("report job response carried no key");
                Ok(None)
            }
        }
    }

    /// Fetches the current status (and, once complete, the rows) of a job.
    pub async fn fetch_result(&self, job: &JobHandle) -> Result<ResultResponse, StatsError> {
        let mut params = ParamMap::new();
        params.insert(String::from("key"), json!(job.as_str()));
        self.signed_call(&self.config.endpoints.fetch_result, &params)
            .await
    }

    async fn signed_call<T>(&self, path: &str, params: &ParamMap) -> Result<T, StatsError>
    where
        T: DeserializeOwned,
    {
        let url = self.config.url_for(path);
        let payload = sign(params, &self.credentials);
        debug!(url = %url, json = %payload.json, "sending signed request");

        let request = HttpRequest::post(&url)
            .with_form_body(payload.to_form_body())
            .with_timeout_ms(self.config.request_timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| TransportFailure::connection(&url, error.message()))?;

        if !response.is_success() {
            return Err(TransportFailure::status(&url, response.status, &response.body).into());
        }

        serde_json::from_str(&response.body).map_err(|error| {
            ProtocolError::MalformedResponse {
                endpoint: url,
                reason: error.to_string(),
            }
            .into()
        })
    }
}
