//! HTTP client for the scenario id lookups
//!
//! Used by other services to find out which scenario an element they
//! produced (or received) belongs to.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default timeout for lookup requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not retrieve scenario id: ({status}) {body}")]
    Status { status: StatusCode, body: String },

    #[error("No such id: {0}")]
    UnknownElement(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ScenarioClient {
    http_client: Client,
    base_url: String,
}

impl ScenarioClient {
    /// Client for the service at `base_url` (e.g. `http://127.0.0.1:8000`)
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http_client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Id of the open scenario, `None` when no scenario is open
    pub async fn current_scenario_id(&self) -> ClientResult<Option<String>> {
        let response = self
            .http_client
            .get(format!("{}/scenario/current/id", self.base_url))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match status {
            s if s.is_success() => Ok(Some(body)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(ClientError::Status { status, body }),
        }
    }

    /// Scenario id of `element_id`
    ///
    /// With `fallback`, an unknown element yields the current scenario id as
    /// reported by the service (`None` if no scenario is open).
    pub async fn scenario_for_id(&self, element_id: &str, fallback: bool) -> ClientResult<Option<String>> {
        let response = self
            .http_client
            .get(format!("{}/{}/scenario/id", self.base_url, element_id))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match status {
            s if s.is_success() => Ok(Some(body)),
            StatusCode::NOT_FOUND if fallback => {
                warn!(
                    "Could not find scenario for id {}, fall back to current",
                    element_id
                );
                Ok(Some(body).filter(|id| !id.is_empty()))
            }
            StatusCode::NOT_FOUND => Err(ClientError::UnknownElement(element_id.to_string())),
            status => Err(ClientError::Status { status, body }),
        }
    }
}
