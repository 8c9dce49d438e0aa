use crate::models::Record;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching the record list
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of the user list shown in the table.
///
/// The application calls [`fetch_users`](UserSource::fetch_users) once at
/// startup (and again only when the user asks for a retry).
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<Record>, FetchError>;

    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}

/// [`UserSource`] backed by a single HTTP GET returning a JSON array.
#[derive(Debug, Clone)]
pub struct HttpUserSource {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpUserSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl UserSource for HttpUserSource {
    async fn fetch_users(&self) -> Result<Vec<Record>, FetchError> {
        tracing::debug!("GET {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let records: Vec<Record> = serde_json::from_slice(&body)?;

        tracing::debug!("Decoded {} records from {}", records.len(), self.endpoint);
        Ok(records)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
