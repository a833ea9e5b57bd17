use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use super::session::Session;
use crate::core::ProjectionRequest;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("request rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("credentials rejected")]
    Unauthorized,
    #[error("response was not JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Anything that can run a DC projection remotely and hand back its JSON,
/// whatever layout that JSON takes.
pub trait Calculator {
    fn project(
        &self,
        session: &Session,
        request: &ProjectionRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

#[derive(Serialize)]
struct CsvEnvelope<'a> {
    csv: &'a str,
}

/// Calculation service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCalculator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCalculator {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Network)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a CSV of scenarios to the bulk endpoint. The reply is passed
    /// through untouched.
    pub async fn upload_csv(&self, session: &Session, csv: &str) -> Result<Value, TransportError> {
        self.post_json(session, "/batch/dc_project", &CsvEnvelope { csv })
            .await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &T,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.client.post(&url).json(body);
        if let Some(bearer) = session.bearer() {
            if let Ok(value) = HeaderValue::from_str(&bearer) {
                builder = builder.header(AUTHORIZATION, value);
            }
        }

        tracing::debug!(%url, "posting to calculation service");
        let response = builder.send().await.map_err(TransportError::Network)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(TransportError::Decode)
    }
}

impl Calculator for HttpCalculator {
    async fn project(
        &self,
        session: &Session,
        request: &ProjectionRequest,
    ) -> Result<Value, TransportError> {
        self.post_json(session, "/dc/project", request).await
    }
}
