//! HTTP client for the benchmark backend.

use super::{Backend, BackendReply, CompareRequest, UploadFile};
use crate::config::BackendConfig;
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

/// Health check response.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// reqwest-backed [`Backend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Create a new client with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Base URL the client talks to.
    pub fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    /// Get the URL of an endpoint.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }

    async fn into_reply(response: Response) -> Result<BackendReply> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "backend reply");
        Ok(BackendReply::new(status.as_u16(), body))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, file: &UploadFile) -> Result<BackendReply> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)?;
        let form = Form::new().part("file", part);

        debug!(file = %file.file_name, bytes = file.bytes.len(), "POST /upload");
        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        Self::into_reply(response).await
    }

    async fn compare(&self, request: &CompareRequest) -> Result<BackendReply> {
        debug!(doc_id = %request.doc_id, "POST /compare");
        let response = self
            .client
            .post(self.endpoint("compare"))
            .json(request)
            .send()
            .await?;

        Self::into_reply(response).await
    }

    async fn health(&self) -> Result<()> {
        let reply = Self::into_reply(self.client.get(self.endpoint("health")).send().await?).await?;

        if !reply.is_success() {
            return Err(BenchError::Http(format!(
                "Health check failed ({}): {}",
                reply.status,
                reply.error_message().unwrap_or(reply.body)
            )));
        }

        let health: HealthResponse = serde_json::from_str(&reply.body)?;
        if health.status == "ok" {
            Ok(())
        } else {
            Err(BenchError::Http(format!(
                "Unexpected health status: {}",
                health.status
            )))
        }
    }
}
