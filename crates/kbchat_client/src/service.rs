use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{ChatRequest, ErrorBody, UrlIngestRequest};
use crate::{Answer, IngestReceipt, PdfUpload, ServiceError, ServiceStatus};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Ingestion embeds whole documents server-side, so this is generous.
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// The four remote operations the session depends on, plus the root status query.
#[async_trait::async_trait]
pub trait KnowledgeService: Send + Sync {
    async fn converse(&self, query: &str) -> Result<Answer, ServiceError>;

    async fn ingest_url(&self, url: &str) -> Result<IngestReceipt, ServiceError>;

    async fn ingest_pdf(&self, upload: PdfUpload) -> Result<IngestReceipt, ServiceError>;

    async fn reset(&self) -> Result<(), ServiceError>;

    async fn status(&self) -> Result<ServiceStatus, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpKnowledgeService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpKnowledgeService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let raw = settings.base_url.trim();
        let mut base_url = Url::parse(raw)
            .map_err(|err| ServiceError::InvalidEndpoint(format!("{raw}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidEndpoint(format!(
                "{raw}: not a base url"
            )));
        }
        // Treat the base path as a directory so joins append instead of replace.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(ServiceError::from_reqwest)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::InvalidEndpoint(format!("{path}: {err}")))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|err| ServiceError::Malformed(err.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<bytes::Bytes, ServiceError> {
        let response = request.send().await.map_err(ServiceError::from_reqwest)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ServiceError::from_reqwest)?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|error| error.detail_text());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl KnowledgeService for HttpKnowledgeService {
    async fn converse(&self, query: &str) -> Result<Answer, ServiceError> {
        let url = self.endpoint("chat")?;
        self.send_json(self.client.post(url).json(&ChatRequest { query }))
            .await
    }

    async fn ingest_url(&self, url: &str) -> Result<IngestReceipt, ServiceError> {
        let endpoint = self.endpoint("ingest/url")?;
        self.send_json(self.client.post(endpoint).json(&UrlIngestRequest { url }))
            .await
    }

    async fn ingest_pdf(&self, upload: PdfUpload) -> Result<IngestReceipt, ServiceError> {
        let endpoint = self.endpoint("ingest/pdf")?;
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name)
            .mime_str("application/pdf")
            .map_err(ServiceError::from_reqwest)?;
        let form = Form::new().part("file", part);
        self.send_json(self.client.post(endpoint).multipart(form))
            .await
    }

    async fn reset(&self) -> Result<(), ServiceError> {
        let endpoint = self.endpoint("reset")?;
        self.send(self.client.post(endpoint)).await.map(|_| ())
    }

    async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let endpoint = self.endpoint("")?;
        self.send_json(self.client.get(endpoint)).await
    }
}
