//! REST client for the admin backend

use std::time::Duration;

use futures::stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method as HttpMethod, RequestBuilder, Response};
use serde_json::{Value, json};

use crate::export::ExportFormat;
use crate::list::{Filters, ResourceKind};
use crate::modal::{Method, Mutation};
use crate::models::PlatformMetrics;

use super::envelope::{parse_ack, parse_item};
use super::error::ApiError;
use super::{AdminApi, Progress, UploadTarget};

/// Bytes per chunk when streaming an upload
const UPLOAD_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tenantdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Setup(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: HttpMethod, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and map transport failures and non-2xx statuses
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Transport {
            url: self.url(path),
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()));
        tracing::warn!(path, status = status.as_u16(), ?message, "request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json(&self, builder: RequestBuilder, path: &str) -> Result<Value, ApiError> {
        let response = self.send(builder, path).await?;
        // Some mutation endpoints answer 204 with no body
        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            url: self.url(path),
            message: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn bytes(&self, builder: RequestBuilder, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(builder, path).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::Transport {
                url: self.url(path),
                message: e.to_string(),
            })
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Post => HttpMethod::POST,
        Method::Put => HttpMethod::PUT,
        Method::Patch => HttpMethod::PATCH,
        Method::Delete => HttpMethod::DELETE,
    }
}

/// Filters as a JSON object for export bodies
fn filters_json(filters: &Filters) -> Value {
    Value::Object(
        filters
            .to_params()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    )
}

impl AdminApi for HttpClient {
    async fn list(&self, kind: ResourceKind, params: &[(String, String)]) -> Result<Value, ApiError> {
        let path = kind.endpoint();
        let started = std::time::Instant::now();
        let value = self.json(self.request(HttpMethod::GET, path).query(params), path).await?;
        tracing::debug!(resource = %kind, elapsed_ms = started.elapsed().as_millis() as u64, "list fetched");
        Ok(value)
    }

    async fn mutate(&self, mutation: &Mutation) -> Result<Option<String>, ApiError> {
        tracing::info!(method = mutation.method.as_str(), path = %mutation.path, "sending mutation");
        let builder = self
            .request(http_method(mutation.method), &mutation.path)
            .json(&mutation.body);
        let value = self.json(builder, &mutation.path).await?;
        parse_ack(&mutation.path, &value)
    }

    async fn metrics(&self) -> Result<PlatformMetrics, ApiError> {
        let path = "/super-admin/metrics";
        let value = self.json(self.request(HttpMethod::GET, path), path).await?;
        parse_item(path, value)
    }

    async fn export(&self, kind: ResourceKind, format: ExportFormat, filters: &Filters) -> Result<Vec<u8>, ApiError> {
        let path = format!("{}/export", kind.endpoint());
        let body = json!({ "format": format.wire(), "filters": filters_json(filters) });
        self.bytes(self.request(HttpMethod::POST, &path).json(&body), &path).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.bytes(self.request(HttpMethod::GET, path), path).await
    }

    async fn upload_target(&self, document_id: &str, file_name: &str, content_type: &str) -> Result<UploadTarget, ApiError> {
        let path = format!("/deleted-documents/{}/upload-url", document_id);
        let body = json!({ "fileName": file_name, "contentType": content_type });
        let value = self.json(self.request(HttpMethod::POST, &path).json(&body), &path).await?;
        parse_item(&path, value)
    }

    async fn put_object(
        &self,
        target: &UploadTarget,
        content_type: &str,
        bytes: Vec<u8>,
        progress: Progress,
    ) -> Result<(), ApiError> {
        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        // Presigned URLs carry their own auth; no bearer token here
        let response = self
            .client
            .put(&target.upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body_stream))
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: target.upload_url.clone(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                message: Some("upload to storage failed".to_string()),
            });
        }
        Ok(())
    }

    async fn confirm_upload(&self, document_id: &str, s3_key: &str, size: u64) -> Result<Option<String>, ApiError> {
        let path = format!("/deleted-documents/{}/file-uploaded", document_id);
        let body = json!({ "s3Key": s3_key, "fileSize": size });
        let value = self.json(self.request(HttpMethod::PATCH, &path).json(&body), &path).await?;
        parse_ack(&path, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = HttpClient::new("https://admin.example.com/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://admin.example.com/api");
        assert_eq!(client.url("/tenants"), "https://admin.example.com/api/tenants");
        assert_eq!(client.url("invoices/i1/pay"), "https://admin.example.com/api/invoices/i1/pay");
    }

    #[test]
    fn test_filters_json() {
        let mut filters = Filters::new();
        filters.set_text("status", "suspended");
        assert_eq!(filters_json(&filters), json!({"status": "suspended"}));
    }
}
