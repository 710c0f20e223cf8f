//! Backend access
//!
//! `AdminApi` is the seam between list management and the network. The
//! REST client implements it over HTTP; the in-memory backend implements it
//! over seeded JSON so `--demo` and the tests run without a server. Both
//! return raw list bodies, which `envelope` normalizes into pages.

pub mod client;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod upload;

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::export::ExportFormat;
use crate::list::{Filters, ListQuery, Page, Resource, ResourceKind};
use crate::modal::Mutation;
use crate::models::PlatformMetrics;

pub use client::HttpClient;
pub use error::ApiError;
pub use memory::MemoryBackend;

/// Upload progress callback: bytes sent, total bytes
pub type Progress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Presigned destination for a document upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    #[serde(alias = "url", alias = "presignedUrl")]
    pub upload_url: String,
    #[serde(alias = "key")]
    pub s3_key: String,
}

pub trait AdminApi: Send + Sync {
    /// Raw list body for `GET {kind.endpoint()}?{params}`
    fn list(&self, kind: ResourceKind, params: &[(String, String)]) -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// Send a mutation, returning the server's message if it sent one
    fn mutate(&self, mutation: &Mutation) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn metrics(&self) -> impl Future<Output = Result<PlatformMetrics, ApiError>> + Send;

    /// Server-generated export of every row matching `filters`
    fn export(
        &self,
        kind: ResourceKind,
        format: ExportFormat,
        filters: &Filters,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    /// Binary GET, e.g. a payment receipt
    fn download(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    /// Phase one of an upload: ask for a presigned URL
    fn upload_target(
        &self,
        document_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<UploadTarget, ApiError>> + Send;

    /// Phase two: PUT the bytes to the presigned URL
    fn put_object(
        &self,
        target: &UploadTarget,
        content_type: &str,
        bytes: Vec<u8>,
        progress: Progress,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Phase three: tell the backend the object is in place
    fn confirm_upload(
        &self,
        document_id: &str,
        s3_key: &str,
        size: u64,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;
}

/// Fetch one page of `R` for `query`
pub async fn fetch_page<R: Resource, A: AdminApi>(api: &A, query: &ListQuery) -> Result<Page<R>, ApiError> {
    let params = query.to_params();
    tracing::debug!(resource = %R::KIND, ?params, "fetching page");
    let value = api.list(R::KIND, &params).await?;
    envelope::parse_page(R::KIND.endpoint(), value, query.page(), query.limit())
}

/// The backend chosen at startup
#[derive(Debug)]
pub enum Backend {
    Http(HttpClient),
    Memory(MemoryBackend),
}

impl Backend {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Backend::Http(client) => client.base_url().to_string(),
            Backend::Memory(_) => "demo data".to_string(),
        }
    }
}

impl AdminApi for Backend {
    async fn list(&self, kind: ResourceKind, params: &[(String, String)]) -> Result<Value, ApiError> {
        match self {
            Backend::Http(b) => b.list(kind, params).await,
            Backend::Memory(b) => b.list(kind, params).await,
        }
    }

    async fn mutate(&self, mutation: &Mutation) -> Result<Option<String>, ApiError> {
        match self {
            Backend::Http(b) => b.mutate(mutation).await,
            Backend::Memory(b) => b.mutate(mutation).await,
        }
    }

    async fn metrics(&self) -> Result<PlatformMetrics, ApiError> {
        match self {
            Backend::Http(b) => b.metrics().await,
            Backend::Memory(b) => b.metrics().await,
        }
    }

    async fn export(&self, kind: ResourceKind, format: ExportFormat, filters: &Filters) -> Result<Vec<u8>, ApiError> {
        match self {
            Backend::Http(b) => b.export(kind, format, filters).await,
            Backend::Memory(b) => b.export(kind, format, filters).await,
        }
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        match self {
            Backend::Http(b) => b.download(path).await,
            Backend::Memory(b) => b.download(path).await,
        }
    }

    async fn upload_target(&self, document_id: &str, file_name: &str, content_type: &str) -> Result<UploadTarget, ApiError> {
        match self {
            Backend::Http(b) => b.upload_target(document_id, file_name, content_type).await,
            Backend::Memory(b) => b.upload_target(document_id, file_name, content_type).await,
        }
    }

    async fn put_object(
        &self,
        target: &UploadTarget,
        content_type: &str,
        bytes: Vec<u8>,
        progress: Progress,
    ) -> Result<(), ApiError> {
        match self {
            Backend::Http(b) => b.put_object(target, content_type, bytes, progress).await,
            Backend::Memory(b) => b.put_object(target, content_type, bytes, progress).await,
        }
    }

    async fn confirm_upload(&self, document_id: &str, s3_key: &str, size: u64) -> Result<Option<String>, ApiError> {
        match self {
            Backend::Http(b) => b.confirm_upload(document_id, s3_key, size).await,
            Backend::Memory(b) => b.confirm_upload(document_id, s3_key, size).await,
        }
    }
}
