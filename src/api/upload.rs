//! Two-phase document upload: presigned URL, PUT, confirm

use crate::modal::UploadRequest;

use super::error::ApiError;
use super::{AdminApi, Progress};

/// Run the whole upload flow for one validated request.
///
/// Returns the success message for the notifier.
pub async fn upload_document<A: AdminApi>(api: &A, request: &UploadRequest, progress: Progress) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(&request.path).await.map_err(|source| ApiError::File {
        path: request.path.clone(),
        source,
    })?;
    let size = bytes.len() as u64;
    tracing::info!(document = %request.document_id, file = %request.file_name, size, "starting upload");

    let target = api
        .upload_target(&request.document_id, &request.file_name, &request.content_type)
        .await?;
    progress(0, size);
    api.put_object(&target, &request.content_type, bytes, progress).await?;
    let message = api.confirm_upload(&request.document_id, &target.s3_key, size).await?;

    tracing::info!(document = %request.document_id, s3_key = %target.s3_key, "upload confirmed");
    Ok(message.unwrap_or_else(|| format!("Uploaded {}", request.file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::api::MemoryBackend;
    use crate::list::{ListQuery, SortOrder};
    use crate::models::{DeletedDocument, RecoveryStatus};
    use serde_json::json;

    #[tokio::test]
    async fn test_upload_flow_reports_progress_and_marks_document() {
        let dir = std::env::temp_dir().join(format!("tenantdesk-flow-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("contract.pdf");
        std::fs::write(&file, vec![7u8; 150_000]).unwrap();

        let api = MemoryBackend::empty();
        api.insert(
            crate::list::ResourceKind::Documents,
            json!({"id": "d1", "fileName": "contract.pdf", "recoveryStatus": "failed"}),
        );
        let request = crate::modal::upload::prepare_upload("d1", &file.to_string_lossy()).unwrap();

        let seen: Arc<Mutex<Vec<(u64, u64)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let message = upload_document(&api, &request, Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        }))
        .await
        .unwrap();
        assert!(message.contains("contract.pdf"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&(0, 150_000)));
        assert_eq!(seen.last(), Some(&(150_000, 150_000)));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));

        let query = ListQuery::new(20, "deletedAt", SortOrder::Desc);
        let page = crate::api::fetch_page::<DeletedDocument, _>(&api, &query).await.unwrap();
        assert_eq!(page.items[0].recovery_status, RecoveryStatus::Recovered);
        assert!(page.items[0].s3_key.is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let api = MemoryBackend::empty();
        let request = UploadRequest {
            document_id: "d1".to_string(),
            path: "/nonexistent/tenantdesk/file.pdf".into(),
            file_name: "file.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size: 1,
        };
        let err = upload_document(&api, &request, Arc::new(|_, _| {})).await.unwrap_err();
        assert!(matches!(err, ApiError::File { .. }));
    }
}
