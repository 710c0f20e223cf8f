//! Deleted-document recovery: restore from backup, or upload a replacement
//! file through the two-phase presigned-URL flow

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::list::RowAction;
use crate::models::{DeletedDocument, RecoveryStatus};

use super::form::{Form, ValidationErrors};
use super::{FollowUp, Method, Mutation, Submission, UploadRequest};

/// Largest file accepted for upload
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[must_use]
pub fn actions(doc: &DeletedDocument) -> Vec<RowAction> {
    let mut actions = vec![RowAction::View];
    if matches!(doc.recovery_status, RecoveryStatus::Pending | RecoveryStatus::Failed) {
        actions.push(RowAction::Restore);
    }
    if doc.recovery_status != RecoveryStatus::Recovered {
        actions.push(RowAction::Upload);
    }
    actions
}

#[must_use]
pub fn restore_form(doc: &DeletedDocument) -> Form {
    Form::new(format!("Restore {}", doc.file_name))
        .text("reason", "Reason", "")
        .toggle("notifyOwner", "Notify owner", true)
}

pub fn submit_restore(doc: &DeletedDocument, form: &Form) -> Result<Submission, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.min_len(form, "reason", "Reason", 3);
    errors.finish(|| {
        Submission::Mutation(Mutation {
            method: Method::Post,
            path: format!("/deleted-documents/{}/restore", doc.id),
            body: json!({
                "reason": form.raw("reason"),
                "notifyOwner": form.flag("notifyOwner"),
            }),
            success: format!("Restore of {} started", doc.file_name),
            follow_up: FollowUp::Refetch,
        })
    })
}

#[must_use]
pub fn upload_form(doc: &DeletedDocument) -> Form {
    Form::new(format!("Upload replacement for {}", doc.file_name)).text("filePath", "Local file", "")
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|h| h.join(rest)).unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

/// Validate a local file for upload against a document slot
pub fn prepare_upload(document_id: &str, raw_path: &str) -> Result<UploadRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if raw_path.trim().is_empty() {
        errors.add("filePath", "Choose a file to upload");
        return Err(errors);
    }
    let path = expand_home(raw_path.trim());
    match std::fs::metadata(&path) {
        Ok(meta) if !meta.is_file() => errors.add("filePath", "Not a regular file"),
        Ok(meta) if meta.len() == 0 => errors.add("filePath", "File is empty"),
        Ok(meta) if meta.len() > MAX_UPLOAD_BYTES => errors.add(
            "filePath",
            format!("File is larger than {} MB", MAX_UPLOAD_BYTES / (1024 * 1024)),
        ),
        Ok(meta) => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            return Ok(UploadRequest {
                document_id: document_id.to_string(),
                content_type: content_type_for(&path).to_string(),
                file_name,
                size: meta.len(),
                path,
            });
        }
        Err(e) => errors.add("filePath", format!("Cannot read file: {}", e)),
    }
    Err(errors)
}

pub fn submit_upload(doc: &DeletedDocument, form: &Form) -> Result<Submission, ValidationErrors> {
    prepare_upload(&doc.id, form.raw("filePath")).map(Submission::Upload)
}

/// MIME type from the file extension
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" | "log" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(status: RecoveryStatus) -> DeletedDocument {
        DeletedDocument {
            id: "d-1".to_string(),
            file_name: "contract.pdf".to_string(),
            recovery_status: status,
            ..DeletedDocument::default()
        }
    }

    #[test]
    fn test_actions_by_recovery_status() {
        assert_eq!(
            actions(&doc(RecoveryStatus::Pending)),
            vec![RowAction::View, RowAction::Restore, RowAction::Upload]
        );
        assert_eq!(
            actions(&doc(RecoveryStatus::InProgress)),
            vec![RowAction::View, RowAction::Upload]
        );
        assert_eq!(actions(&doc(RecoveryStatus::Recovered)), vec![RowAction::View]);
    }

    #[test]
    fn test_restore_requires_reason() {
        let d = doc(RecoveryStatus::Failed);
        let mut form = restore_form(&d);
        assert!(submit_restore(&d, &form).is_err());
        form.set("reason", "Deleted by mistake");
        let Ok(Submission::Mutation(m)) = submit_restore(&d, &form) else {
            panic!("expected a mutation");
        };
        assert_eq!(m.path, "/deleted-documents/d-1/restore");
        assert_eq!(m.body["notifyOwner"], true);
    }

    #[test]
    fn test_prepare_upload() {
        let dir = std::env::temp_dir().join(format!("tenantdesk-upload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("Scan.PDF");
        std::fs::write(&file, b"%PDF-1.7 test").unwrap();

        let request = prepare_upload("d-1", &file.to_string_lossy()).unwrap();
        assert_eq!(request.file_name, "Scan.PDF");
        assert_eq!(request.content_type, "application/pdf");
        assert_eq!(request.size, 13);

        let empty = dir.join("empty.txt");
        std::fs::write(&empty, b"").unwrap();
        let errors = prepare_upload("d-1", &empty.to_string_lossy()).unwrap_err();
        assert_eq!(errors.get("filePath"), Some("File is empty"));

        let errors = prepare_upload("d-1", &dir.to_string_lossy()).unwrap_err();
        assert_eq!(errors.get("filePath"), Some("Not a regular file"));

        assert!(prepare_upload("d-1", "   ").is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
