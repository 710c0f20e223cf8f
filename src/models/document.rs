//! Deleted documents awaiting recovery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::formatting::{format_bytes, format_timestamp};
use crate::list::{Column, FilterField, Matchable, Resource, ResourceKind, RowAction, SortKey, SortOrder};
use crate::modal::{Form, Submission, ValidationErrors, upload};

use super::status::RecoveryStatus;
use super::time::datetime_opt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDocument {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "name", alias = "originalName")]
    pub file_name: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub tenant_name: String,

    #[serde(default)]
    pub deleted_by: String,

    #[serde(default, with = "datetime_opt")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "fileSize")]
    pub size: u64,

    #[serde(default)]
    pub recovery_status: RecoveryStatus,

    /// Object key of an uploaded replacement, once one exists
    #[serde(default)]
    pub s3_key: Option<String>,
}

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::choice("recoveryStatus", "Recovery", RecoveryStatus::WIRE),
    FilterField::date_range("deletedAt", "Deleted"),
];

impl Matchable for DeletedDocument {
    fn search_text(&self) -> Vec<String> {
        vec![
            self.file_name.clone(),
            self.tenant_name.clone(),
            self.deleted_by.clone(),
            self.id.clone(),
        ]
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "name" | "fileName" => Some(self.file_name.clone()),
            "tenant" | "tenantName" => Some(self.tenant_name.clone()),
            "by" | "deletedBy" => Some(self.deleted_by.clone()),
            "recoveryStatus" | "status" => Some(self.recovery_status.as_str().to_string()),
            _ => None,
        }
    }

    fn field_date(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "deletedAt" => self.deleted_at.map(|dt| dt.date_naive()),
            _ => None,
        }
    }
}

impl Resource for DeletedDocument {
    const KIND: ResourceKind = ResourceKind::Documents;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("fileName", "File", 28, |d, _| d.file_name.clone()).sortable(),
            Column::<Self>::new("tenantName", "Tenant", 20, |d, _| d.tenant_name.clone()).sortable(),
            Column::<Self>::new("size", "Size", 9, |d, _| format_bytes(d.size)).sortable(),
            Column::<Self>::new("deletedBy", "Deleted by", 20, |d, _| d.deleted_by.clone()),
            Column::<Self>::new("deletedAt", "Deleted", 17, |d, _| {
                d.deleted_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())
            })
            .sortable(),
            Column::<Self>::new("recoveryStatus", "Recovery", 12, |d, _| d.recovery_status.label().to_string())
                .sortable()
                .toned(|d, _| d.recovery_status.tone()),
        ]
    }

    fn filter_fields() -> &'static [FilterField] {
        FILTERS
    }

    fn default_sort() -> (&'static str, SortOrder) {
        ("deletedAt", SortOrder::Desc)
    }

    fn details(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("File", self.file_name.clone()),
            ("Tenant", format!("{} ({})", self.tenant_name, self.tenant_id)),
            ("Size", format_bytes(self.size)),
            ("Deleted by", self.deleted_by.clone()),
            ("Deleted at", self.deleted_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())),
            ("Recovery", self.recovery_status.label().to_string()),
            ("Replacement", self.s3_key.clone().unwrap_or_else(|| "-".to_string())),
        ]
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "fileName" => SortKey::text(&self.file_name),
            "tenantName" => SortKey::text(&self.tenant_name),
            "size" => SortKey::Int(i64::try_from(self.size).unwrap_or(i64::MAX)),
            "deletedAt" => self.deleted_at.map(|dt| SortKey::Int(dt.timestamp())).unwrap_or(SortKey::Missing),
            "recoveryStatus" => SortKey::text(self.recovery_status.as_str()),
            _ => SortKey::Missing,
        }
    }

    fn actions(&self, _today: NaiveDate) -> Vec<RowAction> {
        upload::actions(self)
    }

    fn form_for(&self, action: RowAction, _today: NaiveDate) -> Option<Form> {
        match action {
            RowAction::Restore => Some(upload::restore_form(self)),
            RowAction::Upload => Some(upload::upload_form(self)),
            _ => None,
        }
    }

    fn submit(&self, action: RowAction, form: &Form, _today: NaiveDate) -> Result<Submission, ValidationErrors> {
        match action {
            RowAction::Restore => upload::submit_restore(self, form),
            RowAction::Upload => upload::submit_upload(self, form),
            _ => Err(ValidationErrors::general(format!("{} does not apply to documents", action.label()))),
        }
    }
}
