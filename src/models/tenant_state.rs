//! Tenant state-change history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::formatting::{format_opt_date, format_timestamp, truncate_string};
use crate::list::{Column, FilterField, Matchable, Resource, ResourceKind, SortKey, SortOrder};

use super::status::TenantStatus;
use super::time::{date_opt, datetime_opt};

/// One recorded transition of a tenant's status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStateRecord {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub tenant_name: String,

    #[serde(default, alias = "newStatus")]
    pub status: TenantStatus,

    #[serde(default)]
    pub previous_status: Option<TenantStatus>,

    #[serde(default)]
    pub reason: String,

    #[serde(default, with = "date_opt")]
    pub effective_date: Option<NaiveDate>,

    #[serde(default)]
    pub changed_by: String,

    #[serde(default, with = "datetime_opt")]
    pub changed_at: Option<DateTime<Utc>>,
}

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::choice("status", "New status", TenantStatus::WIRE),
    FilterField::date_range("effectiveDate", "Effective"),
];

impl Matchable for TenantStateRecord {
    fn search_text(&self) -> Vec<String> {
        vec![
            self.tenant_name.clone(),
            self.tenant_id.clone(),
            self.reason.clone(),
            self.changed_by.clone(),
        ]
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "tenant" | "tenantName" => Some(self.tenant_name.clone()),
            "tenantId" => Some(self.tenant_id.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "previousStatus" => self.previous_status.map(|s| s.as_str().to_string()),
            "by" | "changedBy" => Some(self.changed_by.clone()),
            _ => None,
        }
    }

    fn field_date(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "effectiveDate" => self.effective_date,
            "changedAt" => self.changed_at.map(|dt| dt.date_naive()),
            _ => None,
        }
    }
}

impl Resource for TenantStateRecord {
    const KIND: ResourceKind = ResourceKind::TenantStates;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("tenantName", "Tenant", 22, |r, _| r.tenant_name.clone()).sortable(),
            Column::<Self>::new("previousStatus", "From", 12, |r, _| {
                r.previous_status.map(|s| s.label().to_string()).unwrap_or_else(|| "-".to_string())
            }),
            Column::<Self>::new("status", "To", 12, |r, _| r.status.label().to_string())
                .sortable()
                .toned(|r, _| r.status.tone()),
            Column::<Self>::new("reason", "Reason", 30, |r, _| truncate_string(&r.reason, 30)),
            Column::<Self>::new("effectiveDate", "Effective", 11, |r, _| format_opt_date(r.effective_date)).sortable(),
            Column::<Self>::new("changedBy", "By", 16, |r, _| r.changed_by.clone()),
        ]
    }

    fn filter_fields() -> &'static [FilterField] {
        FILTERS
    }

    fn default_sort() -> (&'static str, SortOrder) {
        ("effectiveDate", SortOrder::Desc)
    }

    fn details(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Tenant", format!("{} ({})", self.tenant_name, self.tenant_id)),
            (
                "Previous status",
                self.previous_status.map(|s| s.label().to_string()).unwrap_or_else(|| "-".to_string()),
            ),
            ("New status", self.status.label().to_string()),
            ("Reason", self.reason.clone()),
            ("Effective", format_opt_date(self.effective_date)),
            ("Changed by", self.changed_by.clone()),
            ("Changed at", self.changed_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())),
        ]
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "tenantName" => SortKey::text(&self.tenant_name),
            "status" => SortKey::text(self.status.as_str()),
            "effectiveDate" => self
                .effective_date
                .map(|d| SortKey::Text(d.to_string()))
                .unwrap_or(SortKey::Missing),
            "changedAt" => self.changed_at.map(|dt| SortKey::Int(dt.timestamp())).unwrap_or(SortKey::Missing),
            _ => SortKey::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_row_accepts_new_status_alias() {
        let json = r#"{
            "id": "h1", "tenantId": "t1", "tenantName": "Acme",
            "newStatus": "suspended", "previousStatus": "active",
            "reason": "Unpaid invoices", "effectiveDate": "2026-02-01",
            "changedBy": "root@platform.test"
        }"#;
        let row: TenantStateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(row.status, TenantStatus::Suspended);
        assert_eq!(row.previous_status, Some(TenantStatus::Active));
        assert_eq!(row.actions(NaiveDate::MIN), vec![crate::list::RowAction::View]);
    }
}
