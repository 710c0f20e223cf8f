//! Platform activity (audit) log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::formatting::{format_timestamp, truncate_string};
use crate::list::{ApplyMode, Column, FilterField, Matchable, Resource, ResourceKind, SortKey, SortOrder};

use super::time::datetime_opt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub action: String,

    /// Resource type the action touched, e.g. `document`
    #[serde(default, alias = "entityType")]
    pub resource: String,

    #[serde(default)]
    pub user_email: String,

    #[serde(default)]
    pub tenant_name: String,

    #[serde(default)]
    pub ip_address: String,

    #[serde(default, alias = "description")]
    pub details: String,

    #[serde(default, alias = "timestamp", with = "datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::text("action", "Action"),
    FilterField::date_range("date", "Date"),
];

impl Matchable for ActivityLog {
    fn search_text(&self) -> Vec<String> {
        vec![
            self.action.clone(),
            self.resource.clone(),
            self.user_email.clone(),
            self.tenant_name.clone(),
            self.details.clone(),
        ]
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "action" => Some(self.action.clone()),
            "resource" => Some(self.resource.clone()),
            "user" | "userEmail" => Some(self.user_email.clone()),
            "tenant" | "tenantName" => Some(self.tenant_name.clone()),
            "ip" => Some(self.ip_address.clone()),
            _ => None,
        }
    }

    fn field_date(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "date" | "createdAt" => self.created_at.map(|dt| dt.date_naive()),
            _ => None,
        }
    }
}

impl Resource for ActivityLog {
    const KIND: ResourceKind = ResourceKind::Activity;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("createdAt", "When", 17, |a, _| {
                a.created_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())
            })
            .sortable(),
            Column::<Self>::new("userEmail", "User", 24, |a, _| a.user_email.clone()).sortable(),
            Column::<Self>::new("action", "Action", 18, |a, _| a.action.clone()).sortable(),
            Column::<Self>::new("resource", "Resource", 12, |a, _| a.resource.clone()),
            Column::<Self>::new("tenantName", "Tenant", 18, |a, _| a.tenant_name.clone()),
            Column::<Self>::new("details", "Details", 30, |a, _| truncate_string(&a.details, 30)),
        ]
    }

    fn filter_fields() -> &'static [FilterField] {
        FILTERS
    }

    fn default_sort() -> (&'static str, SortOrder) {
        ("createdAt", SortOrder::Desc)
    }

    fn filter_mode() -> ApplyMode {
        ApplyMode::Live
    }

    fn details(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("When", self.created_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())),
            ("User", self.user_email.clone()),
            ("Action", self.action.clone()),
            ("Resource", self.resource.clone()),
            ("Tenant", self.tenant_name.clone()),
            ("IP address", self.ip_address.clone()),
            ("Details", self.details.clone()),
        ]
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => self.created_at.map(|dt| SortKey::Int(dt.timestamp())).unwrap_or(SortKey::Missing),
            "userEmail" => SortKey::text(&self.user_email),
            "action" => SortKey::text(&self.action),
            _ => SortKey::Missing,
        }
    }
}
