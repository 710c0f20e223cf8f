//! Tenant accounts and their subscriptions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::formatting::{format_bytes, format_money, format_opt_date, format_timestamp};
use crate::list::{
    ApplyMode, Column, FilterField, Matchable, Resource, ResourceKind, RowAction, SortKey, SortOrder,
};
use crate::modal::{Form, Submission, ValidationErrors, tenant as tenant_modal};

use super::status::{SubscriptionStatus, TenantStatus};
use super::time::{date_opt, datetime_opt};

/// Billing subscription attached to a tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default, alias = "planName")]
    pub plan: String,

    #[serde(default)]
    pub status: SubscriptionStatus,

    #[serde(default)]
    pub amount: f64,

    #[serde(default)]
    pub billing_cycle: String,

    #[serde(default, with = "date_opt")]
    pub current_period_end: Option<NaiveDate>,
}

/// One tenant account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub subdomain: String,

    #[serde(default, alias = "contactEmail")]
    pub email: String,

    #[serde(default)]
    pub status: TenantStatus,

    #[serde(default)]
    pub plan: Option<String>,

    #[serde(default)]
    pub user_count: u32,

    /// Bytes of document storage in use
    #[serde(default)]
    pub storage_used: u64,

    #[serde(default, with = "date_opt")]
    pub trial_ends_at: Option<NaiveDate>,

    #[serde(default, with = "datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub subscription: Option<Subscription>,
}

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::choice("status", "Status", TenantStatus::WIRE),
    FilterField::choice("plan", "Plan", tenant_modal::PLANS),
    FilterField::date_range("createdAt", "Created"),
];

impl Matchable for Tenant {
    fn search_text(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.subdomain.clone(),
            self.email.clone(),
            self.id.clone(),
        ]
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "subdomain" => Some(self.subdomain.clone()),
            "email" => Some(self.email.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "plan" => self.plan.clone(),
            _ => None,
        }
    }

    fn field_date(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "createdAt" => self.created_at.map(|dt| dt.date_naive()),
            "trialEndsAt" => self.trial_ends_at,
            _ => None,
        }
    }
}

impl Resource for Tenant {
    const KIND: ResourceKind = ResourceKind::Tenants;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("name", "Name", 24, |t, _| t.name.clone()).sortable(),
            Column::<Self>::new("subdomain", "Subdomain", 16, |t, _| t.subdomain.clone()),
            Column::<Self>::new("status", "Status", 14, |t, _| t.status.label().to_string())
                .sortable()
                .toned(|t, _| t.status.tone()),
            Column::<Self>::new("plan", "Plan", 12, |t, _| t.plan.clone().unwrap_or_else(|| "-".to_string())).sortable(),
            Column::<Self>::new("userCount", "Users", 6, |t, _| t.user_count.to_string()).sortable(),
            Column::<Self>::new("trialEndsAt", "Trial ends", 11, |t, _| format_opt_date(t.trial_ends_at)),
            Column::<Self>::new("createdAt", "Created", 11, |t, _| {
                t.created_at.map(|dt| dt.date_naive().to_string()).unwrap_or_else(|| "-".to_string())
            })
            .sortable(),
        ]
    }

    fn filter_fields() -> &'static [FilterField] {
        FILTERS
    }

    fn default_sort() -> (&'static str, SortOrder) {
        ("createdAt", SortOrder::Desc)
    }

    fn filter_mode() -> ApplyMode {
        ApplyMode::Explicit
    }

    fn details(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("ID", self.id.clone()),
            ("Name", self.name.clone()),
            ("Subdomain", self.subdomain.clone()),
            ("Email", self.email.clone()),
            ("Status", self.status.label().to_string()),
            ("Plan", self.plan.clone().unwrap_or_else(|| "-".to_string())),
            ("Users", self.user_count.to_string()),
            ("Storage", format_bytes(self.storage_used)),
            ("Trial ends", format_opt_date(self.trial_ends_at)),
            ("Created", self.created_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())),
        ];
        if let Some(sub) = &self.subscription {
            rows.push(("Subscription", format!("{} ({})", sub.plan, sub.status.label())));
            rows.push((
                "Billing",
                format!("{} / {}", format_money(sub.amount, "USD"), sub.billing_cycle),
            ));
            rows.push(("Renews", format_opt_date(sub.current_period_end)));
        }
        rows
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "name" => SortKey::text(&self.name),
            "subdomain" => SortKey::text(&self.subdomain),
            "status" => SortKey::text(self.status.as_str()),
            "plan" => self.plan.as_deref().map(SortKey::text).unwrap_or(SortKey::Missing),
            "userCount" => SortKey::Int(i64::from(self.user_count)),
            "createdAt" => self.created_at.map(|dt| SortKey::Int(dt.timestamp())).unwrap_or(SortKey::Missing),
            "trialEndsAt" => self
                .trial_ends_at
                .map(|d| SortKey::Text(d.to_string()))
                .unwrap_or(SortKey::Missing),
            _ => SortKey::Missing,
        }
    }

    fn actions(&self, _today: NaiveDate) -> Vec<RowAction> {
        tenant_modal::actions(self)
    }

    fn form_for(&self, action: RowAction, today: NaiveDate) -> Option<Form> {
        tenant_modal::form_for(self, action, today)
    }

    fn submit(&self, action: RowAction, form: &Form, today: NaiveDate) -> Result<Submission, ValidationErrors> {
        tenant_modal::submit(self, action, form, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::Filters;

    #[test]
    fn test_deserialize_with_aliases() {
        let json = r#"{
            "_id": "64f0c1",
            "name": "Acme Corp",
            "contactEmail": "ops@acme.test",
            "status": "trial",
            "userCount": 12,
            "trialEndsAt": "2026-05-01T00:00:00.000Z",
            "createdAt": "2026-01-15T09:30:00Z",
            "subscription": {"planName": "starter", "status": "past_due", "amount": 49}
        }"#;
        let tenant: Tenant = serde_json::from_str(json).unwrap();
        assert_eq!(tenant.id, "64f0c1");
        assert_eq!(tenant.email, "ops@acme.test");
        assert_eq!(tenant.status, TenantStatus::Trial);
        assert_eq!(tenant.trial_ends_at, NaiveDate::from_ymd_opt(2026, 5, 1));
        let sub = tenant.subscription.unwrap();
        assert_eq!(sub.plan, "starter");
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let tenant: Tenant = serde_json::from_str(r#"{"id": "x", "name": "X", "status": "archived"}"#).unwrap();
        assert_eq!(tenant.status, TenantStatus::Unknown);
        assert_eq!(tenant.actions(NaiveDate::MIN), tenant_modal::actions(&tenant));
    }

    #[test]
    fn test_status_filter_matches_wire_name() {
        let tenant = Tenant {
            id: "1".to_string(),
            name: "Beta".to_string(),
            status: TenantStatus::Suspended,
            ..Tenant::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let mut filters = Filters::new();
        filters.set_text("status", "suspended");
        assert!(tenant.matches(&filters, today));
        filters.set_text("status", "active");
        assert!(!tenant.matches(&filters, today));
    }
}
