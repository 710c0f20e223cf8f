//! The `Resource` trait binds an entity type to its list endpoint, table
//! columns, filters and row actions
//!
//! Everything generic in the crate (API client, in-memory backend, CLI
//! tables, TUI pages) is written once against this trait.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::modal::{ActionPlan, Form, Submission, ValidationErrors};

use super::filter::{ApplyMode, FilterField};
use super::matching::{Matchable, row_matches};
use super::query::{Filters, SortOrder};
use super::table::{Column, RowAction};

/// Every paginated list the console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum ResourceKind {
    Tenants,
    TenantStates,
    Invoices,
    Activity,
    Errors,
    Documents,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Tenants,
        ResourceKind::TenantStates,
        ResourceKind::Invoices,
        ResourceKind::Activity,
        ResourceKind::Errors,
        ResourceKind::Documents,
    ];

    /// List endpoint, relative to the API base URL
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceKind::Tenants => "/tenants",
            ResourceKind::TenantStates => "/tenant-states",
            ResourceKind::Invoices => "/invoices",
            ResourceKind::Activity => "/activity-logs",
            ResourceKind::Errors => "/error-logs",
            ResourceKind::Documents => "/deleted-documents",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Tenants => "Tenants",
            ResourceKind::TenantStates => "Tenant States",
            ResourceKind::Invoices => "Invoices",
            ResourceKind::Activity => "Activity",
            ResourceKind::Errors => "Error Logs",
            ResourceKind::Documents => "Deleted Documents",
        }
    }

    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Tenants => "Tenant",
            ResourceKind::TenantStates => "State change",
            ResourceKind::Invoices => "Invoice",
            ResourceKind::Activity => "Activity",
            ResourceKind::Errors => "Error",
            ResourceKind::Documents => "Document",
        }
    }

    /// Resource name used in export file names
    #[must_use]
    pub fn export_name(self) -> &'static str {
        match self {
            ResourceKind::Tenants => "Tenants",
            ResourceKind::TenantStates => "TenantStates",
            ResourceKind::Invoices => "Invoices",
            ResourceKind::Activity => "ActivityLogs",
            ResourceKind::Errors => "ErrorLogs",
            ResourceKind::Documents => "DeletedDocuments",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Comparable value used by the in-memory backend to sort rows
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Missing,
    Int(i64),
    Text(String),
}

impl SortKey {
    pub fn text(s: &str) -> Self {
        SortKey::Text(s.to_lowercase())
    }

    /// Money and other decimals sort on hundredths
    pub fn decimal(n: f64) -> Self {
        SortKey::Int((n * 100.0).round() as i64)
    }
}

/// A list-managed entity
pub trait Resource: Matchable + Clone + std::fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn columns() -> Vec<Column<Self>>;

    fn filter_fields() -> &'static [FilterField];

    fn default_sort() -> (&'static str, SortOrder);

    fn filter_mode() -> ApplyMode {
        ApplyMode::Explicit
    }

    /// Label/value pairs shown by the detail modal
    fn details(&self, today: NaiveDate) -> Vec<(&'static str, String)>;

    fn sort_key(&self, field: &str) -> SortKey;

    /// Actions available on this row
    fn actions(&self, _today: NaiveDate) -> Vec<RowAction> {
        vec![RowAction::View]
    }

    /// How an action starts, `None` when it does not apply to this row
    fn plan(&self, action: RowAction, today: NaiveDate) -> Option<ActionPlan> {
        match action {
            RowAction::View => Some(ActionPlan::Detail),
            _ if self.actions(today).contains(&action) => self.form_for(action, today).map(ActionPlan::Form),
            _ => None,
        }
    }

    fn form_for(&self, _action: RowAction, _today: NaiveDate) -> Option<Form> {
        None
    }

    /// Validate a submitted form into work for the backend
    fn submit(&self, action: RowAction, _form: &Form, _today: NaiveDate) -> Result<Submission, ValidationErrors> {
        Err(ValidationErrors::general(format!(
            "{} is not available for {}",
            action.label(),
            Self::KIND.title().to_lowercase()
        )))
    }

    fn matches(&self, filters: &Filters, _today: NaiveDate) -> bool {
        row_matches(self, filters)
    }

    fn compare(&self, other: &Self, field: &str, order: SortOrder) -> Ordering {
        let ord = self.sort_key(field).cmp(&other.sort_key(field));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}
