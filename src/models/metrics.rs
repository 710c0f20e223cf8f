//! Super-admin dashboard counters from `GET /super-admin/metrics`.

use serde::{Deserialize, Serialize};

use crate::list::Tone;

/// Tenant counts by status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantCounts {
    #[serde(alias = "totalTenants")]
    pub total: u64,
    #[serde(alias = "activeTenants")]
    pub active: u64,
    #[serde(alias = "trialTenants")]
    pub trial: u64,
    #[serde(alias = "suspendedTenants")]
    pub suspended: u64,
    #[serde(alias = "deactivatedTenants")]
    pub deactivated: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevenueSummary {
    #[serde(alias = "mrr")]
    pub monthly_recurring: f64,
    pub outstanding: f64,
    pub overdue_invoices: u64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformMetrics {
    pub tenants: TenantCounts,
    pub revenue: RevenueSummary,
    pub total_users: u64,
    /// Bytes across all tenants
    pub storage_used: u64,
    pub errors_last_24h: u64,
    pub unresolved_errors: u64,
    pub pending_recoveries: u64,
}

impl PlatformMetrics {
    #[must_use]
    pub fn currency(&self) -> &str {
        self.revenue.currency.as_deref().unwrap_or("USD")
    }

    /// Share of tenants that are active or trialing
    #[must_use]
    pub fn active_share(&self) -> f64 {
        if self.tenants.total == 0 {
            return 0.0;
        }
        (self.tenants.active + self.tenants.trial) as f64 * 100.0 / self.tenants.total as f64
    }

    #[must_use]
    pub fn error_tone(&self) -> Tone {
        match self.unresolved_errors {
            0 => Tone::Positive,
            1..=9 => Tone::Warning,
            _ => Tone::Negative,
        }
    }

    #[must_use]
    pub fn overdue_tone(&self) -> Tone {
        if self.revenue.overdue_invoices == 0 {
            Tone::Positive
        } else {
            Tone::Warning
        }
    }
}
