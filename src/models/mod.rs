//! Data models for the admin API responses.
//!
//! One module per entity, plus the shared status enums, tolerant timestamp
//! adapters and the application config.

mod activity;
mod config;
mod document;
mod error_log;
mod invoice;
mod metrics;
mod status;
mod tenant;
mod tenant_state;
pub mod time;

pub use activity::ActivityLog;
pub use config::{AppConfig, ApiConfig, BehaviorConfig, DisplayConfig, ExportConfig, ListConfig};
pub use document::DeletedDocument;
pub use error_log::ErrorLog;
pub use invoice::Invoice;
pub use metrics::{PlatformMetrics, RevenueSummary, TenantCounts};
pub use status::{InvoiceStatus, LogLevel, RecoveryStatus, SubscriptionStatus, TenantStatus};
pub use tenant::{Subscription, Tenant};
pub use tenant_state::TenantStateRecord;
