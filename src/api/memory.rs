//! In-memory backend
//!
//! Holds JSON rows per resource and answers list requests the way the real
//! server does: it parses the query parameters back into filters, sort and
//! page, and replies with a `{success, data, meta}` envelope. Mutations
//! update the stored rows so a refetch shows the new state.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Datelike, Duration as Days, NaiveDate, Utc};
use serde_json::{Map, Value, json};

use crate::export::{ExportFormat, rows_to_csv};
use crate::list::{DateRange, Filters, ListQuery, Resource, ResourceKind, SortOrder};
use crate::modal::{Method, Mutation};
use crate::models::{
    ActivityLog, DeletedDocument, ErrorLog, Invoice, PlatformMetrics, RevenueSummary, Tenant, TenantCounts,
    TenantStateRecord, TenantStatus,
};

use super::error::ApiError;
use super::{AdminApi, Progress, UploadTarget};

const PUT_CHUNK: u64 = 64 * 1024;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Mutex<BTreeMap<ResourceKind, Vec<Value>>>,
    /// Uploaded object sizes by storage key
    objects: Mutex<BTreeMap<String, u64>>,
    /// Status code the next call fails with
    fail_next: Mutex<Option<u16>>,
    latency: Duration,
}

/// Rebuild a query from wire parameters
fn parse_params(params: &[(String, String)]) -> ListQuery {
    let mut page = 1;
    let mut limit = 0;
    let mut sort_by = String::new();
    let mut order = SortOrder::Asc;
    let mut filters = Filters::new();
    let mut ranges: BTreeMap<String, DateRange> = BTreeMap::new();

    for (key, value) in params {
        match key.as_str() {
            "page" => page = value.parse().unwrap_or(1),
            "limit" => limit = value.parse().unwrap_or(0),
            "sortBy" => sort_by = value.clone(),
            "sortOrder" => order = if value == "desc" { SortOrder::Desc } else { SortOrder::Asc },
            _ => {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
                if let Some(field) = key.strip_suffix("From")
                    && date.is_some()
                {
                    ranges.entry(field.to_string()).or_default().from = date;
                } else if let Some(field) = key.strip_suffix("To")
                    && date.is_some()
                {
                    ranges.entry(field.to_string()).or_default().to = date;
                } else {
                    filters.set_text(key, value.clone());
                }
            }
        }
    }
    for (field, range) in ranges {
        filters.set_range(&field, range);
    }

    let mut query = ListQuery::new(limit, &sort_by, order);
    query.apply_filters(filters);
    query.set_page(page);
    query
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").or_else(|| row.get("_id")).and_then(Value::as_str)
}

fn find<'a>(rows: &'a mut [Value], id: &str) -> Option<&'a mut Map<String, Value>> {
    rows.iter_mut()
        .find(|r| row_id(r) == Some(id))
        .and_then(Value::as_object_mut)
}

fn body_str<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Typed view of the stored rows: deserializes, filters and sorts
fn select<R: Resource>(rows: &[Value], query: &ListQuery) -> Vec<(R, Value)> {
    let today = today();
    let mut matched: Vec<(R, Value)> = rows
        .iter()
        .filter_map(|v| serde_json::from_value::<R>(v.clone()).ok().map(|r| (r, v.clone())))
        .filter(|(r, _)| r.matches(&query.filters, today))
        .collect();
    if !query.sort.field.is_empty() {
        matched.sort_by(|(a, _), (b, _)| a.compare(b, &query.sort.field, query.sort.order));
    }
    matched
}

fn list_envelope<R: Resource>(rows: &[Value], query: &ListQuery) -> Value {
    let matched = select::<R>(rows, query);
    let total = matched.len() as u64;
    let limit = query.limit() as usize;
    let start = (query.page() as usize - 1) * limit;
    let data: Vec<Value> = matched.into_iter().skip(start).take(limit).map(|(_, v)| v).collect();
    json!({
        "success": true,
        "data": data,
        "meta": {
            "total": total,
            "page": query.page(),
            "limit": query.limit(),
            "totalPages": crate::list::total_pages(total, query.limit()),
        },
    })
}

fn export_csv<R: Resource>(rows: &[Value], filters: &Filters) -> String {
    let mut query = ListQuery::new(u32::MAX, R::default_sort().0, R::default_sort().1);
    query.apply_filters(filters.clone());
    let typed: Vec<R> = select::<R>(rows, &query).into_iter().map(|(r, _)| r).collect();
    rows_to_csv(&typed, today())
}

impl MemoryBackend {
    #[must_use]
    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seeded with a realistic spread of tenants, invoices and logs.
    /// Answers instantly unless `with_latency` is set.
    #[must_use]
    pub fn demo() -> Self {
        let backend = Self::default();
        if let Ok(mut rows) = backend.rows.lock() {
            *rows = seed(today());
        }
        backend
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert(&self, kind: ResourceKind, row: Value) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.entry(kind).or_default().push(row);
        }
    }

    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.rows
            .lock()
            .map(|rows| rows.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Make the next call fail with an HTTP status
    #[cfg(test)]
    pub fn fail_next(&self, status: u16) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(status);
        }
    }

    async fn round_trip(&self) -> Result<(), ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let injected = self.fail_next.lock().ok().and_then(|mut slot| slot.take());
        match injected {
            Some(status) => Err(ApiError::Status { status, message: None }),
            None => Ok(()),
        }
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut BTreeMap<ResourceKind, Vec<Value>>) -> T) -> Result<T, ApiError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| ApiError::Setup("memory store poisoned".to_string()))?;
        Ok(f(&mut rows))
    }

    fn apply(&self, mutation: &Mutation) -> Result<String, ApiError> {
        let segments: Vec<&str> = mutation.path.trim_matches('/').split('/').collect();
        let body = &mutation.body;
        let now = Utc::now().to_rfc3339();
        let not_found = || ApiError::not_found(mutation.path.clone());

        self.with_rows(|rows| match (mutation.method, segments.as_slice()) {
            (Method::Patch, ["tenants", id, "status"]) => {
                let tenants = rows.entry(ResourceKind::Tenants).or_default();
                let tenant = find(tenants, id).ok_or_else(not_found)?;
                let previous = tenant.get("status").cloned().unwrap_or(Value::Null);
                let name = tenant.get("name").cloned().unwrap_or(Value::Null);
                tenant.insert("status".into(), body["newStatus"].clone());
                let history = rows.entry(ResourceKind::TenantStates).or_default();
                let record = json!({
                    "id": format!("ts-{}", history.len() + 1),
                    "tenantId": id,
                    "tenantName": name,
                    "newStatus": body["newStatus"],
                    "previousStatus": previous,
                    "reason": body["reason"],
                    "effectiveDate": body["effectiveDate"],
                    "changedBy": "admin@tenantdesk.local",
                    "changedAt": now,
                });
                history.push(record);
                Ok("Status updated".to_string())
            }
            (Method::Patch, ["tenants", id, "trial"]) => {
                let tenant = find(rows.entry(ResourceKind::Tenants).or_default(), id).ok_or_else(not_found)?;
                match body_str(body, "action") {
                    "extend" => {
                        let days = body["extensionDays"].as_i64().unwrap_or_default();
                        let base = tenant
                            .get("trialEndsAt")
                            .and_then(Value::as_str)
                            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                            .unwrap_or_else(today);
                        tenant.insert("trialEndsAt".into(), json!((base + Days::days(days)).to_string()));
                    }
                    "set_end_date" => {
                        tenant.insert("trialEndsAt".into(), body["trialEndDate"].clone());
                    }
                    "end" => {
                        tenant.insert("status".into(), json!("suspended"));
                        tenant.insert("trialEndsAt".into(), json!(today().to_string()));
                    }
                    "convert" => {
                        let plan = body_str(body, "plan");
                        tenant.insert("status".into(), json!("active"));
                        tenant.insert("plan".into(), json!(plan));
                        tenant.insert(
                            "subscription".into(),
                            json!({"plan": plan, "status": "active", "amount": plan_price(plan), "billingCycle": "monthly"}),
                        );
                    }
                    other => return Err(ApiError::Rejected(format!("Unknown trial action `{}`", other))),
                }
                Ok("Trial updated".to_string())
            }
            (Method::Patch, ["tenants", id, "subscription"]) => {
                let tenant = find(rows.entry(ResourceKind::Tenants).or_default(), id).ok_or_else(not_found)?;
                let (sub_status, tenant_status) = match body_str(body, "action") {
                    "cancel" => ("cancelled", Some("subscription_cancelled")),
                    "suspend" => ("suspended", Some("suspended")),
                    "reactivate" => ("active", Some("active")),
                    "change_plan" => ("active", None),
                    other => return Err(ApiError::Rejected(format!("Unknown subscription action `{}`", other))),
                };
                if let Some(status) = tenant_status {
                    tenant.insert("status".into(), json!(status));
                }
                if let Some(plan) = body.get("newPlan").and_then(Value::as_str) {
                    tenant.insert("plan".into(), json!(plan));
                }
                let plan = tenant.get("plan").cloned().unwrap_or(Value::Null);
                let sub = tenant
                    .entry("subscription")
                    .or_insert_with(|| json!({"billingCycle": "monthly"}));
                if let Some(sub) = sub.as_object_mut() {
                    sub.insert("status".into(), json!(sub_status));
                    sub.insert("plan".into(), plan.clone());
                    sub.insert("amount".into(), json!(plan_price(plan.as_str().unwrap_or_default())));
                }
                Ok("Subscription updated".to_string())
            }
            (Method::Post, ["invoices", id, "pay"]) => {
                let invoice = find(rows.entry(ResourceKind::Invoices).or_default(), id).ok_or_else(not_found)?;
                if invoice.get("status").and_then(Value::as_str) == Some("paid") {
                    return Err(ApiError::Rejected("Invoice is already paid".to_string()));
                }
                let balance = invoice.get("amount").and_then(Value::as_f64).unwrap_or_default();
                let paid = body["amount"].as_f64().unwrap_or(balance);
                if paid + 0.005 < balance {
                    invoice.insert("amount".into(), json!(((balance - paid) * 100.0).round() / 100.0));
                    return Ok("Partial payment recorded".to_string());
                }
                invoice.insert("status".into(), json!("paid"));
                invoice.insert("paidAt".into(), body["paymentDate"].clone());
                Ok("Payment recorded".to_string())
            }
            (Method::Patch, ["error-logs", id, "resolve"]) => {
                let log = find(rows.entry(ResourceKind::Errors).or_default(), id).ok_or_else(not_found)?;
                log.insert("resolved".into(), json!(true));
                log.insert("resolutionNotes".into(), body["resolutionNotes"].clone());
                Ok("Error resolved".to_string())
            }
            (Method::Post, ["deleted-documents", id, "restore"]) => {
                let doc = find(rows.entry(ResourceKind::Documents).or_default(), id).ok_or_else(not_found)?;
                doc.insert("recoveryStatus".into(), json!("recovered"));
                Ok("Document restored".to_string())
            }
            _ => Err(not_found()),
        })?
    }

    fn metrics_snapshot(&self) -> Result<PlatformMetrics, ApiError> {
        self.with_rows(|rows| {
            fn typed<R: Resource>(rows: &BTreeMap<ResourceKind, Vec<Value>>) -> Vec<R> {
                rows.get(&R::KIND)
                    .map(|v| v.iter().filter_map(|r| serde_json::from_value(r.clone()).ok()).collect())
                    .unwrap_or_default()
            }
            let day = today();
            let tenants: Vec<Tenant> = typed(rows);
            let invoices: Vec<Invoice> = typed(rows);
            let errors: Vec<ErrorLog> = typed(rows);
            let documents: Vec<DeletedDocument> = typed(rows);
            let count = |s: TenantStatus| tenants.iter().filter(|t| t.status == s).count() as u64;
            let open_invoices = invoices.iter().filter(|i| {
                matches!(
                    i.effective_status(day),
                    crate::models::InvoiceStatus::Unpaid | crate::models::InvoiceStatus::Overdue
                )
            });
            let since = Utc::now() - Days::hours(24);

            PlatformMetrics {
                tenants: TenantCounts {
                    total: tenants.len() as u64,
                    active: count(TenantStatus::Active),
                    trial: count(TenantStatus::Trial),
                    suspended: count(TenantStatus::Suspended),
                    deactivated: count(TenantStatus::Deactivated),
                },
                revenue: RevenueSummary {
                    monthly_recurring: tenants
                        .iter()
                        .filter_map(|t| t.subscription.as_ref())
                        .filter(|s| s.status == crate::models::SubscriptionStatus::Active)
                        .map(|s| s.amount)
                        .sum(),
                    outstanding: open_invoices.clone().map(|i| i.amount).sum(),
                    overdue_invoices: open_invoices
                        .filter(|i| i.effective_status(day) == crate::models::InvoiceStatus::Overdue)
                        .count() as u64,
                    currency: Some("USD".to_string()),
                },
                total_users: tenants.iter().map(|t| u64::from(t.user_count)).sum(),
                storage_used: tenants.iter().map(|t| t.storage_used).sum(),
                errors_last_24h: errors.iter().filter(|e| e.created_at.is_some_and(|at| at >= since)).count() as u64,
                unresolved_errors: errors.iter().filter(|e| !e.resolved).count() as u64,
                pending_recoveries: documents
                    .iter()
                    .filter(|d| d.recovery_status == crate::models::RecoveryStatus::Pending)
                    .count() as u64,
            }
        })
    }
}

impl AdminApi for MemoryBackend {
    async fn list(&self, kind: ResourceKind, params: &[(String, String)]) -> Result<Value, ApiError> {
        self.round_trip().await?;
        let query = parse_params(params);
        self.with_rows(|rows| {
            let rows = rows.get(&kind).map(Vec::as_slice).unwrap_or_default();
            match kind {
                ResourceKind::Tenants => list_envelope::<Tenant>(rows, &query),
                ResourceKind::TenantStates => list_envelope::<TenantStateRecord>(rows, &query),
                ResourceKind::Invoices => list_envelope::<Invoice>(rows, &query),
                ResourceKind::Activity => list_envelope::<ActivityLog>(rows, &query),
                ResourceKind::Errors => list_envelope::<ErrorLog>(rows, &query),
                ResourceKind::Documents => list_envelope::<DeletedDocument>(rows, &query),
            }
        })
    }

    async fn mutate(&self, mutation: &Mutation) -> Result<Option<String>, ApiError> {
        self.round_trip().await?;
        let message = self.apply(mutation)?;
        tracing::debug!(path = %mutation.path, "memory mutation applied");
        Ok(Some(message))
    }

    async fn metrics(&self) -> Result<PlatformMetrics, ApiError> {
        self.round_trip().await?;
        self.metrics_snapshot()
    }

    /// Every format is rendered as CSV text
    async fn export(&self, kind: ResourceKind, _format: ExportFormat, filters: &Filters) -> Result<Vec<u8>, ApiError> {
        self.round_trip().await?;
        self.with_rows(|rows| {
            let rows = rows.get(&kind).map(Vec::as_slice).unwrap_or_default();
            let csv = match kind {
                ResourceKind::Tenants => export_csv::<Tenant>(rows, filters),
                ResourceKind::TenantStates => export_csv::<TenantStateRecord>(rows, filters),
                ResourceKind::Invoices => export_csv::<Invoice>(rows, filters),
                ResourceKind::Activity => export_csv::<ActivityLog>(rows, filters),
                ResourceKind::Errors => export_csv::<ErrorLog>(rows, filters),
                ResourceKind::Documents => export_csv::<DeletedDocument>(rows, filters),
            };
            csv.into_bytes()
        })
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.round_trip().await?;
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let ["invoices", id, "receipt"] = segments.as_slice() else {
            return Err(ApiError::not_found(path.to_string()));
        };
        self.with_rows(|rows| {
            let invoices = rows.entry(ResourceKind::Invoices).or_default();
            let invoice = find(invoices, id).ok_or_else(|| ApiError::not_found(path.to_string()))?;
            let invoice: Invoice = serde_json::from_value(Value::Object(invoice.clone())).map_err(|e| ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;
            Ok(format!(
                "RECEIPT\nInvoice: {}\nTenant: {}\nAmount: {}\nPaid: {}\n",
                invoice.invoice_number,
                invoice.tenant_name,
                crate::formatting::format_money(invoice.amount, &invoice.currency),
                crate::formatting::format_opt_date(invoice.paid_at),
            )
            .into_bytes())
        })?
    }

    async fn upload_target(&self, document_id: &str, file_name: &str, _content_type: &str) -> Result<UploadTarget, ApiError> {
        self.round_trip().await?;
        let key = format!("recovered/{}/{}", document_id, file_name);
        Ok(UploadTarget {
            upload_url: format!("memory://{}", key),
            s3_key: key,
        })
    }

    async fn put_object(
        &self,
        target: &UploadTarget,
        _content_type: &str,
        bytes: Vec<u8>,
        progress: Progress,
    ) -> Result<(), ApiError> {
        let total = bytes.len() as u64;
        let mut sent = 0;
        while sent < total {
            sent = (sent + PUT_CHUNK).min(total);
            progress(sent, total);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency / 10).await;
            }
        }
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(target.s3_key.clone(), total);
        }
        Ok(())
    }

    async fn confirm_upload(&self, document_id: &str, s3_key: &str, size: u64) -> Result<Option<String>, ApiError> {
        self.round_trip().await?;
        let stored = self.objects.lock().ok().and_then(|o| o.get(s3_key).copied());
        if stored != Some(size) {
            return Err(ApiError::Rejected(format!("No uploaded object at {}", s3_key)));
        }
        self.with_rows(|rows| {
            let doc = find(rows.entry(ResourceKind::Documents).or_default(), document_id)
                .ok_or_else(|| ApiError::not_found(format!("document {}", document_id)))?;
            doc.insert("s3Key".into(), json!(s3_key));
            doc.insert("recoveryStatus".into(), json!("recovered"));
            let name = doc.get("fileName").and_then(Value::as_str).unwrap_or("file").to_string();
            Ok(Some(format!("Uploaded replacement for {}", name)))
        })?
    }
}

fn plan_price(plan: &str) -> f64 {
    match plan {
        "starter" => 49.0,
        "professional" => 199.0,
        "enterprise" => 899.0,
        _ => 0.0,
    }
}

/// Deterministic generator for seed data
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n.max(1)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }
}

const NAME_HEADS: &[&str] = &[
    "Acme", "Northwind", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent", "Tyrell",
    "Cyberdyne",
];
const NAME_TAILS: &[&str] = &["Labs", "Health", "Logistics", "Legal", "Retail", "Studios"];
const STATUS_SPREAD: &[&str] = &[
    "active", "active", "active", "active", "trial", "trial", "suspended", "locked", "unverified", "deactivated",
    "subscription_cancelled",
];
const PLANS: &[&str] = &["starter", "professional", "enterprise"];
const ADMINS: &[&str] = &["ops@tenantdesk.local", "billing@tenantdesk.local", "support@tenantdesk.local"];
const ACTIONS: &[&str] = &[
    "user.login", "user.invite", "document.upload", "document.delete", "settings.update", "invoice.view", "role.change",
];
const SOURCES: &[&str] = &["api-gateway", "billing-worker", "storage", "mailer", "auth"];
const MESSAGES: &[&str] = &[
    "Timeout contacting payment provider",
    "S3 PutObject returned AccessDenied",
    "SMTP connection refused",
    "Token signature verification failed",
    "Background job exceeded retry budget",
    "Unexpected null in tenant settings",
];
const FILES: &[&str] = &["contract.pdf", "payroll.xlsx", "logo.png", "minutes.docx", "export.csv", "scan.pdf"];

fn seed(today: NaiveDate) -> BTreeMap<ResourceKind, Vec<Value>> {
    let mut rng = Lcg(0x5eed_7e4a);
    let mut rows: BTreeMap<ResourceKind, Vec<Value>> = BTreeMap::new();
    let stamp = |date: NaiveDate, secs: u64| format!("{}T{:02}:{:02}:00Z", date, (secs / 60) % 24, secs % 60);

    let mut tenants = Vec::new();
    for (i, head) in NAME_HEADS.iter().enumerate() {
        for tail in NAME_TAILS.iter().take(4) {
            let n = tenants.len();
            let status = *rng.pick(STATUS_SPREAD);
            let plan = *rng.pick(PLANS);
            let created = today - Days::days(rng.below(700) as i64 + 1);
            let subscription = (status != "trial" && status != "unverified").then(|| {
                let sub_status = match status {
                    "suspended" | "locked" => "suspended",
                    "subscription_cancelled" | "deactivated" => "cancelled",
                    _ if rng.below(8) == 0 => "past_due",
                    _ => "active",
                };
                json!({
                    "plan": plan,
                    "status": sub_status,
                    "amount": plan_price(plan),
                    "billingCycle": if rng.below(3) == 0 { "yearly" } else { "monthly" },
                    "currentPeriodEnd": (today + Days::days(rng.below(30) as i64)).to_string(),
                })
            });
            tenants.push(json!({
                "_id": format!("t{:03}", n + 1),
                "name": format!("{} {}", head, tail),
                "subdomain": format!("{}-{}", head.to_lowercase(), tail.to_lowercase()),
                "contactEmail": format!("admin@{}{}.example", head.to_lowercase(), i),
                "status": status,
                "plan": if status == "trial" { Value::Null } else { json!(plan) },
                "userCount": rng.below(240) + 1,
                "storageUsed": rng.below(50 * 1024) * 1024 * 1024 / 10,
                "trialEndsAt": if status == "trial" {
                    json!((today + Days::days(rng.below(20) as i64 - 3)).to_string())
                } else {
                    Value::Null
                },
                "createdAt": stamp(created, rng.next()),
                "subscription": subscription,
            }));
        }
    }

    let tenant_ref = |rng: &mut Lcg, tenants: &[Value]| -> (String, String) {
        let t = rng.pick(tenants);
        (
            row_id(t).unwrap_or_default().to_string(),
            t["name"].as_str().unwrap_or_default().to_string(),
        )
    };

    let mut states = Vec::new();
    for n in 0..60 {
        let (id, name) = tenant_ref(&mut rng, &tenants);
        let date = today - Days::days(rng.below(180) as i64);
        states.push(json!({
            "id": format!("ts-{}", n + 1),
            "tenantId": id,
            "tenantName": name,
            "newStatus": rng.pick(STATUS_SPREAD),
            "previousStatus": rng.pick(STATUS_SPREAD),
            "reason": rng.pick(&["Payment failure", "Customer request", "Terms violation review", "Trial conversion"]),
            "effectiveDate": date.to_string(),
            "changedBy": rng.pick(ADMINS),
            "changedAt": stamp(date, rng.next()),
        }));
    }

    let mut invoices = Vec::new();
    for n in 0..90 {
        let (id, name) = tenant_ref(&mut rng, &tenants);
        let issued = today - Days::days(rng.below(120) as i64);
        let due = issued + Days::days(30);
        let status = match rng.below(10) {
            0..=4 => "paid",
            5..=8 => "unpaid",
            _ => *rng.pick(&["cancelled", "refunded"]),
        };
        let plan = *rng.pick(PLANS);
        invoices.push(json!({
            "id": format!("inv-{}", n + 1),
            "invoiceNumber": format!("INV-{}-{:04}", issued.year(), n + 1),
            "tenantId": id,
            "tenantName": name,
            "amount": plan_price(plan) * (1 + rng.below(3)) as f64,
            "currency": "USD",
            "status": status,
            "issueDate": issued.to_string(),
            "dueDate": due.to_string(),
            "paidAt": if status == "paid" { json!((issued + Days::days(rng.below(30) as i64)).to_string()) } else { Value::Null },
        }));
    }

    let mut activity = Vec::new();
    for n in 0..150 {
        let (_, name) = tenant_ref(&mut rng, &tenants);
        let action = *rng.pick(ACTIONS);
        let date = today - Days::days(rng.below(45) as i64);
        activity.push(json!({
            "id": format!("act-{}", n + 1),
            "action": action,
            "entityType": action.split('.').next().unwrap_or("user"),
            "userEmail": format!("user{}@{}.example", rng.below(40), name.split(' ').next().unwrap_or("tenant").to_lowercase()),
            "tenantName": name,
            "ipAddress": format!("10.{}.{}.{}", rng.below(255), rng.below(255), rng.below(255)),
            "description": format!("{} via web console", action),
            "timestamp": stamp(date, rng.next()),
        }));
    }

    let mut errors = Vec::new();
    for n in 0..45 {
        let (_, name) = tenant_ref(&mut rng, &tenants);
        let date = today - Days::days(rng.below(14) as i64);
        let message = *rng.pick(MESSAGES);
        errors.push(json!({
            "id": format!("err-{}", n + 1),
            "level": rng.pick(&["info", "warning", "warning", "error", "error", "critical"]),
            "message": message,
            "source": rng.pick(SOURCES),
            "tenantName": if rng.below(4) == 0 { Value::Null } else { json!(name) },
            "resolved": rng.below(3) == 0,
            "stackTrace": format!("Error: {}\n    at handler (server.js:{}:{})", message, rng.below(900), rng.below(80)),
            "createdAt": stamp(date, rng.next()),
        }));
    }

    let mut documents = Vec::new();
    for n in 0..30 {
        let (id, name) = tenant_ref(&mut rng, &tenants);
        let date = today - Days::days(rng.below(60) as i64);
        documents.push(json!({
            "id": format!("doc-{}", n + 1),
            "fileName": rng.pick(FILES),
            "tenantId": id,
            "tenantName": name,
            "deletedBy": rng.pick(ADMINS),
            "deletedAt": stamp(date, rng.next()),
            "size": rng.below(20 * 1024 * 1024) + 1024,
            "recoveryStatus": rng.pick(&["pending", "pending", "in_progress", "recovered", "failed"]),
        }));
    }

    rows.insert(ResourceKind::Tenants, tenants);
    rows.insert(ResourceKind::TenantStates, states);
    rows.insert(ResourceKind::Invoices, invoices);
    rows.insert(ResourceKind::Activity, activity);
    rows.insert(ResourceKind::Errors, errors);
    rows.insert(ResourceKind::Documents, documents);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch_page;
    use crate::modal::FollowUp;

    fn two_tenants() -> MemoryBackend {
        let api = MemoryBackend::empty();
        api.insert(ResourceKind::Tenants, json!({"id": "t1", "name": "Acme", "status": "active"}));
        api.insert(ResourceKind::Tenants, json!({"id": "t2", "name": "Beta", "status": "suspended"}));
        api
    }

    fn names(page: &crate::list::Page<Tenant>) -> Vec<&str> {
        page.items.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_status_filter_then_clear() {
        let api = two_tenants();
        let mut query = ListQuery::new(20, "name", SortOrder::Asc);

        let mut filters = Filters::new();
        filters.set_text("status", "suspended");
        query.apply_filters(filters);
        let page = fetch_page::<Tenant, _>(&api, &query).await.unwrap();
        assert_eq!(names(&page), vec!["Beta"]);
        assert_eq!(page.total, 1);

        query.clear_filters();
        let page = fetch_page::<Tenant, _>(&api, &query).await.unwrap();
        assert_eq!(names(&page), vec!["Acme", "Beta"]);
    }

    #[tokio::test]
    async fn test_paging_and_sort() {
        let api = MemoryBackend::empty();
        for i in 0..25 {
            api.insert(ResourceKind::Tenants, json!({"id": format!("t{i}"), "name": format!("Tenant {i:02}")}));
        }
        let mut query = ListQuery::new(10, "name", SortOrder::Desc);
        query.set_page(3);
        let page = fetch_page::<Tenant, _>(&api, &query).await.unwrap();
        assert_eq!((page.total, page.total_pages, page.items.len()), (25, 3, 5));
        assert_eq!(page.items[0].name, "Tenant 04");

        // Past the end: empty page, caller clamps
        query.set_page(9);
        let page = fetch_page::<Tenant, _>(&api, &query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_parse_params_round_trip() {
        let mut query = ListQuery::new(50, "dueDate", SortOrder::Desc);
        let mut filters = Filters::new();
        filters.set_text("search", "acme");
        filters.set_range(
            "dueDate",
            DateRange {
                from: NaiveDate::from_ymd_opt(2026, 1, 1),
                to: None,
            },
        );
        query.apply_filters(filters);
        query.set_page(2);
        assert_eq!(parse_params(&query.to_params()), query);
    }

    #[tokio::test]
    async fn test_status_change_records_history() {
        let api = two_tenants();
        let mutation = Mutation {
            method: Method::Patch,
            path: "/tenants/t2/status".to_string(),
            body: json!({"newStatus": "active", "reason": "Paid up", "effectiveDate": "2026-03-01", "notifyUsers": true}),
            success: String::new(),
            follow_up: FollowUp::Refetch,
        };
        api.mutate(&mutation).await.unwrap();
        assert_eq!(api.count(ResourceKind::TenantStates), 1);

        let mut query = ListQuery::new(20, "name", SortOrder::Asc);
        let mut filters = Filters::new();
        filters.set_text("status", "active");
        query.apply_filters(filters);
        let page = fetch_page::<Tenant, _>(&api, &query).await.unwrap();
        assert_eq!(names(&page), vec!["Acme", "Beta"]);
    }

    #[tokio::test]
    async fn test_unknown_path_and_injected_failure() {
        let api = two_tenants();
        let mutation = Mutation {
            method: Method::Post,
            path: "/tenants/t1/launch".to_string(),
            body: Value::Null,
            success: String::new(),
            follow_up: FollowUp::Refetch,
        };
        assert_eq!(api.mutate(&mutation).await.unwrap_err().status(), Some(404));

        api.fail_next(503);
        let err = fetch_page::<Tenant, _>(&api, &ListQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        // Only the next call fails
        assert!(fetch_page::<Tenant, _>(&api, &ListQuery::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_demo_seed_is_consistent() {
        let api = MemoryBackend::demo();
        assert_eq!(api.count(ResourceKind::Tenants), 48);
        let metrics = api.metrics().await.unwrap();
        assert_eq!(metrics.tenants.total, 48);
        assert!(metrics.tenants.active > 0);

        let page = fetch_page::<Invoice, _>(&api, &ListQuery::new(20, "dueDate", SortOrder::Desc))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 20);
        assert!(page.items.windows(2).all(|w| w[0].due_date >= w[1].due_date));
    }

    #[tokio::test]
    async fn test_overdue_filter_includes_past_due_unpaid() {
        let api = MemoryBackend::empty();
        api.insert(
            ResourceKind::Invoices,
            json!({"id": "i1", "number": "INV-1", "status": "unpaid", "dueDate": "2020-01-01"}),
        );
        api.insert(ResourceKind::Invoices, json!({"id": "i2", "number": "INV-2", "status": "paid", "dueDate": "2020-01-01"}));
        let mut query = ListQuery::new(20, "dueDate", SortOrder::Desc);

        let mut filters = Filters::new();
        filters.set_text("status", "overdue");
        query.apply_filters(filters);
        let page = fetch_page::<Invoice, _>(&api, &query).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i1"]);

        let mut filters = Filters::new();
        filters.set_text("status", "unpaid");
        query.apply_filters(filters);
        let page = fetch_page::<Invoice, _>(&api, &query).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_export_applies_filters() {
        let api = two_tenants();
        let mut filters = Filters::new();
        filters.set_text("status", "suspended");
        let bytes = api.export(ResourceKind::Tenants, ExportFormat::Csv, &filters).await.unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Beta"));
    }
}
