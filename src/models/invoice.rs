//! Tenant invoices.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::formatting::{format_money, format_opt_date};
use crate::list::{
    Column, FilterField, Filters, Matchable, Resource, ResourceKind, RowAction, SortKey, SortOrder, Tone, row_matches,
};
use crate::modal::{ActionPlan, Form, Submission, ValidationErrors, payment};

use super::status::InvoiceStatus;
use super::time::date_opt;

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "number")]
    pub invoice_number: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub tenant_name: String,

    #[serde(default, alias = "total")]
    pub amount: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub status: InvoiceStatus,

    #[serde(default, alias = "issuedAt", with = "date_opt")]
    pub issue_date: Option<NaiveDate>,

    #[serde(default, with = "date_opt")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, alias = "paidDate", with = "date_opt")]
    pub paid_at: Option<NaiveDate>,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            id: String::new(),
            invoice_number: String::new(),
            tenant_id: String::new(),
            tenant_name: String::new(),
            amount: 0.0,
            currency: default_currency(),
            status: InvoiceStatus::default(),
            issue_date: None,
            due_date: None,
            paid_at: None,
        }
    }
}

impl Invoice {
    /// Status as the console treats it: an unpaid invoice past its due date is overdue
    #[must_use]
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match (self.status, self.due_date) {
            (InvoiceStatus::Unpaid, Some(due)) if due < today => InvoiceStatus::Overdue,
            (status, _) => status,
        }
    }

    #[must_use]
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if self.effective_status(today) != InvoiceStatus::Overdue {
            return None;
        }
        self.due_date.map(|due| (today - due).num_days().max(0))
    }
}

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::choice("status", "Status", InvoiceStatus::WIRE),
    FilterField::date_range("dueDate", "Due"),
];

impl Matchable for Invoice {
    fn search_text(&self) -> Vec<String> {
        vec![self.invoice_number.clone(), self.tenant_name.clone(), self.id.clone()]
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "number" | "invoiceNumber" => Some(self.invoice_number.clone()),
            "tenant" | "tenantName" => Some(self.tenant_name.clone()),
            "tenantId" => Some(self.tenant_id.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "currency" => Some(self.currency.clone()),
            _ => None,
        }
    }

    fn field_date(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "dueDate" => self.due_date,
            "issueDate" => self.issue_date,
            "paidAt" => self.paid_at,
            _ => None,
        }
    }
}

fn status_cell(invoice: &Invoice, today: NaiveDate) -> String {
    match invoice.days_overdue(today) {
        Some(days) if days > 0 => format!("Overdue ({}d)", days),
        _ => invoice.effective_status(today).label().to_string(),
    }
}

fn status_tone(invoice: &Invoice, today: NaiveDate) -> Tone {
    invoice.effective_status(today).tone()
}

impl Resource for Invoice {
    const KIND: ResourceKind = ResourceKind::Invoices;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("invoiceNumber", "Invoice", 12, |i, _| i.invoice_number.clone()).sortable(),
            Column::<Self>::new("tenantName", "Tenant", 22, |i, _| i.tenant_name.clone()).sortable(),
            Column::<Self>::new("amount", "Amount", 12, |i, _| format_money(i.amount, &i.currency)).sortable(),
            Column::<Self>::new("status", "Status", 14, status_cell).sortable().toned(status_tone),
            Column::<Self>::new("issueDate", "Issued", 11, |i, _| format_opt_date(i.issue_date)).sortable(),
            Column::<Self>::new("dueDate", "Due", 11, |i, _| format_opt_date(i.due_date)).sortable(),
            Column::<Self>::new("paidAt", "Paid", 11, |i, _| format_opt_date(i.paid_at)),
        ]
    }

    fn filter_fields() -> &'static [FilterField] {
        FILTERS
    }

    fn default_sort() -> (&'static str, SortOrder) {
        ("dueDate", SortOrder::Desc)
    }

    fn details(&self, today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.clone()),
            ("Invoice", self.invoice_number.clone()),
            ("Tenant", format!("{} ({})", self.tenant_name, self.tenant_id)),
            ("Amount", format_money(self.amount, &self.currency)),
            ("Status", status_cell(self, today)),
            ("Issued", format_opt_date(self.issue_date)),
            ("Due", format_opt_date(self.due_date)),
            ("Paid", format_opt_date(self.paid_at)),
        ]
    }

    /// Status filters see the effective status, as the table does
    fn matches(&self, filters: &Filters, today: NaiveDate) -> bool {
        let status = self.effective_status(today);
        if status == self.status {
            return row_matches(self, filters);
        }
        let effective = Invoice { status, ..self.clone() };
        row_matches(&effective, filters)
    }

    fn sort_key(&self, field: &str) -> SortKey {
        let date_key = |d: Option<NaiveDate>| d.map(|d| SortKey::Text(d.to_string())).unwrap_or(SortKey::Missing);
        match field {
            "invoiceNumber" => SortKey::text(&self.invoice_number),
            "tenantName" => SortKey::text(&self.tenant_name),
            "amount" => SortKey::decimal(self.amount),
            "status" => SortKey::text(self.status.as_str()),
            "issueDate" => date_key(self.issue_date),
            "dueDate" => date_key(self.due_date),
            "paidAt" => date_key(self.paid_at),
            _ => SortKey::Missing,
        }
    }

    fn actions(&self, today: NaiveDate) -> Vec<RowAction> {
        payment::actions(self, today)
    }

    fn plan(&self, action: RowAction, today: NaiveDate) -> Option<ActionPlan> {
        if !self.actions(today).contains(&action) {
            return None;
        }
        match action {
            RowAction::View => Some(ActionPlan::Detail),
            RowAction::Pay => Some(ActionPlan::Form(payment::pay_form(self, today))),
            RowAction::Receipt => Some(ActionPlan::Immediate(payment::receipt(self))),
            _ => None,
        }
    }

    fn form_for(&self, action: RowAction, today: NaiveDate) -> Option<Form> {
        (action == RowAction::Pay).then(|| payment::pay_form(self, today))
    }

    fn submit(&self, action: RowAction, form: &Form, today: NaiveDate) -> Result<Submission, ValidationErrors> {
        match action {
            RowAction::Pay => payment::submit_payment(self, form, today),
            _ => Err(ValidationErrors::general(format!("{} does not apply to invoices", action.label()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_status() {
        let today = date(2026, 4, 10);
        let mut inv = Invoice {
            status: InvoiceStatus::Unpaid,
            due_date: Some(date(2026, 4, 10)),
            ..Invoice::default()
        };
        // Due today is not yet overdue
        assert_eq!(inv.effective_status(today), InvoiceStatus::Unpaid);

        inv.due_date = Some(date(2026, 4, 3));
        assert_eq!(inv.effective_status(today), InvoiceStatus::Overdue);
        assert_eq!(inv.days_overdue(today), Some(7));
        assert_eq!(status_cell(&inv, today), "Overdue (7d)");

        // Paid invoices never become overdue
        inv.status = InvoiceStatus::Paid;
        assert_eq!(inv.effective_status(today), InvoiceStatus::Paid);
    }

    #[test]
    fn test_detail_status_matches_table() {
        let today = date(2026, 4, 10);
        let inv = Invoice {
            status: InvoiceStatus::Unpaid,
            due_date: Some(date(2026, 4, 1)),
            ..Invoice::default()
        };
        let status = inv.details(today).into_iter().find(|(label, _)| *label == "Status").map(|(_, v)| v);
        assert_eq!(status.as_deref(), Some("Overdue (9d)"));

        let mut filters = Filters::new();
        filters.set_text("status", "overdue");
        assert!(inv.matches(&filters, today));
        assert!(!inv.matches(&filters, date(2026, 3, 31)));
    }

    #[test]
    fn test_receipt_is_immediate() {
        let today = date(2026, 4, 10);
        let paid = Invoice {
            id: "i1".to_string(),
            invoice_number: "INV-1".to_string(),
            status: InvoiceStatus::Paid,
            ..Invoice::default()
        };
        let Some(ActionPlan::Immediate(Submission::Download(download))) = paid.plan(RowAction::Receipt, today) else {
            panic!("receipt should download straight away");
        };
        assert_eq!(download.file_name, "Receipt_INV-1.pdf");
        assert!(paid.plan(RowAction::Pay, today).is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let inv: Invoice = serde_json::from_str(r#"{"id": "i2", "number": "INV-2", "total": 99.5, "status": "unpaid"}"#).unwrap();
        assert_eq!(inv.invoice_number, "INV-2");
        assert_eq!(inv.amount, 99.5);
        assert_eq!(inv.currency, "USD");
    }
}
