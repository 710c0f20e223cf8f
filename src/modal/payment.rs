//! Invoice payment and receipt download
//!
//! Payment is the one mutation whose outcome is applied locally: on success
//! the row is patched to `paid` in place instead of refetching the page.
//! A partial payment leaves the balance to the server and refetches.

use chrono::NaiveDate;
use serde_json::json;

use crate::export::sanitize_file_name;
use crate::formatting::format_money;
use crate::list::RowAction;
use crate::models::{Invoice, InvoiceStatus};

use super::form::{Form, ValidationErrors};
use super::{Download, FollowUp, Method, Mutation, Submission};

pub const PAYMENT_METHODS: &[&str] = &["credit_card", "bank_transfer", "cash", "check"];

/// Pay and Receipt are mutually exclusive and depend on the effective status
#[must_use]
pub fn actions(invoice: &Invoice, today: NaiveDate) -> Vec<RowAction> {
    let mut actions = vec![RowAction::View];
    match invoice.effective_status(today) {
        InvoiceStatus::Unpaid | InvoiceStatus::Overdue => actions.push(RowAction::Pay),
        InvoiceStatus::Paid => actions.push(RowAction::Receipt),
        _ => {}
    }
    actions
}

#[must_use]
pub fn pay_form(invoice: &Invoice, today: NaiveDate) -> Form {
    Form::new(format!(
        "Record payment for {} ({})",
        invoice.invoice_number,
        format_money(invoice.amount, &invoice.currency)
    ))
    .number("amount", "Amount", format!("{:.2}", invoice.amount))
    .choice("paymentMethod", "Method", PAYMENT_METHODS, "bank_transfer")
    .text("transactionReference", "Reference", "")
    .date("paymentDate", "Payment date", Some(today))
    .text("notes", "Notes", "")
}

pub fn submit_payment(invoice: &Invoice, form: &Form, today: NaiveDate) -> Result<Submission, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let amount = form.number_value("amount");
    match amount {
        None if form.is_blank("amount") => errors.add("amount", "Amount is required"),
        None => errors.add("amount", "Amount must be a number"),
        Some(a) if a <= 0.0 => errors.add("amount", "Amount must be greater than zero"),
        // Allow for rounding in the displayed amount
        Some(a) if a > invoice.amount + 0.005 => errors.add(
            "amount",
            format!("Amount cannot exceed {}", format_money(invoice.amount, &invoice.currency)),
        ),
        Some(_) => {}
    }

    let method = form.choice_value("paymentMethod");
    if method != "cash" && form.is_blank("transactionReference") {
        errors.add("transactionReference", "Reference is required for non-cash payments");
    }

    let paid_on = errors.date(form, "paymentDate", "Payment date");
    if let Some(date) = paid_on
        && date > today
    {
        errors.add("paymentDate", "Payment date cannot be in the future");
    }

    errors.finish(|| {
        let amount = amount.unwrap_or_default();
        let paid_on = paid_on.unwrap_or(today);
        let follow_up = if amount + 0.005 < invoice.amount {
            FollowUp::Refetch
        } else {
            FollowUp::MarkInvoicePaid {
                id: invoice.id.clone(),
                paid_on,
            }
        };
        Submission::Mutation(Mutation {
            method: Method::Post,
            path: format!("/invoices/{}/pay", invoice.id),
            body: json!({
                "amount": amount,
                "paymentMethod": method,
                "transactionReference": form.raw("transactionReference"),
                "paymentDate": paid_on.format("%Y-%m-%d").to_string(),
                "notes": form.raw("notes"),
            }),
            success: format!(
                "Payment of {} recorded for {}",
                format_money(amount, &invoice.currency),
                invoice.invoice_number
            ),
            follow_up,
        })
    })
}

/// Receipt download for a paid invoice
#[must_use]
pub fn receipt(invoice: &Invoice) -> Submission {
    Submission::Download(Download {
        path: format!("/invoices/{}/receipt", invoice.id),
        file_name: sanitize_file_name(&format!("Receipt_{}.pdf", invoice.invoice_number)),
    })
}

/// Optimistic patch applied after a successful payment
pub fn mark_paid(invoice: &mut Invoice, paid_on: NaiveDate) {
    invoice.status = InvoiceStatus::Paid;
    invoice.paid_at = Some(paid_on);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(status: InvoiceStatus, due: NaiveDate) -> Invoice {
        Invoice {
            id: "inv-7".to_string(),
            invoice_number: "INV-0007".to_string(),
            amount: 250.0,
            currency: "USD".to_string(),
            status,
            due_date: Some(due),
            ..Invoice::default()
        }
    }

    #[test]
    fn test_paid_invoice_offers_receipt_only() {
        let today = date(2026, 4, 10);
        let paid = actions(&invoice(InvoiceStatus::Paid, date(2026, 3, 1)), today);
        assert!(!paid.contains(&RowAction::Pay));
        assert!(paid.contains(&RowAction::Receipt));

        for status in [InvoiceStatus::Unpaid, InvoiceStatus::Overdue] {
            let open = actions(&invoice(status, date(2026, 5, 1)), today);
            assert!(open.contains(&RowAction::Pay));
            assert!(!open.contains(&RowAction::Receipt));
        }

        let cancelled = actions(&invoice(InvoiceStatus::Cancelled, date(2026, 5, 1)), today);
        assert_eq!(cancelled, vec![RowAction::View]);
    }

    #[test]
    fn test_past_due_unpaid_is_payable() {
        let today = date(2026, 4, 10);
        let late = invoice(InvoiceStatus::Unpaid, date(2026, 4, 1));
        assert_eq!(late.effective_status(today), InvoiceStatus::Overdue);
        assert!(actions(&late, today).contains(&RowAction::Pay));
    }

    #[test]
    fn test_payment_validation() {
        let today = date(2026, 4, 10);
        let inv = invoice(InvoiceStatus::Unpaid, date(2026, 5, 1));
        let mut form = pay_form(&inv, today);
        form.set("amount", "300");
        form.set("paymentDate", "2026-04-11");
        let errors = submit_payment(&inv, &form, today).unwrap_err();
        assert!(errors.get("amount").unwrap().contains("cannot exceed"));
        assert!(errors.get("transactionReference").is_some());
        assert_eq!(errors.get("paymentDate"), Some("Payment date cannot be in the future"));
    }

    #[test]
    fn test_payment_mutation() {
        let today = date(2026, 4, 10);
        let inv = invoice(InvoiceStatus::Overdue, date(2026, 3, 1));
        let mut form = pay_form(&inv, today);
        form.set("transactionReference", "TX-991");
        let Ok(Submission::Mutation(m)) = submit_payment(&inv, &form, today) else {
            panic!("expected a mutation");
        };
        assert_eq!(m.method, Method::Post);
        assert_eq!(m.path, "/invoices/inv-7/pay");
        assert_eq!(m.body["amount"], 250.0);
        assert_eq!(m.body["paymentDate"], "2026-04-10");
        assert_eq!(
            m.follow_up,
            FollowUp::MarkInvoicePaid {
                id: "inv-7".to_string(),
                paid_on: today,
            }
        );
    }

    #[test]
    fn test_partial_payment_refetches() {
        let today = date(2026, 4, 10);
        let inv = invoice(InvoiceStatus::Unpaid, date(2026, 5, 1));
        let mut form = pay_form(&inv, today);
        form.set("amount", "100");
        form.set("paymentMethod", "cash");
        let Ok(Submission::Mutation(m)) = submit_payment(&inv, &form, today) else {
            panic!("partial payments are accepted");
        };
        assert_eq!(m.body["amount"], 100.0);
        assert_eq!(m.follow_up, FollowUp::Refetch);

        // Rounding in the displayed amount still counts as full payment
        form.set("amount", "249.999");
        let Ok(Submission::Mutation(m)) = submit_payment(&inv, &form, today) else {
            panic!("expected a mutation");
        };
        assert!(matches!(m.follow_up, FollowUp::MarkInvoicePaid { .. }));
    }

    #[test]
    fn test_receipt_name_is_one_component() {
        let mut inv = invoice(InvoiceStatus::Paid, date(2026, 3, 1));
        inv.invoice_number = "../2026/07".to_string();
        let Submission::Download(download) = receipt(&inv) else {
            panic!("receipt is a download");
        };
        assert_eq!(download.file_name, "Receipt_.._2026_07.pdf");
        assert_eq!(download.path, "/invoices/inv-7/receipt");
    }

    #[test]
    fn test_mark_paid() {
        let mut inv = invoice(InvoiceStatus::Unpaid, date(2026, 3, 1));
        mark_paid(&mut inv, date(2026, 4, 10));
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.paid_at, Some(date(2026, 4, 10)));
        assert!(actions(&inv, date(2026, 4, 10)).contains(&RowAction::Receipt));
    }
}
