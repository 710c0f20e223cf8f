//! Tenant action modals: quick suspend/activate, state change, deactivation,
//! trial management and subscription management
//!
//! Every tenant mutation is a PATCH on a sub-resource of `/tenants/:id`. The
//! resulting state is never computed locally; the list refetches after
//! success.

use chrono::{Days, NaiveDate};
use serde_json::{Map, Value, json};

use crate::list::RowAction;
use crate::models::{Tenant, TenantStatus};

use super::form::{Form, ValidationErrors};
use super::{FollowUp, Method, Mutation, Submission};

/// Plans a tenant can be converted or moved to
pub const PLANS: &[&str] = &["starter", "professional", "enterprise"];

pub const TRIAL_ACTIONS: &[&str] = &["extend", "set_end_date", "end", "convert"];

pub const SUBSCRIPTION_ACTIONS: &[&str] = &["cancel", "suspend", "reactivate", "change_plan"];

/// Minimum length of a free-text reason where one is required
pub const MIN_REASON_LEN: usize = 5;

const MAX_TRIAL_EXTENSION_DAYS: i64 = 365;
const MAX_REFUND: f64 = 10_000.0;
const MAX_GRACE_DAYS: i64 = 90;

/// Actions offered for a tenant in its current state
#[must_use]
pub fn actions(tenant: &Tenant) -> Vec<RowAction> {
    let mut actions = vec![RowAction::View];
    match tenant.status {
        TenantStatus::Active | TenantStatus::Trial => actions.push(RowAction::Suspend),
        TenantStatus::Suspended | TenantStatus::Locked | TenantStatus::Unverified => {
            actions.push(RowAction::Activate);
        }
        _ => {}
    }
    if tenant.status == TenantStatus::Trial {
        actions.push(RowAction::Trial);
    }
    let deactivated = tenant.status == TenantStatus::Deactivated;
    if tenant.subscription.is_some() && !deactivated {
        actions.push(RowAction::Subscription);
    }
    if !deactivated {
        actions.push(RowAction::ChangeState);
        actions.push(RowAction::Deactivate);
    }
    actions
}

#[must_use]
pub fn form_for(tenant: &Tenant, action: RowAction, today: NaiveDate) -> Option<Form> {
    let form = match action {
        RowAction::Suspend => Form::new(format!("Suspend {}", tenant.name))
            .text("reason", "Reason (optional)", "")
            .toggle("notifyUsers", "Notify users", true),
        RowAction::Activate => Form::new(format!("Activate {}", tenant.name))
            .text("reason", "Reason (optional)", "")
            .toggle("notifyUsers", "Notify users", true),
        RowAction::ChangeState => Form::new(format!("Change state of {}", tenant.name))
            .choice("newStatus", "New status", TenantStatus::WIRE, tenant.status.as_str())
            .text("reason", "Reason", "")
            .date("effectiveDate", "Effective date", Some(today))
            .toggle("notifyUsers", "Notify users", true)
            .toggle("setReadOnly", "Keep data read-only", true),
        RowAction::Deactivate => Form::new(format!("Deactivate {}", tenant.name))
            .text("reason", "Reason", "")
            .date("effectiveDate", "Effective date", Some(today))
            .toggle("notifyUsers", "Notify users", true)
            .toggle("setReadOnly", "Keep data read-only", true),
        RowAction::Trial => {
            let end = tenant
                .trial_ends_at
                .unwrap_or(today)
                .checked_add_days(Days::new(14));
            Form::new(format!("Manage trial for {}", tenant.name))
                .choice("action", "Action", TRIAL_ACTIONS, "extend")
                .number("extensionDays", "Extend by (days)", 14)
                .date("trialEndDate", "New end date", end)
                .choice("plan", "Convert to plan", PLANS, tenant.plan.as_deref().unwrap_or("starter"))
                .text("reason", "Reason", "")
                .toggle("notifyUsers", "Notify users", true)
        }
        RowAction::Subscription => {
            let current = tenant.subscription.as_ref().map(|s| s.plan.as_str()).unwrap_or("starter");
            Form::new(format!("Manage subscription for {}", tenant.name))
                .choice("action", "Action", SUBSCRIPTION_ACTIONS, "cancel")
                .choice("newPlan", "New plan", PLANS, current)
                .text("reason", "Reason", "")
                .number("refundAmount", "Refund amount", 0)
                .number("gracePeriodDays", "Grace period (days)", 0)
                .date("effectiveDate", "Effective date", Some(today))
                .toggle("notifyUsers", "Notify users", true)
        }
        _ => return None,
    };
    Some(form)
}

pub fn submit(tenant: &Tenant, action: RowAction, form: &Form, today: NaiveDate) -> Result<Submission, ValidationErrors> {
    let mutation = match action {
        RowAction::Suspend => quick_status(tenant, form, today, TenantStatus::Suspended),
        RowAction::Activate => quick_status(tenant, form, today, TenantStatus::Active),
        RowAction::ChangeState => {
            let status = TenantStatus::parse(form.choice_value("newStatus"));
            change_state(tenant, form, today, status)
        }
        RowAction::Deactivate => change_state(tenant, form, today, TenantStatus::Deactivated),
        RowAction::Trial => trial(tenant, form, today),
        RowAction::Subscription => subscription(tenant, form),
        _ => Err(ValidationErrors::general(format!("{} does not apply to tenants", action.label()))),
    };
    mutation.map(Submission::Mutation)
}

fn status_mutation(tenant: &Tenant, body: Value, status: TenantStatus) -> Mutation {
    Mutation {
        method: Method::Patch,
        path: format!("/tenants/{}/status", tenant.id),
        body,
        success: format!("{} is now {}", tenant.name, status.label().to_lowercase()),
        follow_up: FollowUp::Refetch,
    }
}

fn quick_status(tenant: &Tenant, form: &Form, today: NaiveDate, status: TenantStatus) -> Result<Mutation, ValidationErrors> {
    let reason = match form.raw("reason") {
        "" if status == TenantStatus::Suspended => "Suspended by administrator",
        "" => "Activated by administrator",
        reason => reason,
    };
    let body = json!({
        "newStatus": status.as_str(),
        "reason": reason,
        "effectiveDate": today.format("%Y-%m-%d").to_string(),
        "notifyUsers": form.flag("notifyUsers"),
    });
    Ok(status_mutation(tenant, body, status))
}

/// Full state change. Deactivation adds the read-only flag and a future-dated check.
fn change_state(tenant: &Tenant, form: &Form, today: NaiveDate, status: TenantStatus) -> Result<Mutation, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if status == TenantStatus::Unknown {
        errors.add("newStatus", "Choose a status");
    } else if status == tenant.status {
        errors.add("newStatus", format!("Tenant is already {}", status.label().to_lowercase()));
    }
    errors.min_len(form, "reason", "Reason", MIN_REASON_LEN);
    let effective = errors.date(form, "effectiveDate", "Effective date");
    if status == TenantStatus::Deactivated
        && let Some(date) = effective
        && date < today
    {
        errors.add("effectiveDate", "Effective date cannot be in the past");
    }

    let deactivating = status == TenantStatus::Deactivated;
    errors.finish(|| {
        let mut body = Map::new();
        body.insert("newStatus".into(), json!(status.as_str()));
        body.insert("reason".into(), json!(form.raw("reason")));
        body.insert(
            "effectiveDate".into(),
            json!(effective.map(|d| d.format("%Y-%m-%d").to_string())),
        );
        body.insert("notifyUsers".into(), json!(form.flag("notifyUsers")));
        if deactivating {
            body.insert("setReadOnly".into(), json!(form.flag("setReadOnly")));
        }
        status_mutation(tenant, Value::Object(body), status)
    })
}

fn trial(tenant: &Tenant, form: &Form, today: NaiveDate) -> Result<Mutation, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let action = form.choice_value("action");
    let mut body = Map::new();
    body.insert("action".into(), json!(action));

    let success = match action {
        "extend" => {
            let days = errors.int_in(form, "extensionDays", "Extension", 1, MAX_TRIAL_EXTENSION_DAYS);
            body.insert("extensionDays".into(), json!(days));
            format!("Trial for {} extended by {} days", tenant.name, days.unwrap_or_default())
        }
        "set_end_date" => {
            let end = errors.date(form, "trialEndDate", "End date");
            if let Some(end) = end
                && end < today
            {
                errors.add("trialEndDate", "End date cannot be in the past");
            }
            body.insert(
                "trialEndDate".into(),
                json!(end.map(|d| d.format("%Y-%m-%d").to_string())),
            );
            format!("Trial end date updated for {}", tenant.name)
        }
        "end" => {
            errors.min_len(form, "reason", "Reason", MIN_REASON_LEN);
            format!("Trial ended for {}", tenant.name)
        }
        "convert" => {
            let plan = form.choice_value("plan");
            if plan.is_empty() {
                errors.add("plan", "Choose a plan");
            }
            body.insert("plan".into(), json!(plan));
            format!("{} converted to the {} plan", tenant.name, plan)
        }
        other => {
            errors.add("action", format!("Unknown trial action '{}'", other));
            String::new()
        }
    };

    body.insert("reason".into(), json!(form.raw("reason")));
    body.insert("notifyUsers".into(), json!(form.flag("notifyUsers")));

    errors.finish(|| Mutation {
        method: Method::Patch,
        path: format!("/tenants/{}/trial", tenant.id),
        body: Value::Object(body),
        success,
        follow_up: FollowUp::Refetch,
    })
}

fn subscription(tenant: &Tenant, form: &Form) -> Result<Mutation, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let action = form.choice_value("action");
    if !SUBSCRIPTION_ACTIONS.contains(&action) {
        errors.add("action", "Choose an action");
    }
    if action != "reactivate" {
        errors.min_len(form, "reason", "Reason", MIN_REASON_LEN);
    }

    let refund = match form.number_value("refundAmount") {
        Some(n) if (0.0..=MAX_REFUND).contains(&n) => n,
        Some(_) => {
            errors.add("refundAmount", format!("Refund must be between 0 and {}", MAX_REFUND));
            0.0
        }
        None if form.is_blank("refundAmount") => 0.0,
        None => {
            errors.add("refundAmount", "Refund must be a number");
            0.0
        }
    };
    let grace = if form.is_blank("gracePeriodDays") {
        Some(0)
    } else {
        errors.int_in(form, "gracePeriodDays", "Grace period", 0, MAX_GRACE_DAYS)
    };
    let effective = errors.date(form, "effectiveDate", "Effective date");

    let new_plan = form.choice_value("newPlan");
    if action == "change_plan" {
        let current = tenant.subscription.as_ref().map(|s| s.plan.as_str());
        if new_plan.is_empty() {
            errors.add("newPlan", "Choose a plan");
        } else if current == Some(new_plan) {
            errors.add("newPlan", format!("Already on the {} plan", new_plan));
        }
    }

    errors.finish(|| {
        let mut body = Map::new();
        body.insert("action".into(), json!(action));
        body.insert("reason".into(), json!(form.raw("reason")));
        body.insert("refundAmount".into(), json!(refund));
        body.insert("gracePeriodDays".into(), json!(grace.unwrap_or_default()));
        body.insert(
            "effectiveDate".into(),
            json!(effective.map(|d| d.format("%Y-%m-%d").to_string())),
        );
        body.insert("notifyUsers".into(), json!(form.flag("notifyUsers")));
        if action == "change_plan" {
            body.insert("newPlan".into(), json!(new_plan));
        }
        let verb = match action {
            "cancel" => "cancelled",
            "suspend" => "suspended",
            "reactivate" => "reactivated",
            _ => "updated",
        };
        Mutation {
            method: Method::Patch,
            path: format!("/tenants/{}/subscription", tenant.id),
            body: Value::Object(body),
            success: format!("Subscription {} for {}", verb, tenant.name),
            follow_up: FollowUp::Refetch,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Subscription, SubscriptionStatus};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
    }

    fn tenant(status: TenantStatus) -> Tenant {
        Tenant {
            id: "t-1".to_string(),
            name: "Acme".to_string(),
            status,
            plan: Some("starter".to_string()),
            subscription: Some(Subscription {
                plan: "starter".to_string(),
                status: SubscriptionStatus::Active,
                amount: 49.0,
                billing_cycle: "monthly".to_string(),
                current_period_end: None,
            }),
            ..Tenant::default()
        }
    }

    fn mutation(result: Result<Submission, ValidationErrors>) -> Mutation {
        match result {
            Ok(Submission::Mutation(m)) => m,
            other => panic!("expected a mutation, got {other:?}"),
        }
    }

    #[test]
    fn test_actions_by_status() {
        let active = actions(&tenant(TenantStatus::Active));
        assert!(active.contains(&RowAction::Suspend));
        assert!(!active.contains(&RowAction::Activate));
        assert!(!active.contains(&RowAction::Trial));

        let trial = actions(&tenant(TenantStatus::Trial));
        assert!(trial.contains(&RowAction::Trial));

        let locked = actions(&tenant(TenantStatus::Locked));
        assert!(locked.contains(&RowAction::Activate));

        let gone = actions(&tenant(TenantStatus::Deactivated));
        assert_eq!(gone, vec![RowAction::View]);
    }

    #[test]
    fn test_deactivation_body_fields() {
        let t = tenant(TenantStatus::Active);
        let mut form = form_for(&t, RowAction::Deactivate, today()).unwrap();
        form.set("reason", "Contract ended");
        let m = mutation(submit(&t, RowAction::Deactivate, &form, today()));

        assert_eq!(m.method, Method::Patch);
        assert_eq!(m.path, "/tenants/t-1/status");
        let body = m.body.as_object().unwrap();
        let mut keys: Vec<&str> = body.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["effectiveDate", "newStatus", "notifyUsers", "reason", "setReadOnly"]);
        assert_eq!(body["newStatus"], "deactivated");
        assert_eq!(body["effectiveDate"], "2026-04-10");
        assert_eq!(body["setReadOnly"], true);
        assert_eq!(m.follow_up, FollowUp::Refetch);
    }

    #[test]
    fn test_deactivation_validation() {
        let t = tenant(TenantStatus::Active);
        let mut form = form_for(&t, RowAction::Deactivate, today()).unwrap();
        form.set("reason", "no");
        form.set("effectiveDate", "2026-04-09");
        let errors = submit(&t, RowAction::Deactivate, &form, today()).unwrap_err();
        assert!(errors.get("reason").is_some());
        assert_eq!(errors.get("effectiveDate"), Some("Effective date cannot be in the past"));
    }

    #[test]
    fn test_non_deactivating_change_omits_read_only() {
        let t = tenant(TenantStatus::Active);
        let mut form = form_for(&t, RowAction::ChangeState, today()).unwrap();
        form.set("newStatus", "locked");
        form.set("reason", "Security review");
        let m = mutation(submit(&t, RowAction::ChangeState, &form, today()));
        assert_eq!(m.body["newStatus"], "locked");
        assert!(m.body.get("setReadOnly").is_none());

        form.set("newStatus", "active");
        let errors = submit(&t, RowAction::ChangeState, &form, today()).unwrap_err();
        assert_eq!(errors.get("newStatus"), Some("Tenant is already active"));
    }

    #[test]
    fn test_trial_extension_range() {
        let t = tenant(TenantStatus::Trial);
        let mut form = form_for(&t, RowAction::Trial, today()).unwrap();
        form.set("extensionDays", "366");
        assert!(submit(&t, RowAction::Trial, &form, today()).is_err());

        form.set("extensionDays", "30");
        let m = mutation(submit(&t, RowAction::Trial, &form, today()));
        assert_eq!(m.path, "/tenants/t-1/trial");
        assert_eq!(m.body["extensionDays"], 30);
        assert_eq!(m.success, "Trial for Acme extended by 30 days");
    }

    #[test]
    fn test_trial_end_date_not_in_past() {
        let t = tenant(TenantStatus::Trial);
        let mut form = form_for(&t, RowAction::Trial, today()).unwrap();
        form.set("action", "set_end_date");
        form.set("trialEndDate", "2026-01-01");
        let errors = submit(&t, RowAction::Trial, &form, today()).unwrap_err();
        assert!(errors.get("trialEndDate").is_some());
    }

    #[test]
    fn test_subscription_limits() {
        let t = tenant(TenantStatus::Active);
        let mut form = form_for(&t, RowAction::Subscription, today()).unwrap();
        form.set("reason", "Customer request");
        form.set("refundAmount", "10000.01");
        form.set("gracePeriodDays", "91");
        let errors = submit(&t, RowAction::Subscription, &form, today()).unwrap_err();
        assert!(errors.get("refundAmount").is_some());
        assert!(errors.get("gracePeriodDays").is_some());

        form.set("refundAmount", "120.50");
        form.set("gracePeriodDays", "14");
        let m = mutation(submit(&t, RowAction::Subscription, &form, today()));
        assert_eq!(m.body["refundAmount"], 120.5);
        assert_eq!(m.body["gracePeriodDays"], 14);
        assert!(m.body.get("newPlan").is_none());
    }

    #[test]
    fn test_change_plan_requires_a_different_plan() {
        let t = tenant(TenantStatus::Active);
        let mut form = form_for(&t, RowAction::Subscription, today()).unwrap();
        form.set("action", "change_plan");
        form.set("reason", "Upgrade");
        let errors = submit(&t, RowAction::Subscription, &form, today()).unwrap_err();
        assert_eq!(errors.get("newPlan"), Some("Already on the starter plan"));

        form.set("newPlan", "enterprise");
        let m = mutation(submit(&t, RowAction::Subscription, &form, today()));
        assert_eq!(m.body["newPlan"], "enterprise");
    }

    #[test]
    fn test_quick_suspend_defaults_reason() {
        let t = tenant(TenantStatus::Active);
        let form = form_for(&t, RowAction::Suspend, today()).unwrap();
        let m = mutation(submit(&t, RowAction::Suspend, &form, today()));
        assert_eq!(m.body["newStatus"], "suspended");
        assert_eq!(m.body["reason"], "Suspended by administrator");
        assert_eq!(m.success, "Acme is now suspended");
    }
}
