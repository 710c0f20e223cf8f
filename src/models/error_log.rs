//! Platform error log entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::formatting::{format_timestamp, truncate_string};
use crate::list::{
    ApplyMode, Column, FilterField, Matchable, Resource, ResourceKind, RowAction, SortKey, SortOrder, Tone,
};
use crate::modal::{FollowUp, Form, Method, Mutation, Submission, ValidationErrors};

use super::status::LogLevel;
use super::time::datetime_opt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLog {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "severity")]
    pub level: LogLevel,

    #[serde(default)]
    pub message: String,

    /// Service or module that raised the error
    #[serde(default, alias = "service")]
    pub source: String,

    #[serde(default)]
    pub tenant_name: Option<String>,

    #[serde(default)]
    pub resolved: bool,

    #[serde(default)]
    pub stack_trace: Option<String>,

    #[serde(default, alias = "timestamp", with = "datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

const RESOLVED_CHOICES: &[&str] = &["true", "false"];

const FILTERS: &[FilterField] = &[
    FilterField::text("search", "Search"),
    FilterField::choice("level", "Level", LogLevel::WIRE),
    FilterField::choice("resolved", "Resolved", RESOLVED_CHOICES),
    FilterField::date_range("date", "Date"),
];

impl Matchable for ErrorLog {
    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.message.clone(), self.source.clone()];
        text.extend(self.tenant_name.clone());
        text
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "level" => Some(self.level.as_str().to_string()),
            "source" => Some(self.source.clone()),
            "tenant" | "tenantName" => self.tenant_name.clone(),
            "resolved" => Some(self.resolved.to_string()),
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

impl Resource for ErrorLog {
    const KIND: ResourceKind = ResourceKind::Errors;

    fn id(&self) -> &str {
        &self.id
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::<Self>::new("createdAt", "When", 17, |e, _| {
                e.created_at.map(format_timestamp).unwrap_or_else(|| "-".to_string())
            })
            .sortable(),
            Column::<Self>::new("level", "Level", 9, |e, _| e.level.label().to_string())
                .sortable()
                .toned(|e, _| e.level.tone()),
            Column::<Self>::new("source", "Source", 16, |e, _| e.source.clone()).sortable(),
            Column::<Self>::new("message", "Message", 40, |e, _| truncate_string(&e.message, 40)),
            Column::<Self>::new("tenantName", "Tenant", 16, |e, _| e.tenant_name.clone().unwrap_or_else(|| "-".to_string())),
            Column::<Self>::new("resolved", "Resolved", 8, |e, _| if e.resolved { "yes" } else { "no" }.to_string())
                .toned(|e, _| if e.resolved { Tone::Positive } else { Tone::Plain }),
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
            ("Level", self.level.label().to_string()),
            ("Source", self.source.clone()),
            ("Tenant", self.tenant_name.clone().unwrap_or_else(|| "-".to_string())),
            ("Resolved", if self.resolved { "yes" } else { "no" }.to_string()),
            ("Message", self.message.clone()),
            ("Stack trace", self.stack_trace.clone().unwrap_or_else(|| "-".to_string())),
        ]
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => self.created_at.map(|dt| SortKey::Int(dt.timestamp())).unwrap_or(SortKey::Missing),
            // Severity order, not alphabetical
            "level" => SortKey::Int(LogLevel::ALL.iter().position(|l| *l == self.level).map_or(-1, |i| i as i64)),
            "source" => SortKey::text(&self.source),
            _ => SortKey::Missing,
        }
    }

    fn actions(&self, _today: NaiveDate) -> Vec<RowAction> {
        if self.resolved {
            vec![RowAction::View]
        } else {
            vec![RowAction::View, RowAction::Resolve]
        }
    }

    fn form_for(&self, action: RowAction, _today: NaiveDate) -> Option<Form> {
        (action == RowAction::Resolve)
            .then(|| Form::new(format!("Resolve error {}", self.id)).text("resolutionNotes", "Resolution notes", ""))
    }

    fn submit(&self, action: RowAction, form: &Form, _today: NaiveDate) -> Result<Submission, ValidationErrors> {
        if action != RowAction::Resolve {
            return Err(ValidationErrors::general(format!("{} does not apply to error logs", action.label())));
        }
        let mut errors = ValidationErrors::new();
        errors.min_len(form, "resolutionNotes", "Resolution notes", 5);
        errors.finish(|| {
            Submission::Mutation(Mutation {
                method: Method::Patch,
                path: format!("/error-logs/{}/resolve", self.id),
                body: json!({ "resolutionNotes": form.raw("resolutionNotes") }),
                success: "Error marked as resolved".to_string(),
                follow_up: FollowUp::Refetch,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_only_when_open() {
        let mut log = ErrorLog {
            id: "e1".to_string(),
            level: LogLevel::Critical,
            ..ErrorLog::default()
        };
        assert!(log.actions(NaiveDate::MIN).contains(&RowAction::Resolve));
        log.resolved = true;
        assert!(log.plan(RowAction::Resolve, NaiveDate::MIN).is_none());
    }

    #[test]
    fn test_resolve_mutation() {
        let log = ErrorLog {
            id: "e1".to_string(),
            ..ErrorLog::default()
        };
        let mut form = log.form_for(RowAction::Resolve, NaiveDate::MIN).unwrap();
        assert!(log.submit(RowAction::Resolve, &form, NaiveDate::MIN).is_err());
        form.set("resolutionNotes", "Rotated the SMTP credentials");
        let Ok(Submission::Mutation(m)) = log.submit(RowAction::Resolve, &form, NaiveDate::MIN) else {
            panic!("expected a mutation");
        };
        assert_eq!(m.path, "/error-logs/e1/resolve");
    }

    #[test]
    fn test_level_sorts_by_severity() {
        let info = ErrorLog {
            level: LogLevel::Info,
            ..ErrorLog::default()
        };
        let critical = ErrorLog {
            level: LogLevel::Critical,
            ..ErrorLog::default()
        };
        assert!(info.sort_key("level") < critical.sort_key("level"));
    }
}
