//! Modal dialogs: row detail views and action forms
//!
//! A modal is opened from a row action and owns a copy of the target row.
//! Action forms validate locally and produce a `Submission`; the page
//! container spawns it and the modal stays open, marked as submitting,
//! until the result arrives. Success closes it. Failure keeps it open
//! with the entered values intact.

pub mod form;
pub mod payment;
pub mod tenant;
pub mod upload;

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::list::{Resource, RowAction};

pub use form::{Form, ValidationErrors};

/// HTTP method of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// What to do with the list after a mutation succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Re-issue the current list query
    Refetch,
    /// Patch the invoice row in place without a round trip
    MarkInvoicePaid { id: String, paid_on: NaiveDate },
}

/// A JSON mutation ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub method: Method,
    pub path: String,
    pub body: serde_json::Value,
    /// Notification shown on success
    pub success: String,
    pub follow_up: FollowUp,
}

/// Local file bound for a document's upload slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub document_id: String,
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Binary resource to save locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: String,
    pub file_name: String,
}

/// Work produced by a validated modal
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Mutation(Mutation),
    Upload(UploadRequest),
    Download(Download),
}

/// How a row action starts
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPlan {
    /// Read-only detail modal
    Detail,
    /// Form modal that validates on submit
    Form(Form),
    /// No input needed, run straight away
    Immediate(Submission),
}

/// An open modal bound to one row
#[derive(Debug, Clone)]
pub struct Modal<R> {
    pub target: R,
    pub action: RowAction,
    pub form: Option<Form>,
    pub errors: ValidationErrors,
    pub submitting: bool,
    /// Bytes sent / total while an upload runs
    pub progress: Option<(u64, u64)>,
    pub scroll: u16,
}

impl<R: Resource> Modal<R> {
    pub fn detail(target: R) -> Self {
        Self {
            target,
            action: RowAction::View,
            form: None,
            errors: ValidationErrors::new(),
            submitting: false,
            progress: None,
            scroll: 0,
        }
    }

    pub fn with_form(target: R, action: RowAction, form: Form) -> Self {
        Self {
            form: Some(form),
            action,
            ..Self::detail(target)
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        match &self.form {
            Some(form) => form.title.clone(),
            None => format!("{} {}", R::KIND.singular(), self.target.id()),
        }
    }

    /// Validate the form. Stores errors on failure and leaves the modal open.
    ///
    /// Returns `None` while a previous submission is still in flight.
    pub fn submit(&mut self, today: NaiveDate) -> Option<Submission> {
        if self.submitting {
            return None;
        }
        let form = self.form.as_ref()?;
        match self.target.submit(self.action, form, today) {
            Ok(submission) => {
                self.errors = ValidationErrors::new();
                self.submitting = true;
                Some(submission)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    /// Server rejected the submission: keep the form, show the reason
    pub fn rejected(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.progress = None;
        self.errors = ValidationErrors::general(message);
    }
}
