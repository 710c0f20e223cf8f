//! Keyboard-driven form model used by every action modal
//!
//! Fields keep their raw text so the user can type freely; parsing happens
//! only when the form is validated on submit.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

/// Raw input of one form field
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Text(String),
    Number(String),
    Date(String),
    Toggle(bool),
    Choice {
        options: &'static [&'static str],
        selected: usize,
    },
}

impl Input {
    /// Text shown in the modal for this input
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Input::Text(s) | Input::Number(s) | Input::Date(s) => s.clone(),
            Input::Toggle(on) => if *on { "[x]" } else { "[ ]" }.to_string(),
            Input::Choice { options, selected } => {
                format!("< {} >", options.get(*selected).copied().unwrap_or("-"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub input: Input,
}

/// Ordered set of fields with a focus cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub title: String,
    fields: Vec<FormField>,
    focus: usize,
}

impl Form {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            focus: 0,
        }
    }

    fn push(mut self, key: &'static str, label: &'static str, input: Input) -> Self {
        self.fields.push(FormField { key, label, input });
        self
    }

    #[must_use]
    pub fn text(self, key: &'static str, label: &'static str, initial: &str) -> Self {
        self.push(key, label, Input::Text(initial.to_string()))
    }

    #[must_use]
    pub fn number(self, key: &'static str, label: &'static str, initial: impl fmt::Display) -> Self {
        self.push(key, label, Input::Number(initial.to_string()))
    }

    #[must_use]
    pub fn date(self, key: &'static str, label: &'static str, initial: Option<NaiveDate>) -> Self {
        let raw = initial.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        self.push(key, label, Input::Date(raw))
    }

    #[must_use]
    pub fn toggle(self, key: &'static str, label: &'static str, on: bool) -> Self {
        self.push(key, label, Input::Toggle(on))
    }

    #[must_use]
    pub fn choice(self, key: &'static str, label: &'static str, options: &'static [&'static str], initial: &str) -> Self {
        let selected = options.iter().position(|o| *o == initial).unwrap_or(0);
        self.push(key, label, Input::Choice { options, selected })
    }

    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    /// Trimmed raw text of a text, number or date field
    #[must_use]
    pub fn raw(&self, key: &str) -> &str {
        match self.field(key).map(|f| &f.input) {
            Some(Input::Text(s) | Input::Number(s) | Input::Date(s)) => s.trim(),
            _ => "",
        }
    }

    #[must_use]
    pub fn is_blank(&self, key: &str) -> bool {
        self.raw(key).is_empty()
    }

    /// Parsed number, `None` when blank or malformed
    #[must_use]
    pub fn number_value(&self, key: &str) -> Option<f64> {
        self.raw(key).parse::<f64>().ok().filter(|n| n.is_finite())
    }

    #[must_use]
    pub fn date_value(&self, key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.raw(key), "%Y-%m-%d").ok()
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.field(key).map(|f| &f.input), Some(Input::Toggle(true)))
    }

    #[must_use]
    pub fn choice_value(&self, key: &str) -> &'static str {
        match self.field(key).map(|f| &f.input) {
            Some(Input::Choice { options, selected }) => options.get(*selected).copied().unwrap_or(""),
            _ => "",
        }
    }

    /// Overwrite a field programmatically
    pub fn set(&mut self, key: &str, value: &str) {
        let Some(field) = self.field_mut(key) else {
            return;
        };
        match &mut field.input {
            Input::Text(s) | Input::Number(s) | Input::Date(s) => *s = value.to_string(),
            Input::Toggle(on) => *on = matches!(value, "true" | "yes" | "1"),
            Input::Choice { options, selected } => {
                if let Some(i) = options.iter().position(|o| *o == value) {
                    *selected = i;
                }
            }
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Keyboard input on the focused field
    pub fn type_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.input {
            Input::Text(s) => s.push(c),
            Input::Number(s) if c.is_ascii_digit() || c == '.' || c == '-' => s.push(c),
            Input::Date(s) if c.is_ascii_digit() || c == '-' => s.push(c),
            Input::Toggle(on) if c == ' ' => *on = !*on,
            Input::Choice { options, selected } if c == ' ' && !options.is_empty() => {
                *selected = (*selected + 1) % options.len();
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && let Input::Text(s) | Input::Number(s) | Input::Date(s) = &mut field.input
        {
            s.pop();
        }
    }

    /// Empty the focused text field
    pub fn clear_focused(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && let Input::Text(s) | Input::Number(s) | Input::Date(s) = &mut field.input
        {
            s.clear();
        }
    }

    /// Left/right on a choice or toggle field
    pub fn cycle(&mut self, forward: bool) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.input {
            Input::Choice { options, selected } if !options.is_empty() => {
                let n = options.len();
                *selected = if forward { (*selected + 1) % n } else { (*selected + n - 1) % n };
            }
            Input::Toggle(on) => *on = !*on,
            _ => {}
        }
    }
}

/// Field-level validation messages keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single error not tied to a form field
    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add("form", message);
        errors
    }

    /// Record an error, keeping the first one per field
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` when nothing was recorded
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }

    /// Require trimmed text of at least `min` characters
    pub fn min_len(&mut self, form: &Form, key: &'static str, label: &str, min: usize) {
        let len = form.raw(key).chars().count();
        if len == 0 {
            self.add(key, format!("{} is required", label));
        } else if len < min {
            self.add(key, format!("{} must be at least {} characters", label, min));
        }
    }

    /// Require an integer within `[min, max]`
    pub fn int_in(&mut self, form: &Form, key: &'static str, label: &str, min: i64, max: i64) -> Option<i64> {
        match form.raw(key).parse::<i64>() {
            Ok(n) if (min..=max).contains(&n) => Some(n),
            Ok(_) => {
                self.add(key, format!("{} must be between {} and {}", label, min, max));
                None
            }
            Err(_) => {
                self.add(key, format!("{} must be a whole number", label));
                None
            }
        }
    }

    /// Require a valid `YYYY-MM-DD` date
    pub fn date(&mut self, form: &Form, key: &'static str, label: &str) -> Option<NaiveDate> {
        let date = form.date_value(key);
        if date.is_none() {
            if form.is_blank(key) {
                self.add(key, format!("{} is required", label));
            } else {
                self.add(key, format!("{} must be a date (YYYY-MM-DD)", label));
            }
        }
        date
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
