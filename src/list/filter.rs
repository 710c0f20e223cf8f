//! Filter panel: editable draft of a list's committed filters
//!
//! The panel keeps its own draft so typing does not refetch on every key in
//! explicit mode. The draft is re-seeded from the committed filters whenever
//! the page container bumps its filter generation, which happens on apply,
//! clear and any other external change.
//!
//! Live-mode panels (activity and error logs) hand back the draft on every
//! edit instead; the page container debounces those before fetching.

use chrono::{Days, NaiveDate};

use super::query::{DateRange, FilterValue, Filters};

/// Input widget for one filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Fixed option list, empty selection means "any"
    Choice(&'static [&'static str]),
    DateRange,
}

/// Declared filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FilterField {
    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
        }
    }

    pub const fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Choice(options),
        }
    }

    pub const fn date_range(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::DateRange,
        }
    }
}

/// When draft edits reach the committed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Only on Apply
    Explicit,
    /// On every edit, debounced by the page container
    Live,
}

/// Preset date ranges ending today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    Last24Hours,
    Last7Days,
    Last30Days,
}

impl QuickRange {
    pub const ALL: [QuickRange; 3] = [QuickRange::Last24Hours, QuickRange::Last7Days, QuickRange::Last30Days];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuickRange::Last24Hours => "Last 24 Hours",
            QuickRange::Last7Days => "Last 7 Days",
            QuickRange::Last30Days => "Last 30 Days",
        }
    }

    fn days(self) -> u64 {
        match self {
            QuickRange::Last24Hours => 1,
            QuickRange::Last7Days => 7,
            QuickRange::Last30Days => 30,
        }
    }

    #[must_use]
    pub fn range(self, today: NaiveDate) -> DateRange {
        DateRange {
            from: today.checked_sub_days(Days::new(self.days())),
            to: Some(today),
        }
    }
}

/// Parse `from..to` where either side may be blank.
///
/// A single date selects that day. Returns `None` for malformed input.
#[must_use]
pub fn parse_range(input: &str) -> Option<DateRange> {
    let input = input.trim();
    if input.is_empty() {
        return Some(DateRange::default());
    }
    let parse_side = |s: &str| -> Option<Option<NaiveDate>> {
        let s = s.trim();
        if s.is_empty() {
            Some(None)
        } else {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Some)
        }
    };
    match input.split_once("..") {
        Some((from, to)) => {
            let range = DateRange {
                from: parse_side(from)?,
                to: parse_side(to)?,
            };
            match (range.from, range.to) {
                (Some(f), Some(t)) if f > t => None,
                _ => Some(range),
            }
        }
        None => {
            let day = parse_side(input)?;
            Some(DateRange { from: day, to: day })
        }
    }
}

/// Input text for a committed range
fn format_range(range: &DateRange) -> String {
    let side = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    format!("{}..{}", side(range.from), side(range.to))
}

/// Editable filter draft
#[derive(Debug, Clone)]
pub struct FilterPanel {
    fields: &'static [FilterField],
    mode: ApplyMode,
    inputs: Vec<String>,
    draft: Filters,
    generation: u64,
    focus: usize,
}

impl FilterPanel {
    pub fn new(fields: &'static [FilterField], mode: ApplyMode) -> Self {
        Self {
            fields,
            mode,
            inputs: vec![String::new(); fields.len()],
            draft: Filters::default(),
            generation: 0,
            focus: 0,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &'static [FilterField] {
        self.fields
    }

    #[must_use]
    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    #[cfg(test)]
    pub fn draft(&self) -> &Filters {
        &self.draft
    }

    #[must_use]
    pub fn input(&self, index: usize) -> &str {
        self.inputs.get(index).map(String::as_str).unwrap_or("")
    }

    /// True when a date-range input does not parse
    #[must_use]
    pub fn is_invalid(&self, index: usize) -> bool {
        matches!(self.fields.get(index).map(|f| f.kind), Some(FieldKind::DateRange))
            && parse_range(self.input(index)).is_none()
    }

    /// Draft differs from what is committed
    #[must_use]
    pub fn is_dirty(&self, committed: &Filters) -> bool {
        &self.draft != committed
    }

    /// Re-seed the draft when the committed generation moved.
    ///
    /// A draft that already equals the committed filters is left alone so a
    /// half-typed date in live mode survives its own commit.
    pub fn sync(&mut self, committed: &Filters, generation: u64) {
        if generation == self.generation {
            return;
        }
        self.generation = generation;
        if &self.draft == committed {
            return;
        }
        self.draft = committed.clone();
        for (field, input) in self.fields.iter().zip(self.inputs.iter_mut()) {
            *input = match committed.get(field.key) {
                Some(FilterValue::Text(s)) => s.clone(),
                Some(FilterValue::Range(r)) => format_range(r),
                None => String::new(),
            };
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

    /// Type into the focused text or date field
    pub fn type_char(&mut self, c: char) -> Option<Filters> {
        match self.fields.get(self.focus)?.kind {
            FieldKind::Text | FieldKind::DateRange => {
                self.inputs[self.focus].push(c);
                self.edited()
            }
            FieldKind::Choice(_) if c == ' ' => self.cycle(true),
            FieldKind::Choice(_) => None,
        }
    }

    pub fn backspace(&mut self) -> Option<Filters> {
        let field = self.fields.get(self.focus)?;
        match field.kind {
            FieldKind::Choice(_) => self.inputs[self.focus].clear(),
            _ => {
                self.inputs[self.focus].pop()?;
            }
        }
        self.edited()
    }

    /// Clear the focused field only
    pub fn clear_field(&mut self) -> Option<Filters> {
        self.fields.get(self.focus)?;
        self.inputs[self.focus].clear();
        self.edited()
    }

    /// Step a choice field through `any, option1, option2, ...`
    pub fn cycle(&mut self, forward: bool) -> Option<Filters> {
        let FieldKind::Choice(options) = self.fields.get(self.focus)?.kind else {
            return None;
        };
        let current = options.iter().position(|o| *o == self.inputs[self.focus]);
        // Slot 0 is "any"
        let slot = current.map(|i| i + 1).unwrap_or(0);
        let slots = options.len() + 1;
        let next = if forward { (slot + 1) % slots } else { (slot + slots - 1) % slots };
        self.inputs[self.focus] = if next == 0 { String::new() } else { options[next - 1].to_string() };
        self.edited()
    }

    /// Fill the first date-range field with a preset
    pub fn quick_range(&mut self, range: QuickRange, today: NaiveDate) -> Option<Filters> {
        let index = self.fields.iter().position(|f| f.kind == FieldKind::DateRange)?;
        self.inputs[index] = format_range(&range.range(today));
        self.focus = index;
        self.edited()
    }

    /// Commit the draft as-is
    #[must_use]
    pub fn apply(&self) -> Filters {
        self.draft.clone()
    }

    /// Reset every field and hand back an empty filter set
    pub fn clear(&mut self) -> Filters {
        for input in &mut self.inputs {
            input.clear();
        }
        self.draft = Filters::default();
        self.draft.clone()
    }

    /// Rebuild the draft from the inputs. Live mode emits it.
    fn edited(&mut self) -> Option<Filters> {
        let mut draft = Filters::default();
        for (field, input) in self.fields.iter().zip(&self.inputs) {
            match field.kind {
                FieldKind::Text | FieldKind::Choice(_) => draft.set_text(field.key, input.clone()),
                // Unparseable ranges stay out of the draft until fixed
                FieldKind::DateRange => {
                    if let Some(range) = parse_range(input) {
                        draft.set_range(field.key, range);
                    }
                }
            }
        }
        self.draft = draft;
        match self.mode {
            ApplyMode::Live => Some(self.draft.clone()),
            ApplyMode::Explicit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FilterField] = &[
        FilterField::text("search", "Search"),
        FilterField::choice("status", "Status", &["active", "suspended"]),
        FilterField::date_range("createdAt", "Created"),
    ];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn type_str(panel: &mut FilterPanel, s: &str) -> Option<Filters> {
        let mut last = None;
        for c in s.chars() {
            last = panel.type_char(c);
        }
        last
    }

    #[test]
    fn test_explicit_mode_does_not_emit() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Explicit);
        assert_eq!(type_str(&mut panel, "acme"), None);
        assert_eq!(panel.draft().text("search"), Some("acme"));
        assert_eq!(panel.apply().text("search"), Some("acme"));
    }

    #[test]
    fn test_live_mode_emits_each_edit() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Live);
        let emitted = type_str(&mut panel, "db").unwrap();
        assert_eq!(emitted.text("search"), Some("db"));
        let emitted = panel.backspace().unwrap();
        assert_eq!(emitted.text("search"), Some("d"));
    }

    #[test]
    fn test_choice_cycles_through_any() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Explicit);
        panel.focus_next();
        panel.cycle(true);
        assert_eq!(panel.draft().text("status"), Some("active"));
        panel.cycle(true);
        assert_eq!(panel.draft().text("status"), Some("suspended"));
        panel.cycle(true);
        assert_eq!(panel.draft().text("status"), None);
        panel.cycle(false);
        assert_eq!(panel.draft().text("status"), Some("suspended"));
    }

    #[test]
    fn test_sync_reseeds_on_generation_change() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Explicit);
        type_str(&mut panel, "stale");

        let mut committed = Filters::new();
        committed.set_text("status", "active");
        committed.set_range(
            "createdAt",
            DateRange {
                from: Some(date(2026, 1, 1)),
                to: None,
            },
        );

        // Same generation: draft untouched
        panel.sync(&committed, 0);
        assert_eq!(panel.draft().text("search"), Some("stale"));

        panel.sync(&committed, 1);
        assert_eq!(panel.draft(), &committed);
        assert_eq!(panel.input(0), "");
        assert_eq!(panel.input(1), "active");
        assert_eq!(panel.input(2), "2026-01-01..");
        assert!(!panel.is_dirty(&committed));
    }

    #[test]
    fn test_partial_date_survives_live_commit() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Live);
        panel.focus_prev();
        let committed = type_str(&mut panel, "2026-0").unwrap();
        assert!(panel.is_invalid(2));
        panel.sync(&committed, 1);
        assert_eq!(panel.input(2), "2026-0");
    }

    #[test]
    fn test_quick_ranges() {
        let today = date(2026, 3, 15);
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Explicit);
        panel.quick_range(QuickRange::Last7Days, today);
        assert_eq!(
            panel.draft().range("createdAt"),
            Some(&DateRange {
                from: Some(date(2026, 3, 8)),
                to: Some(today),
            })
        );
        assert_eq!(panel.focus(), 2);
        assert_eq!(
            QuickRange::Last24Hours.range(today).from,
            Some(date(2026, 3, 14))
        );
        assert_eq!(
            QuickRange::Last30Days.range(today).from,
            Some(date(2026, 2, 13))
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut panel = FilterPanel::new(FIELDS, ApplyMode::Explicit);
        type_str(&mut panel, "acme");
        panel.quick_range(QuickRange::Last30Days, date(2026, 3, 15));
        assert_eq!(panel.clear(), Filters::default());
        assert!(panel.draft().is_empty());
        assert_eq!(panel.input(0), "");
        assert_eq!(panel.input(2), "");
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range(""), Some(DateRange::default()));
        assert_eq!(
            parse_range("2026-01-05"),
            Some(DateRange {
                from: Some(date(2026, 1, 5)),
                to: Some(date(2026, 1, 5)),
            })
        );
        assert_eq!(
            parse_range("..2026-02-01"),
            Some(DateRange {
                from: None,
                to: Some(date(2026, 2, 1)),
            })
        );
        assert_eq!(parse_range("2026-02-01..2026-01-01"), None);
        assert_eq!(parse_range("yesterday"), None);
    }
}
