//! UI rendering for the TUI
//!
//! This module handles all rendering using ratatui. The rendering is event-driven -
//! we only render when an event triggers a state change, not at a fixed frame rate.

mod filters;
mod metrics;
mod overlays;
mod table;
mod widgets;

use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Tabs};

use crate::tui::app::{App, ModalState, View, with_page};
use crate::tui::event::InputMode;
use crate::tui::theme::Theme;

use filters::render_filter_overlay;
use metrics::render_dashboard;
use overlays::{
    render_actions_menu, render_export_menu, render_help_overlay, render_record_modal, render_sort_menu, render_toast,
};
use table::render_list;

/// Render the entire TUI
pub fn render(app: &App, frame: &mut Frame) {
    let theme = Theme::from_name(&app.config.display.theme);
    let area = frame.area();
    let today = app.today();

    // Main layout: tab bar, content, status line
    let layout = Layout::vertical([
        Constraint::Length(1), // Tab bar
        Constraint::Min(0),    // Main content
        Constraint::Length(1), // Status line
    ])
    .split(area);

    render_tab_bar(app, frame, layout[0], &theme);
    match app.current_view {
        View::Dashboard => render_dashboard(app, frame, layout[1], &theme),
        View::List(kind) => with_page!(&app.pages, kind, |page| render_list(
            page,
            today,
            app.spinner,
            frame,
            layout[1],
            &theme
        )),
    }
    render_status_bar(app, frame, layout[2], &theme);

    // Overlays (render in order of z-index)
    if let Some(kind) = app.current_kind() {
        match &app.modal {
            ModalState::Filter => with_page!(&app.pages, kind, |page| render_filter_overlay(page, frame, area, &theme)),
            ModalState::Actions { actions, menu } => render_actions_menu(actions, menu, frame, area, &theme),
            ModalState::Sort { fields, menu } => {
                let sort = with_page!(&app.pages, kind, |page| page.query.sort.clone());
                render_sort_menu(fields, &sort, menu, frame, area, &theme);
            }
            ModalState::Export { menu } => render_export_menu(menu, frame, area, &theme),
            ModalState::Help | ModalState::None => {}
        }
        with_page!(&app.pages, kind, |page| {
            if let Some(modal) = &page.modal {
                render_record_modal(modal, today, app.spinner, frame, area, &theme);
            }
        });
    }
    if matches!(app.modal, ModalState::Help) {
        render_help_overlay(frame, area, &theme);
    }

    // Notifications (always on top)
    if let Some(toast) = app.notifier.current() {
        render_toast(toast, frame, area, &theme);
    }
}

fn render_tab_bar(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let num = format!("[{}]", i + 1);
            if *view == app.current_view {
                Line::from(vec![
                    Span::styled(num, Style::default().fg(theme.info)),
                    Span::styled(view.label(), Style::default().fg(theme.selected_fg).bold()),
                ])
            } else {
                Line::from(vec![Span::styled(num, Style::default().fg(theme.border)), Span::raw(view.label())])
            }
        })
        .collect();

    let selected = View::ALL.iter().position(|v| *v == app.current_view).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .divider(" | ")
        .style(Style::default().fg(theme.fg))
        .highlight_style(Style::default().fg(theme.selected_fg).bold());

    frame.render_widget(tabs, area);
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let keybinds = if app.input_mode() == InputMode::TextEntry {
        " Tab:next field  ←/→:choose  Enter:apply/submit  Ctrl+U:clear field  Esc:close "
    } else {
        match app.current_view {
            View::Dashboard => " 2-7:lists  r:refresh  Tab:next view  ?:help  q:quit ",
            View::List(_) => {
                " j/k:move  ]/[:page  Enter:detail  a:actions  f:filter  s:sort  e:export  ?:help  q:quit "
            }
        }
    };

    let mut spans = vec![Span::styled(keybinds, Style::default().fg(theme.border))];

    if let View::List(kind) = app.current_view {
        let loaded = with_page!(&app.pages, kind, |page| page.last_loaded);
        if let Some(loaded) = loaded {
            let format = format!("{} %H:%M:%S", app.config.display.date_format);
            spans.push(Span::styled(
                format!("| Updated {}", loaded.format(&format)),
                Style::default().fg(theme.muted),
            ));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
