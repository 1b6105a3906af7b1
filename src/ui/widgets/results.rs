// src/ui/widgets/results.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use vanguard_observatory::core::knowledge_base;
use vanguard_observatory::core::models::{ScanOutcome, TestEntry};

fn verdict_span(entry: &TestEntry) -> Span<'static> {
    match entry.pass {
        Some(true) => Span::styled("✓ ", Style::default().fg(Color::Green)),
        Some(false) => Span::styled("✗ ", Style::default().fg(Color::Red)),
        None => Span::styled("- ", Style::default().fg(Color::DarkGray)),
    }
}

fn modifier_span(modifier: i64) -> Span<'static> {
    let style = match modifier {
        m if m > 0 => Style::default().fg(Color::Green),
        0 => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Red),
    };
    Span::styled(format!("{modifier:+}"), style)
}

/// Renders the per-test report: a navigable list on top, details below.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Test Results (Navigate with ↑ ↓)");

    let content = match (&app.state, &app.outcome) {
        (AppState::Idle, _) => Some(
            Paragraph::new("Enter a host and press Enter to start the scan.")
                .alignment(Alignment::Center),
        ),
        (AppState::Scanning, _) => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            let target = app.target.clone().unwrap_or_default();
            Some(
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                    Span::raw(format!("Scanning {target}... Please wait.")),
                ]))
                .alignment(Alignment::Center),
            )
        }
        (AppState::Finished, Some(ScanOutcome::Failed { error })) => Some(
            Paragraph::new(Line::from(vec![
                Span::styled("Scan failed: ", Style::default().fg(Color::Red).bold()),
                Span::raw(error.clone()),
            ]))
            .alignment(Alignment::Center),
        ),
        _ => None,
    };
    if let Some(content) = content {
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .report()
        .map(|report| {
            report
                .tests
                .iter()
                .map(|(name, entry)| {
                    ListItem::new(Line::from(vec![
                        verdict_span(entry),
                        Span::styled(format!("{name:<28}"), Style::default().bold()),
                        modifier_span(entry.score_modifier),
                        Span::raw("  "),
                        Span::styled(
                            entry.result.clone().unwrap_or_else(|| "no verdict".to_string()),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect()
        })
        .unwrap_or_default();

    let tests_list = List::new(items)
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(tests_list, chunks[0], &mut app.tests_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let text = match app.selected_test() {
        Some((name, entry)) => {
            let description = entry
                .result
                .as_deref()
                .and_then(knowledge_base::get_result_detail)
                .map(|d| d.description)
                .unwrap_or("This test could not reach a verdict and does not affect the score.");
            let mut lines = vec![
                Line::from(""),
                Line::from(name.clone().yellow().bold()),
                Line::from(description.to_string()),
            ];
            if let Some(expectation) = &entry.expectation {
                lines.push(Line::from(""));
                lines.push(Line::from("EXPECTED:".yellow().bold()));
                lines.push(Line::from(expectation.clone()));
            }
            Text::from(lines)
        }
        None => Text::from("Select a test above to see details."),
    };
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block),
        chunks[1],
    );
}
