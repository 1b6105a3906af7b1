// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use vanguard_observatory::core::grader::{self, Grade, Likelihood};

fn grade_color(grade: Grade) -> Color {
    match grade.likelihood() {
        Likelihood::Low => Color::Green,
        Likelihood::Medium => Color::Yellow,
        Likelihood::High => Color::Red,
    }
}

/// Renders the grade, score, likelihood and pass/fail counts once a report exists.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4), // Grade & score
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // Test counts
            Constraint::Min(0),
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }
    let Some(report) = app.report() else {
        let down = Paragraph::new(Line::from("Site down".bold().fg(Color::Red)))
            .alignment(Alignment::Center);
        frame.render_widget(down, summary_chunks[0]);
        return;
    };
    let scan = &report.scan;
    let color = grade_color(scan.grade);

    let grade_text = Text::from(vec![
        Line::from("Grade".bold()),
        Line::from(scan.grade.to_string().bold().fg(color)),
        Line::from(format!("{} (likelihood {})", scan.score, scan.likelihood_indicator)),
    ]);
    frame.render_widget(Paragraph::new(grade_text).alignment(Alignment::Center), summary_chunks[0]);

    // The gauge shows the graded score, which never drops below zero.
    let percent = grader::grade(scan.score).score.min(100) as u16;
    let gauge = Gauge::default()
        .percent(percent)
        .label("")
        .style(Style::default().fg(color));
    frame.render_widget(gauge, summary_chunks[1]);

    let counts = Text::from(vec![
        Line::from("TESTS".bold()),
        Line::from(vec![Span::raw("Passed: "), Span::styled(scan.tests_passed.to_string(), Style::default().fg(Color::Green))]),
        Line::from(vec![Span::raw("Failed: "), Span::styled(scan.tests_failed.to_string(), Style::default().fg(Color::Red))]),
        Line::from(format!("Total:  {}", scan.tests_quantity)),
    ]);
    frame.render_widget(Paragraph::new(counts), summary_chunks[3]);
}
