// src/app.rs

use ratatui::widgets::ListState;
use vanguard_observatory::core::models::{ScanOptions, ScanOutcome, ScanReport, TestEntry};

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    /// Target being scanned, once Enter has been pressed.
    pub target: Option<String>,
    pub options: ScanOptions,
    pub outcome: Option<ScanOutcome>,
    pub tests_list_state: ListState,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            should_quit: false,
            state: AppState::Idle,
            input: String::new(),
            target: None,
            options,
            outcome: None,
            tests_list_state: ListState::default(),
            spinner_frame: 0,
        }
    }

    pub fn report(&self) -> Option<&ScanReport> {
        self.outcome.as_ref().and_then(ScanOutcome::report)
    }

    pub fn start_scan(&mut self, target: String) {
        self.target = Some(target);
        self.state = AppState::Scanning;
    }

    pub fn finish(&mut self, outcome: ScanOutcome) {
        let has_tests = outcome.report().is_some_and(|r| !r.tests.is_empty());
        self.outcome = Some(outcome);
        self.state = AppState::Finished;
        self.tests_list_state.select(has_tests.then_some(0));
    }

    /// The test under the cursor, by name.
    pub fn selected_test(&self) -> Option<(&String, &TestEntry)> {
        let index = self.tests_list_state.selected()?;
        self.report()?.tests.iter().nth(index)
    }

    fn test_count(&self) -> usize {
        self.report().map_or(0, |r| r.tests.len())
    }

    pub fn select_previous(&mut self) {
        let count = self.test_count();
        if count == 0 {
            return;
        }
        let index = match self.tests_list_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.tests_list_state.select(Some(index));
    }

    pub fn select_next(&mut self) {
        let count = self.test_count();
        if count == 0 {
            return;
        }
        let index = match self.tests_list_state.selected() {
            Some(i) if i + 1 < count => i + 1,
            _ => 0,
        };
        self.tests_list_state.select(Some(index));
    }

    pub fn on_tick(&mut self) {
        if matches!(self.state, AppState::Scanning) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    pub fn quit(&mut self) { self.should_quit = true; }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.target = None;
        self.outcome = None;
        self.tests_list_state = ListState::default();
        self.spinner_frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vanguard_observatory::core::models::CheckResult;
    use vanguard_observatory::core::scanner::assemble_report;

    fn finished_app() -> App {
        let results = vec![
            CheckResult { pass: Some(true), ..CheckResult::neutral("a") },
            CheckResult { pass: Some(false), score_modifier: -20, ..CheckResult::neutral("b") },
            CheckResult::neutral("c"),
        ];
        let mut app = App::new(ScanOptions::default());
        app.start_scan("example.com".to_string());
        app.finish(ScanOutcome::Reported(assemble_report(&results, BTreeMap::new(), 3)));
        app
    }

    #[test]
    fn finishing_selects_the_first_test() {
        let app = finished_app();
        assert!(matches!(app.state, AppState::Finished));
        assert_eq!(app.selected_test().map(|(name, _)| name.as_str()), Some("a"));
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut app = finished_app();
        app.select_previous();
        assert_eq!(app.selected_test().unwrap().0, "c");
        app.select_next();
        assert_eq!(app.selected_test().unwrap().0, "a");
        app.select_next();
        assert_eq!(app.selected_test().unwrap().0, "b");
    }

    #[test]
    fn site_down_has_nothing_to_select() {
        let mut app = App::new(ScanOptions::default());
        app.finish(ScanOutcome::site_down());
        assert!(app.selected_test().is_none());
        app.select_next();
        assert!(app.selected_test().is_none());
    }

    #[test]
    fn reset_clears_the_scan() {
        let mut app = finished_app();
        app.reset();
        assert!(matches!(app.state, AppState::Idle));
        assert!(app.outcome.is_none());
        assert!(app.target.is_none());
    }
}
