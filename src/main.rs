// src/main.rs

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::collections::BTreeMap;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use url::Url;
use vanguard_observatory::core::models::{ScanOptions, ScanOutcome};
use vanguard_observatory::{CheckRegistry, ScannerConfig, logging, run_full_scan};

mod app;
mod ui;

use app::{App, AppState};

/// Grades the HTTP security posture of a web host.
#[derive(Debug, Parser)]
#[command(name = "vanguard-observatory", version, about)]
struct Cli {
    /// Host to scan. Without one, the interactive UI starts.
    host: Option<String>,
    #[arg(long, default_value_t = 80)]
    http_port: u16,
    #[arg(long, default_value_t = 443)]
    https_port: u16,
    #[arg(long, default_value = "/")]
    path: String,
    /// Cookie sent with every request, as NAME=VALUE. Repeatable.
    #[arg(long = "cookie", value_parser = parse_pair)]
    cookies: Vec<(String, String)>,
    /// Header sent with every request, as NAME=VALUE. Repeatable.
    #[arg(long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,
    /// Allow scanning localhost and loopback addresses.
    #[arg(long)]
    allow_localhost: bool,
    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))
}

impl Cli {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            http_port: self.http_port,
            https_port: self.https_port,
            path: self.path.clone(),
            cookies: self.cookies.iter().cloned().collect::<BTreeMap<_, _>>(),
            headers: self.headers.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }

    fn scanner_config(&self) -> ScannerConfig {
        let mut config = ScannerConfig::from_env();
        if self.allow_localhost {
            config.allow_localhost = true;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        config
    }
}

/// Accepts either a bare host or a URL and returns the host part.
fn target_host(raw: &str) -> String {
    let raw = raw.trim();
    let with_scheme = if !raw.starts_with("http://") && !raw.starts_with("https://") {
        format!("https://{}", raw)
    } else {
        raw.to_string()
    };
    Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| raw.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::initialize_logging()?;
    info!(log = %log_path.display(), "Logging initialised.");

    let registry = Arc::new(CheckRegistry::default_checks().wrap_err("invalid check registry")?);
    let options = cli.scan_options();
    let config = cli.scanner_config();

    match &cli.host {
        Some(host) => run_headless(&target_host(host), &options, &config, &registry).await,
        None => run_tui(options, config, registry).await,
    }
}

/// Runs a single scan and prints the outcome as JSON.
async fn run_headless(
    host: &str,
    options: &ScanOptions,
    config: &ScannerConfig,
    registry: &CheckRegistry,
) -> Result<()> {
    let outcome = run_full_scan(host, options, config, registry).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    match outcome {
        ScanOutcome::Reported(_) => Ok(()),
        ScanOutcome::Failed { error } => Err(eyre!("{host}: {error}")),
    }
}

async fn run_tui(options: ScanOptions, config: ScannerConfig, registry: Arc<CheckRegistry>) -> Result<()> {
    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(options);
    let (tx, mut rx) = mpsc::channel(1);
    let scanner = Scanner { config, registry, tx };

    let result = event_loop(&mut terminal, &mut app, &scanner, &mut rx).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

/// What a background scan needs, cloned into each spawned task.
struct Scanner {
    config: ScannerConfig,
    registry: Arc<CheckRegistry>,
    tx: mpsc::Sender<ScanOutcome>,
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    scanner: &Scanner,
    rx: &mut mpsc::Receiver<ScanOutcome>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, scanner)?;
        }
        app.on_tick();

        if let Ok(outcome) = rx.try_recv() {
            app.finish(outcome);
        }
    }
    Ok(())
}

fn handle_events(app: &mut App, scanner: &Scanner) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match app.state {
                AppState::Idle => handle_idle_input(app, key.code, scanner),
                AppState::Finished => handle_finished_input(app, key.code),
                AppState::Scanning => {
                    if key.code == KeyCode::Char('q') { app.quit(); }
                }
            }
        }
    }
    Ok(())
}

/// Handles input while the user is typing a host.
fn handle_idle_input(app: &mut App, key_code: KeyCode, scanner: &Scanner) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => { app.input.pop(); },
        KeyCode::Enter => {
            if app.input.trim().is_empty() { return; }
            let target = target_host(&app.input);
            app.start_scan(target.clone());

            let options = app.options.clone();
            let config = scanner.config.clone();
            let registry = Arc::clone(&scanner.registry);
            let tx = scanner.tx.clone();
            tokio::spawn(async move {
                let outcome = run_full_scan(&target, &options, &config, &registry).await;
                let _ = tx.send(outcome).await;
            });
        }
        _ => {}
    }
}

/// Handles input while a report is on screen.
fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_are_extracted_from_urls() {
        assert_eq!(target_host("example.com"), "example.com");
        assert_eq!(target_host("https://example.com/login?next=/"), "example.com");
        assert_eq!(target_host("  http://Example.COM:8080 "), "example.com");
    }

    #[test]
    fn pairs_need_a_name() {
        assert_eq!(parse_pair("session=abc=def"), Ok(("session".into(), "abc=def".into())));
        assert_eq!(parse_pair("empty="), Ok(("empty".into(), String::new())));
        assert!(parse_pair("=value").is_err());
        assert!(parse_pair("novalue").is_err());
    }

    #[test]
    fn cli_flags_become_options() {
        let cli = Cli::parse_from([
            "vanguard-observatory",
            "example.com",
            "--https-port",
            "8443",
            "--path",
            "/admin",
            "--cookie",
            "a=1",
            "--header",
            "X-Test=yes",
        ]);
        let options = cli.scan_options();
        assert_eq!(options.http_port, 80);
        assert_eq!(options.https_port, 8443);
        assert_eq!(options.path, "/admin");
        assert_eq!(options.cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(options.headers.get("X-Test").map(String::as_str), Some("yes"));
    }
}
