//! Interactive terminal dashboard.

mod keys;
mod ui;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use arboard::Clipboard;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use portscope_core::{
    Config, Dashboard, DashboardHost, DashboardView, Error, Platform, PortOrganizer, PortRegistry,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<Stdout>;

/// Renders the dashboard into the terminal and owns the clipboard.
struct TerminalHost {
    terminal: Terminal<Backend>,
    clipboard: Option<Clipboard>,
}

impl DashboardHost for TerminalHost {
    fn render(&mut self, view: &DashboardView<'_>) -> portscope_core::Result<()> {
        self.terminal.draw(|f| ui::draw(f, view))?;
        Ok(())
    }

    fn copy_to_clipboard(&mut self, text: &str) -> portscope_core::Result<()> {
        let clipboard = self
            .clipboard
            .as_mut()
            .ok_or_else(|| Error::UnsupportedPlatform("Clipboard unavailable".to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::UnsupportedPlatform(format!("Clipboard error: {}", e)))
    }
}

pub async fn run(config: &Config) -> Result<()> {
    let keymap = config.keymap()?;
    let registry = PortRegistry::with_freshness(Platform::detect(), config.freshness_window());
    let organizer = PortOrganizer::new(config.classifier());

    let clipboard = match Clipboard::new() {
        Ok(clipboard) => Some(clipboard),
        Err(e) => {
            warn!(error = %e, "Clipboard unavailable");
            None
        }
    };
    let host = TerminalHost {
        terminal: setup_terminal()?,
        clipboard,
    };

    let mut dashboard = Dashboard::new(registry, organizer, keymap, host)
        .with_confirm_unexpected_kills(config.confirm_unexpected_kills);

    info!(platform = dashboard.registry().adapter().name(), "Dashboard started");
    let res = run_app(&mut dashboard, config.refresh_interval()).await;

    let mut host = dashboard.into_host();
    restore_terminal(&mut host.terminal)?;
    res
}

fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }
    match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            Err(e.into())
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Event loop: one key at a time, auto-refresh on the configured interval.
async fn run_app(
    dashboard: &mut Dashboard<Platform, TerminalHost>,
    refresh_interval: Duration,
) -> Result<()> {
    dashboard.start().await;
    let mut last_refresh = Instant::now();

    while !dashboard.should_quit() {
        let timeout = refresh_interval
            .checked_sub(last_refresh.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(TICK_RATE);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(name) = keys::key_name(&key) {
                        dashboard.handle_key(&name).await;
                        if dashboard.take_finished_kill() {
                            let queued = queued_keys()?;
                            dashboard.handle_queued_keys(&queued).await;
                        }
                    }
                }
                Event::Resize(_, _) => dashboard.render(),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            dashboard.refresh().await;
            dashboard.render();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Key presses the terminal buffered while a handler was awaiting.
fn queued_keys() -> Result<Vec<String>> {
    let mut pending = Vec::new();
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                pending.extend(keys::key_name(&key));
            }
        }
    }
    Ok(pending)
}
