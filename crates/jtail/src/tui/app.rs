//! Main TUI application.
//!
//! Owns the terminal and the event loop. Background tasks (hub connection,
//! metrics poller) report through the action channel.

use std::io::{self, Stderr};
use std::panic::{set_hook, take_hook};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use jtail_stats::AlertThresholds;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::fs::File;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use super::action::Action;
use super::connection::Connection;
use super::event::{Event, EventHandler};
use super::poller::{self, POLL_INTERVAL};
use super::state::{KeyOutcome, TuiState};
use super::theme::Theme;
use super::ui;
use crate::client::{Credential, MonitorClient};

/// Render tick
const TICK_RATE: Duration = Duration::from_millis(100);

/// What the viewer connects to and how
#[derive(Debug)]
pub struct AppOptions {
    /// Hub address (`host:port`)
    pub addr: String,
    pub credential: Option<Credential>,
    /// Append every received line here
    pub record: Option<File>,
    /// Companion `/jfr/stats` client
    pub metrics: Option<MonitorClient>,
    pub thresholds: AlertThresholds,
}

/// Main TUI application.
pub struct App {
    terminal: Terminal<CrosstermBackend<Stderr>>,
    events: EventHandler,
    action_tx: UnboundedSender<Action>,
    action_rx: UnboundedReceiver<Action>,
    state: TuiState,
    theme: Theme,
    cancel: CancellationToken,
    /// Taken when the background tasks start
    options: Option<AppOptions>,
}

impl App {
    /// Create a new App instance.
    pub fn new(options: AppOptions) -> Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))
            .context("failed to create terminal")?;

        let events = EventHandler::new(TICK_RATE).context("failed to start input thread")?;
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let state = TuiState::new(
            options.addr.clone(),
            options.thresholds,
            options.record.is_some(),
            options.metrics.is_some(),
            Instant::now(),
        );

        Ok(Self {
            terminal,
            events,
            action_tx,
            action_rx,
            state,
            theme: Theme::default(),
            cancel: CancellationToken::new(),
            options: Some(options),
        })
    }

    /// Run the TUI application until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        self.enter()?;
        self.spawn_tasks();

        let result = self.event_loop().await;

        self.cancel.cancel();
        self.exit()?;
        result
    }

    fn spawn_tasks(&mut self) {
        let Some(options) = self.options.take() else {
            return;
        };

        let mut connection = Connection::new(options.addr, options.credential, self.action_tx.clone());
        if let Some(file) = options.record {
            connection = connection.with_record(file);
        }
        tokio::spawn(connection.run(self.cancel.clone()));

        if let Some(client) = options.metrics {
            tokio::spawn(poller::run(
                client,
                POLL_INTERVAL,
                self.action_tx.clone(),
                self.cancel.clone(),
            ));
        }
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                Some(event) = self.events.next() => {
                    if self.handle_event(event)? {
                        return Ok(());
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.state.apply(action, Instant::now());
                }
                else => return Ok(()),
            }
        }
    }

    /// Returns true when the app should quit
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        let now = Instant::now();

        match event {
            Event::Tick => {
                self.state.tick(now);
                self.draw(now)?;
            }
            Event::Resize => self.draw(now)?,
            Event::Key(key) => match self.state.handle_key(key, now) {
                KeyOutcome::Quit => return Ok(true),
                KeyOutcome::SaveBundle => {
                    let message = match self.save_bundle(now) {
                        Ok(path) => format!("Bundle saved to: {}", path),
                        Err(e) => format!("Bundle failed: {:#}", e),
                    };
                    self.state.notify(message, now);
                }
                KeyOutcome::Continue => {}
            },
        }

        Ok(false)
    }

    /// Write the local incident bundle to the working directory
    fn save_bundle(&self, now: Instant) -> Result<String> {
        let bundle = self.state.incident_bundle(now);
        let path = bundle.file_name();
        let json = serde_json::to_vec_pretty(&bundle).context("failed to serialize bundle")?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {}", path))?;
        Ok(path)
    }

    fn draw(&mut self, now: Instant) -> Result<()> {
        let state = &self.state;
        let theme = &self.theme;
        self.terminal
            .draw(|frame| ui::render(frame, state, theme, now))
            .context("failed to draw")?;
        Ok(())
    }

    /// Enter TUI mode.
    fn enter(&mut self) -> Result<()> {
        Self::init_panic_hook();
        enable_raw_mode().context("failed to enable raw mode")?;
        crossterm::execute!(io::stderr(), EnterAlternateScreen, cursor::Hide)
            .context("failed to enter alternate screen")?;
        self.terminal.clear().context("failed to clear terminal")?;
        Ok(())
    }

    /// Exit TUI mode.
    fn exit(&mut self) -> Result<()> {
        if crossterm::terminal::is_raw_mode_enabled()? {
            disable_raw_mode().context("failed to disable raw mode")?;
            crossterm::execute!(io::stderr(), LeaveAlternateScreen, cursor::Show)
                .context("failed to leave alternate screen")?;
        }
        Ok(())
    }

    /// Set up panic hook to restore terminal on panic.
    fn init_panic_hook() {
        let original_hook = take_hook();
        set_hook(Box::new(move |panic_info| {
            let _ = Self::restore_terminal();
            original_hook(panic_info);
        }));
    }

    /// Restore terminal state (for panic hook).
    fn restore_terminal() -> Result<()> {
        if crossterm::terminal::is_raw_mode_enabled()? {
            disable_raw_mode()?;
            crossterm::execute!(io::stderr(), LeaveAlternateScreen, cursor::Show)?;
        }
        Ok(())
    }
}
