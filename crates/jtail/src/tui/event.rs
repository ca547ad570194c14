//! Terminal input and the render tick.
//!
//! Input is read on a dedicated OS thread that owns `crossterm::event::read`,
//! so a key is never dropped between ticks. Ticks come from a tokio interval.
//! Both feed one channel.

use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc::{self, UnboundedSender};

/// How long the input thread waits before checking whether the app is gone
const INPUT_POLL: Duration = Duration::from_millis(250);

/// TUI events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Render tick
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize,
}

/// Event handler merging terminal input with a render tick.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler ticking at `tick_rate`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(tick_rate: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let input_tx = tx.clone();
        thread::Builder::new()
            .name("jtail-input".into())
            .spawn(move || read_input(input_tx))?;

        tokio::spawn(async move {
            let mut tick_interval = tokio::time::interval(tick_rate);
            loop {
                tick_interval.tick().await;
                if tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Ok(Self { rx })
    }

    /// Get the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Blocking input loop; returns once the receiver is dropped or input fails
fn read_input(tx: UnboundedSender<Event>) {
    while !tx.is_closed() {
        match event::poll(INPUT_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(_) => return,
        }

        let Ok(raw) = event::read() else {
            return;
        };

        if let Some(event) = translate(raw)
            && tx.send(event).is_err()
        {
            return;
        }
    }
}

fn translate(raw: CrosstermEvent) -> Option<Event> {
    match raw {
        // Only key presses (not releases on Windows)
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(..) => Some(Event::Resize),
        _ => None,
    }
}
