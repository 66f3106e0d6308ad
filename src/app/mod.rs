//! Application state and event handling

pub mod command;
pub mod controller;
pub mod input;
pub mod state;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::ui;
pub use controller::{BackendEvent, Controller, Flow};
use state::{Dialog, Screen};

/// The test clock advances once per second
const TICK: Duration = Duration::from_secs(1);

/// The main application
pub struct App {
    controller: Controller,

    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Create a new application instance
    pub fn new(controller: Controller) -> Result<Self> {
        let terminal = Self::setup_terminal()?;

        Ok(Self { controller, terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        self.controller.start();
        let mut last_tick = Instant::now();

        loop {
            if let Err(e) = self.controller.drain_events() {
                self.report(e);
            }

            let (state, config) = self.controller.view();
            self.terminal.draw(|frame| {
                ui::draw(frame, state, config);
            })?;

            // Handle events
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.controller.handle_key(key) {
                            Ok(Flow::Quit) => break,
                            Ok(Flow::Continue) => {}
                            Err(e) => self.report(e),
                        }
                    }
                }
            }

            if self.controller.state.screen() != Screen::TestActive {
                last_tick = Instant::now();
            } else if last_tick.elapsed() >= TICK {
                last_tick += TICK;
                if let Err(e) = self.controller.tick_second() {
                    self.report(e);
                }
            }

            // Let spawned backend calls make progress between frames
            tokio::task::yield_now().await;
        }

        self.restore_terminal()?;
        Ok(())
    }

    fn report(&mut self, e: anyhow::Error) {
        tracing::error!("{:#}", e);
        self.controller.state.dialog = Some(Dialog::error("Error", format!("{:#}", e)));
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
