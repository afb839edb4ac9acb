//! Terminal front end: one screen at a time in a fixed-rate event loop.

mod demo_screen;
mod input;
mod projects_screen;
mod sync_screen;
mod tree;
mod ui;

pub use demo_screen::DemoScreen;
pub use projects_screen::ProjectsScreen;
pub use sync_screen::SyncScreen;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

pub const WINDOW_TITLE: &str = "PartDB Synchronizer";

/// An interactive screen driven by [`run`].
pub trait Screen {
    fn handle_key(&mut self, key: KeyEvent);

    /// Called once per frame; poll background work here.
    fn tick(&mut self) {}

    fn render(&mut self, frame: &mut Frame);

    fn should_quit(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// Modal message that blocks other input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBox {
    pub kind: MessageKind,
    pub title: String,
    pub text: String,
}

impl MessageBox {
    pub fn info(title: &str, text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            title: title.to_string(),
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            title: "Warning".to_string(),
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            title: "Error".to_string(),
            text: text.into(),
        }
    }

    /// Whether `key` closes the box.
    pub fn dismisses(key: &KeyEvent) -> bool {
        matches!(
            key.code,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')
        )
    }
}

/// Ctrl+C closes any screen.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Run `screen` until it asks to quit.
pub fn run<S: Screen>(screen: &mut S) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, screen);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: Screen>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    screen: &mut S,
) -> Result<()> {
    // ~30Hz is plenty for a form and a table
    const FRAME_TIME: Duration = Duration::from_millis(33);

    loop {
        let frame_start = Instant::now();

        let mut events_processed = 0usize;
        while event::poll(Duration::from_millis(0))? && events_processed < 100 {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    screen.handle_key(key);
                }
            }
            events_processed += 1;
            if screen.should_quit() {
                break;
            }
        }
        if screen.should_quit() {
            break;
        }

        screen.tick();

        terminal.draw(|f| screen.render(f))?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}
