//! The main synchronizer window.

use super::input::TextInput;
use super::tree::TreeState;
use super::ui::{self, Button};
use super::{MessageBox, Screen, WINDOW_TITLE, is_interrupt};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use partdb_sync::{
    BoardDocument, Config, GroupedFootprints, SyncError, SyncOutcome, SyncTask, commit, group,
    render, scan,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};
use std::path::PathBuf;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_SYNCING: &str = "Synchronizing...";
pub const STATUS_SYNCED: &str = "Synchronization completed successfully";
pub const STATUS_CONFIG_SAVED: &str = "Configuration saved";
pub const STATUS_BOARD_SAVED: &str = "Saved to board successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Url,
    Token,
    Synchronize,
    SaveConfig,
    Tree,
    SaveBoard,
    Close,
}

const FOCUS_ORDER: [Focus; 7] = [
    Focus::Url,
    Focus::Token,
    Focus::Synchronize,
    Focus::SaveConfig,
    Focus::Tree,
    Focus::SaveBoard,
    Focus::Close,
];

pub struct SyncScreen {
    board: BoardDocument,
    snapshot: GroupedFootprints,
    tree: TreeState,
    url: TextInput,
    token: TextInput,
    config_path: PathBuf,
    focus: Focus,
    task: SyncTask,
    status: String,
    message: Option<MessageBox>,
    should_quit: bool,
}

impl SyncScreen {
    pub fn new(board: BoardDocument, config: &Config, config_path: PathBuf) -> Self {
        let snapshot = group(scan(board.footprints()));
        log::info!(
            "Loaded {} footprints in {} groups from {}",
            snapshot.footprint_count(),
            snapshot.len(),
            board.path().display()
        );
        Self {
            tree: TreeState::new(render(&snapshot)),
            board,
            snapshot,
            url: TextInput::new(&config.api_url),
            token: TextInput::masked(&config.token),
            config_path,
            focus: Focus::Url,
            task: SyncTask::new(),
            status: STATUS_READY.to_string(),
            message: None,
            should_quit: false,
        }
    }

    /// Settings as currently typed.
    pub fn config(&self) -> Config {
        Config::new(&self.url.text, &self.token.text)
    }

    #[cfg(test)]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&MessageBox> {
        self.message.as_ref()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> &GroupedFootprints {
        &self.snapshot
    }

    pub fn is_syncing(&self) -> bool {
        self.task.is_running()
    }

    fn show_error(&mut self, message: String) {
        log::error!("{message}");
        self.status = format!("Error: {message}");
        self.message = Some(MessageBox::error(message));
    }

    pub fn synchronize(&mut self) {
        if self.is_syncing() {
            return;
        }
        match self.task.start(self.snapshot.clone(), self.config()) {
            Ok(()) => self.status = STATUS_SYNCING.to_string(),
            Err(SyncError::Busy) => {}
            Err(e) => {
                let field = match e {
                    SyncError::MissingUrl => "API URL",
                    _ => "API Token",
                };
                log::warn!("{e}");
                self.status = format!("Error: {field} is empty");
                self.message = Some(MessageBox::warning(e.to_string()));
            }
        }
    }

    /// Install the result of a finished run.
    pub fn apply_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Completed { snapshot, summary } => {
                log::info!("Synchronization finished: {summary}");
                self.tree.set_tree(render(&snapshot));
                self.snapshot = snapshot;
                self.status = STATUS_SYNCED.to_string();
            }
            SyncOutcome::Failed(e) => self.show_error(format!("Synchronization failed: {e}")),
        }
    }

    pub fn save_config(&mut self) {
        match self.config().save_to(&self.config_path) {
            Ok(()) => self.status = STATUS_CONFIG_SAVED.to_string(),
            Err(e) => self.show_error(format!("Error saving configuration: {e}")),
        }
    }

    pub fn save_to_board(&mut self) {
        let summary = commit(&self.snapshot, self.board.footprints_mut());
        if summary.missing > 0 {
            log::warn!("{} footprints could not be updated", summary.missing);
        }
        match self.board.save() {
            Ok(()) => self.status = STATUS_BOARD_SAVED.to_string(),
            Err(e) => self.show_error(format!("Error saving to board: {e}")),
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let i = FOCUS_ORDER
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0);
        let n = FOCUS_ORDER.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.focus = FOCUS_ORDER[next];
        // Skip the trigger while a run is in flight.
        if self.focus == Focus::Synchronize && self.is_syncing() {
            self.cycle_focus(forward);
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::Url | Focus::Token => self.cycle_focus(true),
            Focus::Synchronize => self.synchronize(),
            Focus::SaveConfig => self.save_config(),
            Focus::Tree => self.tree.toggle_expanded(),
            Focus::SaveBoard => self.save_to_board(),
            Focus::Close => self.should_quit = true,
        }
    }
}

impl Screen for SyncScreen {
    fn handle_key(&mut self, key: KeyEvent) {
        if is_interrupt(&key) {
            self.should_quit = true;
            return;
        }
        if self.message.is_some() {
            if MessageBox::dismisses(&key) {
                self.message = None;
            }
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) => self.cycle_focus(true),
            (KeyCode::BackTab, _) => self.cycle_focus(false),
            (KeyCode::Esc, _) => self.should_quit = true,
            (KeyCode::Enter, _) => self.activate(),
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => self.save_to_board(),
            _ => match self.focus {
                Focus::Url => {
                    self.url.handle_key(key.code, key.modifiers);
                }
                Focus::Token => {
                    self.token.handle_key(key.code, key.modifiers);
                }
                Focus::Tree => match key.code {
                    KeyCode::Up => self.tree.move_up(),
                    KeyCode::Down => self.tree.move_down(),
                    KeyCode::Right => self.tree.expand(),
                    KeyCode::Left => self.tree.collapse(),
                    KeyCode::Char(' ') => self.tree.toggle_expanded(),
                    _ => {}
                },
                _ => {}
            },
        }
    }

    fn tick(&mut self) {
        if let Some(outcome) = self.task.poll() {
            self.apply_outcome(outcome);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(1), // URL
                Constraint::Length(1), // Token
                Constraint::Length(1), // Synchronize / Save Configuration
                Constraint::Min(5),    // Tree
                Constraint::Length(1), // Save to Board / Close
                Constraint::Length(1), // Status
            ])
            .split(frame.area());

        ui::render_title(frame, WINDOW_TITLE, chunks[0]);
        ui::render_input(frame, "PartDB URL", &self.url, self.focus == Focus::Url, chunks[1]);
        ui::render_input(frame, "API Token", &self.token, self.focus == Focus::Token, chunks[2]);
        ui::render_buttons(
            frame,
            &[
                Button {
                    label: "Synchronize",
                    focused: self.focus == Focus::Synchronize,
                    enabled: !self.is_syncing(),
                },
                Button {
                    label: "Save Configuration",
                    focused: self.focus == Focus::SaveConfig,
                    enabled: true,
                },
            ],
            chunks[3],
        );
        ui::render_tree(frame, &self.tree, self.focus == Focus::Tree, chunks[4]);
        ui::render_buttons(
            frame,
            &[
                Button {
                    label: "Save to Board",
                    focused: self.focus == Focus::SaveBoard,
                    enabled: true,
                },
                Button {
                    label: "Close",
                    focused: self.focus == Focus::Close,
                    enabled: true,
                },
            ],
            chunks[5],
        );
        ui::render_status(
            frame,
            &self.status,
            "Tab focus · Enter activate · ←→ collapse/expand · Esc close",
            chunks[6],
        );

        if let Some(message) = &self.message {
            ui::render_message_box(frame, message);
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}
