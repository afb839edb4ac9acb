//! Grouping demo over built-in dummy footprints.

use super::tree::TreeState;
use super::ui::{self, Button};
use super::{MessageBox, Screen, is_interrupt};
use crossterm::event::{KeyCode, KeyEvent};
use partdb_sync::demo::demo_footprints;
use partdb_sync::{MemoryFootprint, group, render, scan, selected_references};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

pub struct DemoScreen {
    footprints: Vec<MemoryFootprint>,
    tree: TreeState,
    message: Option<MessageBox>,
    should_quit: bool,
}

impl DemoScreen {
    pub fn new() -> Self {
        let mut screen = Self {
            footprints: demo_footprints(),
            tree: TreeState::default(),
            message: None,
            should_quit: false,
        };
        screen.refresh();
        screen
    }

    /// Rescan and regroup the footprints.
    pub fn refresh(&mut self) {
        let snapshot = group(scan(&self.footprints));
        log::debug!("Grouped {} footprints into {} groups", snapshot.footprint_count(), snapshot.len());
        self.tree.set_tree(render(&snapshot));
    }

    /// Report the references covered by the selection.
    pub fn synchronize(&mut self) -> Vec<String> {
        let refs = selected_references(self.tree.tree(), &self.tree.selection());
        log::info!("Selected footprints: {refs:?}");
        let text = if refs.is_empty() {
            "No footprints selected".to_string()
        } else {
            format!("Selected footprints: {}", refs.join(", "))
        };
        self.message = Some(MessageBox::info("Synchronize", text));
        refs
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&MessageBox> {
        self.message.as_ref()
    }
}

impl Default for DemoScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for DemoScreen {
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
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.tree.move_up(),
            KeyCode::Down => self.tree.move_down(),
            KeyCode::Right => self.tree.expand(),
            KeyCode::Left => self.tree.collapse(),
            KeyCode::Enter => self.tree.toggle_expanded(),
            KeyCode::Char(' ') => self.tree.toggle_selected(),
            KeyCode::Char('s') => {
                self.synchronize();
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        ui::render_title(frame, "Footprint Grouping Demo", chunks[0]);
        ui::render_tree(frame, &self.tree, true, chunks[1]);
        ui::render_buttons(
            frame,
            &[
                Button {
                    label: "s Synchronize",
                    focused: false,
                    enabled: true,
                },
                Button {
                    label: "r Refresh",
                    focused: false,
                    enabled: true,
                },
                Button {
                    label: "q Close",
                    focused: false,
                    enabled: true,
                },
            ],
            chunks[2],
        );
        ui::render_status(
            frame,
            &format!("{} selected", self.tree.selection().len()),
            "↑↓ move · Space select · Enter expand",
            chunks[3],
        );
        if let Some(message) = &self.message {
            ui::render_message_box(frame, message);
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}
