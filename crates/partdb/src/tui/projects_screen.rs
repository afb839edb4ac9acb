//! Pick a PartDB project, or add a new one.

use super::input::TextInput;
use super::ui::{self, Button};
use super::{MessageBox, Screen, is_interrupt};
use crossterm::event::{KeyCode, KeyEvent};
use partdb_sync::ProjectPicker;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::border,
    widgets::{Block, Borders, List, ListItem, ListState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    NewName,
    Push,
    Close,
}

pub struct ProjectsScreen {
    picker: ProjectPicker,
    new_name: TextInput,
    focus: Focus,
    message: Option<MessageBox>,
    should_quit: bool,
}

impl ProjectsScreen {
    pub fn new(picker: ProjectPicker) -> Self {
        Self {
            picker,
            new_name: TextInput::default(),
            focus: Focus::List,
            message: None,
            should_quit: false,
        }
    }

    #[cfg(test)]
    pub fn picker(&self) -> &ProjectPicker {
        &self.picker
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&MessageBox> {
        self.message.as_ref()
    }

    fn add(&mut self) {
        if self.picker.add(&self.new_name.text) {
            self.new_name.clear();
        }
    }

    pub fn push(&mut self) {
        self.message = Some(match self.picker.push() {
            Ok(name) => MessageBox::info("Push", format!("Pushing project: {name}")),
            Err(e) => MessageBox::warning(e.to_string()),
        });
    }

    fn cycle_focus(&mut self, forward: bool) {
        const ORDER: [Focus; 4] = [Focus::List, Focus::NewName, Focus::Push, Focus::Close];
        let i = ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward { i + 1 } else { i + ORDER.len() - 1 };
        self.focus = ORDER[next % ORDER.len()];
    }
}

impl Screen for ProjectsScreen {
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
            KeyCode::Tab => self.cycle_focus(true),
            KeyCode::BackTab => self.cycle_focus(false),
            KeyCode::Esc => self.should_quit = true,
            _ => match self.focus {
                Focus::List => match key.code {
                    KeyCode::Up => self.picker.select_previous(),
                    KeyCode::Down => self.picker.select_next(),
                    KeyCode::Enter => self.push(),
                    _ => {}
                },
                Focus::NewName => {
                    if key.code == KeyCode::Enter {
                        self.add();
                    } else {
                        self.new_name.handle_key(key.code, key.modifiers);
                    }
                }
                Focus::Push if key.code == KeyCode::Enter => self.push(),
                Focus::Close if key.code == KeyCode::Enter => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        ui::render_title(frame, "PartDB Projects", chunks[0]);

        let items: Vec<ListItem> = self
            .picker
            .projects()
            .iter()
            .map(|name| ListItem::new(name.as_str()))
            .collect();
        let border_style = if self.focus == Focus::List {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_set(border::ROUNDED)
                    .border_style(border_style)
                    .title(" Projects "),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▸ ");
        let mut state = ListState::default().with_selected(self.picker.selected());
        frame.render_stateful_widget(list, chunks[1], &mut state);

        ui::render_input(
            frame,
            "New project",
            &self.new_name,
            self.focus == Focus::NewName,
            chunks[2],
        );
        ui::render_buttons(
            frame,
            &[
                Button {
                    label: "Push",
                    focused: self.focus == Focus::Push,
                    enabled: self.picker.selected().is_some(),
                },
                Button {
                    label: "Close",
                    focused: self.focus == Focus::Close,
                    enabled: true,
                },
            ],
            chunks[3],
        );
        ui::render_status(
            frame,
            &format!("{} projects", self.picker.projects().len()),
            "Tab focus · ↑↓ select · Enter add/push · Esc close",
            chunks[4],
        );
        if let Some(message) = &self.message {
            ui::render_message_box(frame, message);
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::testing::{draw, key, type_text};

    fn screen() -> ProjectsScreen {
        ProjectsScreen::new(ProjectPicker::new(vec![
            "Rev A".to_string(),
            "Rev B".to_string(),
        ]))
    }

    #[test]
    fn push_without_selection_warns() {
        let mut screen = screen();
        screen.handle_key(key(KeyCode::Enter));
        assert_eq!(
            screen.message(),
            Some(&MessageBox::warning("No project selected."))
        );
    }

    #[test]
    fn add_then_push() {
        let mut screen = screen();
        screen.handle_key(key(KeyCode::Tab));
        type_text(&mut screen, "Rev C");
        screen.handle_key(key(KeyCode::Enter));
        assert_eq!(screen.picker().projects(), ["Rev A", "Rev B", "Rev C"]);
        assert_eq!(screen.picker().selected(), Some(2));

        // Duplicates stay in the input and are not added.
        type_text(&mut screen, "Rev A");
        screen.handle_key(key(KeyCode::Enter));
        assert_eq!(screen.picker().projects().len(), 3);

        screen.handle_key(key(KeyCode::Tab));
        screen.handle_key(key(KeyCode::Enter));
        assert_eq!(
            screen.message().map(|m| m.text.as_str()),
            Some("Pushing project: Rev C")
        );
        assert!(draw(&mut screen).contains("Rev C"));
    }
}
