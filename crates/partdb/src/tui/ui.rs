//! Widgets shared by the screens.

use super::input::TextInput;
use super::tree::TreeState;
use super::{MessageBox, MessageKind};
use partdb_sync::TreeItem;
use partdb_sync::present::COLUMNS;
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

/// One button in a button row.
pub struct Button<'a> {
    pub label: &'a str,
    pub focused: bool,
    pub enabled: bool,
}

pub fn render_title(frame: &mut Frame, title: &str, area: Rect) {
    let line = Line::from(vec![
        Span::styled("▌ ", Style::default().fg(Color::Yellow)),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Labelled single-line input with a block cursor when focused.
pub fn render_input(frame: &mut Frame, label: &str, input: &TextInput, focused: bool, area: Rect) {
    let label_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text_style = Style::default().fg(Color::White);
    let cursor_style = Style::default().fg(Color::White).bg(Color::DarkGray);

    let (text, cursor) = input.display();
    let byte_cursor = text
        .char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (before, after) = text.split_at(byte_cursor);

    let mut spans = vec![Span::styled(format!("{label:<14}"), label_style)];
    if !focused {
        spans.push(Span::styled(text.clone(), text_style));
    } else {
        spans.push(Span::styled(before.to_string(), text_style));
        let mut rest = after.chars();
        match rest.next() {
            Some(c) => {
                spans.push(Span::styled(c.to_string(), cursor_style));
                spans.push(Span::styled(rest.as_str().to_string(), text_style));
            }
            None => spans.push(Span::styled("█", Style::default().fg(Color::White))),
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_buttons(frame: &mut Frame, buttons: &[Button], area: Rect) {
    let mut spans = Vec::new();
    for button in buttons {
        let style = if !button.enabled {
            Style::default().fg(Color::DarkGray)
        } else if button.focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(format!("[ {} ]", button.label), style));
        spans.push(Span::raw("  "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Group rows with their expanded children; selected rows are marked with `*`.
pub fn render_tree(frame: &mut Frame, state: &TreeState, focused: bool, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let tree = state.tree();

    let rows: Vec<Row> = state
        .rows()
        .into_iter()
        .filter_map(|item| {
            let mark = if state.is_selected(item) { "*" } else { " " };
            let (prefix, cells, style) = match item {
                TreeItem::Group(g) => {
                    let group = tree.groups.get(g)?;
                    let arrow = if state.is_expanded(g) { "▾" } else { "▸" };
                    (format!("{mark}{arrow} "), group.cells(), Style::default())
                }
                TreeItem::Child(g, c) => {
                    let child = tree.groups.get(g)?.children.get(c)?;
                    (format!("{mark}    "), child.cells(), dim)
                }
            };
            let [references, rest @ ..] = cells;
            let mut row_cells = vec![Cell::from(format!("{prefix}{references}"))];
            row_cells.extend(rest.into_iter().map(Cell::from));
            Some(Row::new(row_cells).style(style))
        })
        .collect();

    let header = Row::new(COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Percentage(28),
        Constraint::Length(5),
        Constraint::Percentage(18),
        Constraint::Length(10),
        Constraint::Percentage(22),
        Constraint::Length(14),
    ];
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        dim
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(border_style),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default().with_selected(if focused && !tree.is_empty() {
        Some(state.cursor())
    } else {
        None
    });
    frame.render_stateful_widget(table, area, &mut table_state);
}

pub fn render_status(frame: &mut Frame, status: &str, hints: &str, area: Rect) {
    let style = if status.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Blue)
    };
    let line = Line::from(vec![
        Span::styled(format!("  {status}"), style),
        Span::styled(format!("   {hints}"), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Centered modal overlay.
pub fn render_message_box(frame: &mut Frame, message: &MessageBox) {
    let area = frame.area();
    let width = 60.min(area.width.saturating_sub(4));
    let height = 7.min(area.height.saturating_sub(2));
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 3,
        width,
        height,
    );
    let color = match message.kind {
        MessageKind::Info => Color::Blue,
        MessageKind::Warning => Color::Yellow,
        MessageKind::Error => Color::Red,
    };

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", message.title));
    let text = vec![
        Line::from(message.text.as_str()),
        Line::from(""),
        Line::from(Span::styled("[ OK ]", Style::default().fg(color))),
    ];
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}
