// File: ./src/tui/view.rs
// Renders the TUI layout and widgets.
use crate::intake::CAMERA_PHOTO_NAME;
use crate::model::{Field, InputMethod};
use crate::session::Phase;
use crate::tui::action::Screen;
use crate::tui::state::{AppState, InputMode};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Tabs, Wrap},
};
use strum::IntoEnumIterator;

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, state, v_chunks[0]);
    match state.screen {
        Screen::Batch => draw_batch(f, state, v_chunks[1]),
        Screen::Inventory => draw_inventory(f, state, v_chunks[1]),
    }
    draw_footer(f, state, v_chunks[2]);

    if state.show_full_help {
        let area = centered_rect(60, 60, f.area());
        let p = Paragraph::new(full_help_text())
            .block(Block::default().borders(Borders::ALL).title(" Help "))
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(p, area);
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let titles: Vec<Line> = InputMethod::iter().map(|m| Line::from(m.to_string())).collect();
    let selected = InputMethod::iter()
        .position(|m| m == state.session.input_method())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Lab Inventory Scanner ")
                .title_alignment(Alignment::Center),
        );
    f.render_widget(tabs, area);
}

fn draw_batch(f: &mut Frame, state: &mut AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    draw_intake(f, state, chunks[0]);
    draw_grid(f, state, chunks[1]);
}

fn draw_intake(f: &mut Frame, state: &AppState, area: Rect) {
    if let Some(ratio) = state.session.progress() {
        let (done, total) = match state.session.phase() {
            Phase::Extracting { done, total } => (*done, *total),
            _ => (0, 0),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Extracting "))
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!("{}/{}", done, total));
        f.render_widget(gauge, area);
        return;
    }

    let images = state.session.images();
    let mut lines: Vec<Line> = Vec::new();
    if images.is_empty() {
        let hint = match state.session.input_method() {
            InputMethod::Camera => match &state.capture_dir {
                Some(dir) => format!("c: take the newest photo from {}", dir.display()),
                None => "Set capture_dir in config.toml to use the camera folder".to_string(),
            },
            InputMethod::Batch => "o: enter image files or folders".to_string(),
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    } else {
        let names: Vec<&str> = images.iter().map(|i| i.name.as_str()).collect();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} image(s): ", images.len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(names.join(", ")),
        ]));
        lines.push(Line::from(Span::styled(
            format!("x: Extract Data from {} Image(s)", images.len()),
            Style::default().fg(Color::Green),
        )));
    }
    if !state.skipped.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Skipped: {}", state.skipped.join("; ")),
            Style::default().fg(Color::Red),
        )));
    }

    let title = match state.session.input_method() {
        InputMethod::Camera => format!(" {} ", CAMERA_PHOTO_NAME),
        InputMethod::Batch => " Upload Images ".to_string(),
    };
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn draw_grid(f: &mut Frame, state: &mut AppState, area: Rect) {
    let selected_row = state.grid_state.selected();
    let editing = state.mode == InputMode::EditingCell;

    let header = Row::new(Field::iter().map(|field| {
        let style = if field == state.selected_field {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(field.to_string()).style(style)
    }));

    let rows: Vec<Row> = state
        .session
        .batch()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let cells = Field::iter().map(|field| {
                let is_current = selected_row == Some(i) && field == state.selected_field;
                if is_current && editing {
                    return Cell::from(format!("{}_", state.input_buffer))
                        .style(Style::default().fg(Color::Black).bg(Color::Yellow));
                }
                let text = field.get(record).to_string();
                let mut style = Style::default();
                if record.is_placeholder() {
                    style = style.fg(Color::Red);
                }
                if is_current {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Cell::from(text).style(style)
            });
            Row::new(cells)
        })
        .collect();

    let title = match state.session.phase() {
        Phase::Review => " Review & Edit All Items ".to_string(),
        Phase::Committing => " Saving batch to Google Sheets... ".to_string(),
        Phase::CommitFailed(_) => " Review & Edit All Items (not saved) ".to_string(),
        _ => " Batch ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_stateful_widget(table, area, &mut state.grid_state);
}

fn draw_inventory(f: &mut Frame, state: &mut AppState, area: Rect) {
    let width = state.inventory.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let rows: Vec<Row> = state
        .inventory
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(row.iter().map(|c| Cell::from(c.as_str()))).style(style)
        })
        .collect();

    let widths = vec![Constraint::Ratio(1, width as u32); width];
    let table = Table::new(rows, widths)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", state.worksheet)),
        );
    f.render_stateful_widget(table, area, &mut state.inventory_state);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    if state.mode == InputMode::EnteringPaths {
        let prefix = "Paths: ";
        let input = Paragraph::new(format!("{}{}", prefix, state.input_buffer)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Files or folders (quote paths with spaces), Enter to add "),
        );
        f.render_widget(input, area);

        let cursor_x = area.x + 1 + prefix.chars().count() as u16 + state.cursor_position as u16;
        f.set_cursor_position((
            cursor_x.min(area.x + area.width.saturating_sub(2)),
            area.y + 1,
        ));
        return;
    }

    let status_style = if state.error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let status = Paragraph::new(state.message.clone()).style(status_style).block(
        Block::default()
            .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
            .title(" Status "),
    );

    let help_str = match (state.screen, state.mode) {
        (_, InputMode::EditingCell) => "Enter:Apply Esc:Cancel",
        (Screen::Inventory, _) => "?:Help q:Quit r:Reload d:Delete row Esc:Back",
        (Screen::Batch, _) => "?:Help q:Quit Tab:Mode c:Capture o:Open x:Extract e:Edit a:Add d:Del s:Save",
    };
    let help = Paragraph::new(help_str).alignment(Alignment::Right).block(
        Block::default()
            .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
            .title(" Actions "),
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    f.render_widget(status, chunks[0]);
    f.render_widget(help, chunks[1]);
}

fn full_help_text() -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    vec![
        Line::from(Span::styled("Collect", bold)),
        Line::from("  Tab      Switch between Camera and batch upload"),
        Line::from("  c        Camera: take the newest photo from capture_dir"),
        Line::from("  o        Batch: type image files and/or folders"),
        Line::from("  x        Extract data from the collected images"),
        Line::from(""),
        Line::from(Span::styled("Review", bold)),
        Line::from("  j/k      Move between rows"),
        Line::from("  h/l      Move between columns"),
        Line::from("  e, Enter Edit the selected cell"),
        Line::from("  a        Add an empty row"),
        Line::from("  d        Delete the selected row"),
        Line::from("  s        Save all rows to the worksheet"),
        Line::from("  R        Discard the batch"),
        Line::from(""),
        Line::from(Span::styled("Worksheet", bold)),
        Line::from("  i        Show rows already saved"),
        Line::from("  d        Delete the selected saved row"),
        Line::from("  r        Reload"),
        Line::from(""),
        Line::from("  q        Quit"),
    ]
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
