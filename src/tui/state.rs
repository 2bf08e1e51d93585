// File: ./src/tui/state.rs
// Manages the application state for the TUI.
use crate::model::{Field, InputMethod};
use crate::session::ReviewSession;
use crate::tui::action::Screen;
use ratatui::widgets::TableState;
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum InputMode {
    Normal,
    /// Typing file or directory paths for batch mode.
    EnteringPaths,
    EditingCell,
}

pub struct AppState {
    // Data
    pub session: ReviewSession,
    pub inventory: Vec<Vec<String>>,
    pub capture_dir: Option<PathBuf>,
    pub worksheet: String,

    // UI State
    pub screen: Screen,
    pub mode: InputMode,
    pub grid_state: TableState,
    pub inventory_state: TableState,
    pub selected_field: Field,
    pub message: String,
    pub error: bool,
    pub skipped: Vec<String>,
    pub show_full_help: bool,

    // Input Buffers
    pub input_buffer: String,
    pub cursor_position: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: ReviewSession::new(),
            inventory: Vec::new(),
            capture_dir: None,
            worksheet: crate::config::DEFAULT_WORKSHEET.to_string(),

            screen: Screen::Batch,
            mode: InputMode::Normal,
            grid_state: TableState::default(),
            inventory_state: TableState::default(),
            selected_field: Field::Ingredient,
            message: "Starting...".to_string(),
            error: false,
            skipped: Vec::new(),
            show_full_help: false,

            input_buffer: String::new(),
            cursor_position: 0,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
        self.error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
        self.error = true;
    }

    pub fn toggle_input_method(&mut self) {
        let next = match self.session.input_method() {
            InputMethod::Camera => InputMethod::Batch,
            InputMethod::Batch => InputMethod::Camera,
        };
        if self.session.select_input(next) {
            self.skipped.clear();
            self.set_status(format!("Input method: {}", next));
        }
    }

    // --- INPUT BUFFER ---

    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }
    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }
    pub fn enter_char(&mut self, new_char: char) {
        // Safe insertion for UTF-8 strings
        let byte_index = self
            .input_buffer
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input_buffer.len());

        self.input_buffer.insert(byte_index, new_char);
        self.move_cursor_right();
    }
    pub fn delete_char(&mut self) {
        if self.cursor_position != 0 {
            let current_index = self.cursor_position;
            let before = self.input_buffer.chars().take(current_index - 1);
            let after = self.input_buffer.chars().skip(current_index);
            self.input_buffer = before.chain(after).collect();
            self.move_cursor_left();
        }
    }
    pub fn reset_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }
    pub fn load_input(&mut self, text: &str) {
        self.input_buffer = text.to_string();
        self.cursor_position = self.input_buffer.chars().count();
    }
    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input_buffer.chars().count())
    }

    // --- NAVIGATION ---

    fn visible_len(&self) -> usize {
        match self.screen {
            Screen::Batch => self.session.batch().len(),
            Screen::Inventory => self.inventory.len(),
        }
    }

    fn table_state_mut(&mut self) -> &mut TableState {
        match self.screen {
            Screen::Batch => &mut self.grid_state,
            Screen::Inventory => &mut self.inventory_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let state = self.table_state_mut();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let state = self.table_state_mut();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn next_field(&mut self) {
        let fields: Vec<Field> = Field::iter().collect();
        let idx = fields.iter().position(|f| *f == self.selected_field).unwrap_or(0);
        self.selected_field = fields[(idx + 1) % fields.len()];
    }

    pub fn previous_field(&mut self) {
        let fields: Vec<Field> = Field::iter().collect();
        let idx = fields.iter().position(|f| *f == self.selected_field).unwrap_or(0);
        self.selected_field = fields[(idx + fields.len() - 1) % fields.len()];
    }

    /// Keep the selection inside the current table after rows change.
    pub fn clamp_selection(&mut self) {
        let len = self.visible_len();
        let state = self.table_state_mut();
        match (len, state.selected()) {
            (0, _) => state.select(None),
            (_, None) => state.select(Some(0)),
            (len, Some(i)) if i >= len => state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn selected_row(&self) -> Option<usize> {
        match self.screen {
            Screen::Batch => self.grid_state.selected(),
            Screen::Inventory => self.inventory_state.selected(),
        }
        .filter(|i| *i < self.visible_len())
    }
}
