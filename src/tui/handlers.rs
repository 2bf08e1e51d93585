// File: ./src/tui/handlers.rs
// Handles input events and network events for the TUI.
use crate::controller::ExtractionEvent;
use crate::intake;
use crate::model::InputMethod;
use crate::session::Phase;
use crate::tui::action::{Action, AppEvent, Screen};
use crate::tui::state::{AppState, InputMode};
use crossterm::event::{KeyCode, KeyEvent};

pub fn handle_app_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Status(s) => state.set_status(s),
        AppEvent::Error(s) => state.set_error(s),

        AppEvent::Extraction(ev) => match ev {
            ExtractionEvent::Progressed { done, .. } => state.session.record_progress(done),
            ExtractionEvent::Failed { .. } => state.set_error(ev.status_text()),
            ExtractionEvent::Processing { .. } | ExtractionEvent::Complete { .. } => {
                state.set_status(ev.status_text())
            }
        },
        AppEvent::ExtractionDone(records) => {
            let count = records.len();
            state.session.finish_extraction(records);
            state.screen = Screen::Batch;
            state.grid_state.select(if count > 0 { Some(0) } else { None });
            state.set_status(format!("Processed {} images.", count));
        }

        AppEvent::CommitReturned(outcome) => {
            if outcome.is_saved() {
                state.set_status(outcome.message());
            } else {
                state.set_error(outcome.message());
            }
        }
        AppEvent::CommitFinished(outcome) => {
            if outcome.is_saved() {
                state.session.finish_commit_ok();
                state.set_status("Batch saved. Ready for the next one.");
            } else {
                state.session.finish_commit_failed(outcome.message());
                state.set_error(format!("{} (press s to retry)", outcome.message()));
            }
            state.clamp_selection();
        }

        AppEvent::InventoryLoaded(rows) => {
            state.inventory = rows;
            state.screen = Screen::Inventory;
            state.clamp_selection();
            if !state.error {
                state.set_status(format!(
                    "{} row(s) in '{}'",
                    state.inventory.len(),
                    state.worksheet
                ));
            }
        }
        AppEvent::RowDeleted(row_index) => {
            state.set_status(format!("Deleted row {}", row_index));
        }
    }
}

fn capture_photo(state: &mut AppState) {
    let Some(dir) = state.capture_dir.clone() else {
        state.set_error("No capture_dir set in config.toml");
        return;
    };
    match intake::capture_latest(&dir) {
        Ok(item) => {
            let name = item.name.clone();
            state.session.collect(vec![item]);
            state.set_status(format!("{} ready. Press x to extract.", name));
        }
        Err(e) => state.set_error(format!("Capture failed: {}", e)),
    }
}

fn collect_paths(state: &mut AppState) {
    let paths = intake::parse_path_list(&state.input_buffer);
    let collected = intake::collect_batch(&paths);
    let count = collected.items.len();
    state.skipped = collected.skipped;
    state.session.collect(collected.items);

    if count == 0 {
        state.set_error("No png/jpg/jpeg images found");
    } else if state.skipped.is_empty() {
        state.set_status(format!("{} image(s) ready. Press x to extract.", count));
    } else {
        state.set_status(format!(
            "{} image(s) ready, {} skipped. Press x to extract.",
            count,
            state.skipped.len()
        ));
    }
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match state.mode {
        InputMode::EnteringPaths => match key.code {
            KeyCode::Enter => {
                collect_paths(state);
                state.mode = InputMode::Normal;
                state.reset_input();
            }
            KeyCode::Esc => {
                state.mode = InputMode::Normal;
                state.reset_input();
            }
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::EditingCell => match key.code {
            KeyCode::Enter => {
                if let Some(row) = state.selected_row() {
                    let value = state.input_buffer.clone();
                    state.session.set_cell(row, state.selected_field, value);
                }
                state.mode = InputMode::Normal;
                state.reset_input();
            }
            KeyCode::Esc => {
                state.mode = InputMode::Normal;
                state.reset_input();
            }
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::Normal => {
            match key.code {
                KeyCode::Char('q') => return Some(Action::Quit),
                KeyCode::Char('?') => state.show_full_help = !state.show_full_help,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.previous(),
                _ => {}
            }
            match state.screen {
                Screen::Batch => return handle_batch_key(key, state),
                Screen::Inventory => return handle_inventory_key(key, state),
            }
        }
    }
    None
}

fn handle_batch_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let busy = state.session.phase().is_busy();
    match key.code {
        KeyCode::Tab if !busy => state.toggle_input_method(),
        KeyCode::Right | KeyCode::Char('l') => state.next_field(),
        KeyCode::Left | KeyCode::Char('h') => state.previous_field(),

        KeyCode::Char('c') if !busy => match state.session.input_method() {
            InputMethod::Camera => capture_photo(state),
            InputMethod::Batch => state.set_error("Switch to Camera with Tab to capture"),
        },
        KeyCode::Char('o') if !busy => match state.session.input_method() {
            InputMethod::Batch => {
                state.mode = InputMode::EnteringPaths;
                state.reset_input();
            }
            InputMethod::Camera => state.set_error("Switch to batch upload with Tab to add files"),
        },

        KeyCode::Char('x') => {
            if let Some(images) = state.session.start_extraction() {
                state.set_status(format!("Extracting data from {} image(s)...", images.len()));
                return Some(Action::Extract(images));
            }
            if !busy {
                state.set_error("No images collected");
            }
        }

        KeyCode::Char('e') | KeyCode::Enter if state.session.can_edit() => {
            if let Some(row) = state.selected_row() {
                let current = state.session.batch()[row].clone();
                state.load_input(state.selected_field.get(&current));
                state.mode = InputMode::EditingCell;
            }
        }
        KeyCode::Char('a') if state.session.can_edit() => {
            if let Some(row) = state.session.add_row() {
                state.grid_state.select(Some(row));
            }
        }
        KeyCode::Char('d') if state.session.can_edit() => {
            if let Some(row) = state.selected_row()
                && state.session.remove_row(row).is_some()
            {
                state.clamp_selection();
                state.set_status(format!("Removed row {}", row + 1));
            }
        }
        KeyCode::Char('s') => {
            if let Some(records) = state.session.begin_commit() {
                state.set_status(format!("Saving {} item(s) to Google Sheets...", records.len()));
                return Some(Action::Commit(records));
            }
        }
        KeyCode::Char('R') if !busy => {
            state.session.reset();
            state.skipped.clear();
            state.clamp_selection();
            state.set_status("Session cleared");
        }

        KeyCode::Char('i') if !busy => return Some(Action::LoadInventory),
        _ => {}
    }
    None
}

fn handle_inventory_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('i') => {
            state.screen = Screen::Batch;
            state.clamp_selection();
            state.set_status(match state.session.phase() {
                Phase::Review | Phase::CommitFailed(_) => "Back to review",
                _ => "Ready.",
            });
        }
        KeyCode::Char('r') => return Some(Action::LoadInventory),
        // The header occupies worksheet row 1; display index 0 is that row.
        KeyCode::Char('d') => match state.selected_row() {
            Some(0) => state.set_error("The header row cannot be deleted"),
            Some(i) => return Some(Action::DeleteSheetRow(i + 1)),
            None => {}
        },
        _ => {}
    }
    None
}
