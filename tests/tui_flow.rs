// The UI loop and the network actor together: keys produce actions, the actor
// runs them against the controller, and the resulting events drive the
// review session.
#![cfg(feature = "tui")]

use crossterm::event::{KeyCode, KeyEvent};
use labstock::controller::{ExtractionEvent, Extractor, InventoryController, InventoryStore};
use labstock::error::{ExtractionError, StorageError};
use labstock::model::{ExtractedRecord, Field, ImageItem};
use labstock::session::Phase;
use labstock::tui::action::{Action, AppEvent};
use labstock::tui::handlers::{handle_app_event, handle_key_event};
use labstock::tui::network::run_network_actor;
use labstock::tui::state::AppState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::Instant;

const CONFIRM_PAUSE: Duration = Duration::from_secs(2);

#[derive(Default)]
struct LabelReader {
    fail_all: bool,
}

impl Extractor for LabelReader {
    async fn extract(&self, image_bytes: &[u8]) -> Result<ExtractedRecord, ExtractionError> {
        if self.fail_all {
            return Err(ExtractionError::EmptyResponse);
        }
        Ok(ExtractedRecord::new(
            &format!("Ingredient {}", image_bytes[0]),
            "Sigma",
            "100",
        ))
    }
}

#[derive(Default)]
struct SheetFake {
    fail: bool,
    appended: Mutex<Vec<Vec<ExtractedRecord>>>,
}

impl InventoryStore for SheetFake {
    async fn append_batch(&self, records: &[ExtractedRecord]) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Network("timed out".to_string()));
        }
        self.appended.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, StorageError> {
        Ok(Vec::new())
    }

    async fn delete_row(&self, _row_index: usize) -> Result<(), StorageError> {
        Ok(())
    }
}

type Controller = InventoryController<LabelReader, SheetFake>;

fn images(n: u8) -> Vec<ImageItem> {
    (0..n)
        .map(|i| ImageItem::new(format!("label_{}.jpg", i), vec![i]))
        .collect()
}

fn key(c: char) -> KeyEvent {
    KeyEvent::from(KeyCode::Char(c))
}

fn start_actor(
    controller: Arc<Controller>,
    event_capacity: usize,
) -> (Sender<Action>, Receiver<AppEvent>) {
    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, event_rx) = mpsc::channel(event_capacity);
    tokio::spawn(run_network_actor(controller, action_rx, event_tx));
    (action_tx, event_rx)
}

/// Apply events to the UI state until one matches `stop`; that one is
/// applied too.
async fn pump_until(
    state: &mut AppState,
    events: &mut Receiver<AppEvent>,
    stop: impl Fn(&AppEvent) -> bool,
) {
    loop {
        let event = events.recv().await.expect("network actor stopped");
        let done = stop(&event);
        handle_app_event(state, event);
        if done {
            return;
        }
    }
}

async fn reviewed_state(
    action_tx: &Sender<Action>,
    events: &mut Receiver<AppEvent>,
    n: u8,
) -> AppState {
    let mut state = AppState::new();
    state.session.collect(images(n));

    let action = handle_key_event(key('x'), &mut state).expect("x starts extraction");
    action_tx.send(action).await.unwrap();
    pump_until(&mut state, events, |e| matches!(e, AppEvent::ExtractionDone(_))).await;

    assert_eq!(state.session.phase(), &Phase::Review);
    state
}

#[tokio::test(start_paused = true)]
async fn test_save_clears_batch_only_after_confirmation_pause() {
    let controller = Arc::new(
        Controller::new(
            Some(LabelReader::default()),
            Some(SheetFake::default()),
            Duration::ZERO,
        )
        .with_confirm_pause(CONFIRM_PAUSE),
    );
    let (action_tx, mut events) = start_actor(controller.clone(), 16);

    // 1. Extract two labels and fix one quantity in the grid
    let mut state = reviewed_state(&action_tx, &mut events, 2).await;
    assert_eq!(state.session.batch().len(), 2);
    assert!(state.session.set_cell(0, Field::Quantity, "750".to_string()));

    // 2. Save
    let action = handle_key_event(key('s'), &mut state).expect("s saves the batch");
    assert_eq!(state.session.phase(), &Phase::Committing);
    action_tx.send(action).await.unwrap();

    // 3. The confirmation shows while the grid is still there
    pump_until(&mut state, &mut events, |e| matches!(e, AppEvent::CommitReturned(_))).await;
    let returned_at = Instant::now();
    assert_eq!(state.message, "Successfully saved 2 items!");
    assert!(!state.error);
    assert_eq!(state.session.phase(), &Phase::Committing);
    assert_eq!(state.session.batch().len(), 2);

    // 4. After the pause the session is back to idle
    pump_until(&mut state, &mut events, |e| matches!(e, AppEvent::CommitFinished(_))).await;
    assert!(returned_at.elapsed() >= CONFIRM_PAUSE);
    assert_eq!(state.session.phase(), &Phase::Idle);
    assert!(state.session.batch().is_empty());

    let appended = controller.store().unwrap().appended.lock().unwrap().clone();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0][0].quantity_g, "750");
    assert_eq!(appended[0][1].ingredient, "Ingredient 1");
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_keeps_grid_and_allows_retry() {
    let controller = Arc::new(
        Controller::new(
            Some(LabelReader::default()),
            Some(SheetFake {
                fail: true,
                ..Default::default()
            }),
            Duration::ZERO,
        )
        .with_confirm_pause(CONFIRM_PAUSE),
    );
    let (action_tx, mut events) = start_actor(controller, 16);
    let mut state = reviewed_state(&action_tx, &mut events, 3).await;

    let action = handle_key_event(key('s'), &mut state).unwrap();
    action_tx.send(action).await.unwrap();
    let started = Instant::now();
    pump_until(&mut state, &mut events, |e| matches!(e, AppEvent::CommitFinished(_))).await;

    // No confirmation pause on failure.
    assert!(started.elapsed() < CONFIRM_PAUSE);
    assert!(matches!(state.session.phase(), Phase::CommitFailed(_)));
    assert_eq!(state.session.batch().len(), 3);
    assert!(state.error);
    assert!(state.message.starts_with("Error saving batch to Sheet"));

    assert!(matches!(
        handle_key_event(key('s'), &mut state),
        Some(Action::Commit(records)) if records.len() == 3
    ));
}

#[test]
fn test_save_key_outside_review_sends_nothing() {
    let mut state = AppState::new();
    assert!(handle_key_event(key('s'), &mut state).is_none());
    assert_eq!(state.session.phase(), &Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_every_failure_reaches_a_slow_ui() {
    let controller = Arc::new(Controller::new(
        Some(LabelReader { fail_all: true }),
        Some(SheetFake::default()),
        Duration::ZERO,
    ));
    // A tiny event queue the actor outruns immediately.
    let (action_tx, mut events) = start_actor(controller, 2);
    action_tx.send(Action::Extract(images(30))).await.unwrap();

    let mut failed_positions = Vec::new();
    let records = loop {
        match events.recv().await.expect("network actor stopped") {
            AppEvent::Extraction(ExtractionEvent::Failed { position, .. }) => {
                failed_positions.push(position)
            }
            AppEvent::ExtractionDone(records) => break records,
            _ => {}
        }
    };

    assert_eq!(failed_positions, (1..=30).collect::<Vec<_>>());
    assert_eq!(records.len(), 30);
    assert!(records.iter().all(ExtractedRecord::is_placeholder));
}
