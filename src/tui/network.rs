// Runs the remote calls for the TUI so the draw loop never blocks on them.
use crate::controller::{Extractor, InventoryController, InventoryStore};
use crate::tui::action::{Action, AppEvent};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};

/// Serve UI actions until `Quit` or until the UI drops its sender.
///
/// A commit sends `CommitReturned` as soon as the append call is back, then
/// holds a successful outcome for the confirmation pause before sending
/// `CommitFinished`, which is what lets the UI clear the batch.
pub async fn run_network_actor<E, S>(
    controller: Arc<InventoryController<E, S>>,
    mut action_rx: Receiver<Action>,
    event_tx: Sender<AppEvent>,
) where
    E: Extractor,
    S: InventoryStore,
{
    for err in controller.startup_errors() {
        let _ = event_tx.send(AppEvent::Error(err.clone())).await;
    }
    if controller.startup_errors().is_empty() {
        let _ = event_tx.send(AppEvent::Status("Ready.".to_string())).await;
    }

    // Actions run one at a time; a running extraction is never interleaved
    // with a commit.
    while let Some(action) = action_rx.recv().await {
        match action {
            Action::Quit => break,

            Action::Extract(images) => {
                // The extraction callback cannot wait on a full UI channel,
                // so events queue here and a relay delivers them in order.
                let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
                let relay_tx = event_tx.clone();
                let relay = tokio::spawn(async move {
                    while let Some(ev) = progress_rx.recv().await {
                        if relay_tx.send(AppEvent::Extraction(ev)).await.is_err() {
                            break;
                        }
                    }
                });

                let records = controller
                    .extract_all(&images, move |ev| {
                        let _ = progress_tx.send(ev);
                    })
                    .await;
                let _ = relay.await;
                let _ = event_tx.send(AppEvent::ExtractionDone(records)).await;
            }

            Action::Commit(records) => {
                let outcome = controller.commit(&records).await;
                let _ = event_tx.send(AppEvent::CommitReturned(outcome.clone())).await;
                if outcome.is_saved() {
                    tokio::time::sleep(controller.confirm_pause()).await;
                }
                let _ = event_tx.send(AppEvent::CommitFinished(outcome)).await;
            }

            Action::LoadInventory => {
                let _ = event_tx
                    .send(AppEvent::Status("Loading worksheet...".to_string()))
                    .await;
                match controller.read_inventory().await {
                    Ok(rows) => {
                        let _ = event_tx.send(AppEvent::InventoryLoaded(rows)).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::InventoryLoaded(Vec::new())).await;
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::DeleteSheetRow(row_index) => match controller.delete_row(row_index).await {
                Ok(()) => {
                    let _ = event_tx.send(AppEvent::RowDeleted(row_index)).await;
                    if let Ok(rows) = controller.read_inventory().await {
                        let _ = event_tx.send(AppEvent::InventoryLoaded(rows)).await;
                    }
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e)).await;
                }
            },
        }
    }
}
