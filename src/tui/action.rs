// Defines actions and events exchanged between the UI loop and the network actor.
use crate::controller::{CommitOutcome, ExtractionEvent};
use crate::model::{ExtractedRecord, ImageItem};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    /// Collect, extract, review and save.
    Batch,
    /// Rows already stored in the worksheet.
    Inventory,
}

#[derive(Debug)]
pub enum Action {
    Extract(Vec<ImageItem>),
    Commit(Vec<ExtractedRecord>),
    LoadInventory,
    /// 1-based worksheet row.
    DeleteSheetRow(usize),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    Extraction(ExtractionEvent),
    ExtractionDone(Vec<ExtractedRecord>),
    /// Sent as soon as the append call returns, before the confirmation pause.
    CommitReturned(CommitOutcome),
    /// Sent once the confirmation pause is over (or right away on failure).
    CommitFinished(CommitOutcome),
    InventoryLoaded(Vec<Vec<String>>),
    RowDeleted(usize),
    Error(String),
    Status(String),
}
