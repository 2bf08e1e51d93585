// File: ./src/session.rs
//! One review session: collected images, the extracted batch and the phase
//! the flow is in.
//!
//! ```text
//! Idle -> Collected -> Extracting -> Review -> Committing -> Idle
//!                                      ^           |
//!                                      |           v
//!                                      +----- CommitFailed
//! ```
//!
//! Nothing here talks to the network. The controller drives the remote
//! calls and reports back through [`ReviewSession::finish_extraction`] and
//! the `finish_commit_*` methods.
use crate::model::{ExtractedRecord, Field, ImageItem, InputMethod};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Collected,
    Extracting {
        done: usize,
        total: usize,
    },
    Review,
    Committing,
    /// Last save failed; the grid is untouched and saving can be retried.
    CommitFailed(String),
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Extracting { .. } | Phase::Committing)
    }
}

#[derive(Debug, Default)]
pub struct ReviewSession {
    input_method: InputMethod,
    images: Vec<ImageItem>,
    batch: Vec<ExtractedRecord>,
    phase: Phase,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn input_method(&self) -> InputMethod {
        self.input_method
    }

    pub fn images(&self) -> &[ImageItem] {
        &self.images
    }

    pub fn batch(&self) -> &[ExtractedRecord] {
        &self.batch
    }

    fn has_batch_phase(&self) -> bool {
        matches!(self.phase, Phase::Review | Phase::CommitFailed(_))
    }

    /// Switch input mode. Collected images belong to the old mode and are
    /// dropped; a batch under review is kept.
    pub fn select_input(&mut self, method: InputMethod) -> bool {
        if self.phase.is_busy() {
            return false;
        }
        self.input_method = method;
        self.images.clear();
        if self.phase == Phase::Collected {
            self.phase = Phase::Idle;
        }
        true
    }

    /// Replace the collected images. While a batch is under review the phase
    /// does not change; the next extraction replaces that batch.
    pub fn collect(&mut self, items: Vec<ImageItem>) -> bool {
        if self.phase.is_busy() {
            return false;
        }
        self.images = items;
        if !self.has_batch_phase() {
            self.phase = if self.images.is_empty() {
                Phase::Idle
            } else {
                Phase::Collected
            };
        }
        true
    }

    pub fn can_extract(&self) -> bool {
        !self.images.is_empty() && !self.phase.is_busy()
    }

    /// Enter `Extracting` and hand out the images to process, in order.
    pub fn start_extraction(&mut self) -> Option<Vec<ImageItem>> {
        if !self.can_extract() {
            return None;
        }
        self.phase = Phase::Extracting {
            done: 0,
            total: self.images.len(),
        };
        Some(self.images.clone())
    }

    pub fn record_progress(&mut self, done: usize) {
        if let Phase::Extracting { total, .. } = self.phase {
            self.phase = Phase::Extracting {
                done: done.min(total),
                total,
            };
        }
    }

    /// Fraction of the current extraction run that has finished.
    pub fn progress(&self) -> Option<f64> {
        match self.phase {
            Phase::Extracting { done, total } if total > 0 => Some(done as f64 / total as f64),
            _ => None,
        }
    }

    /// The run is over: its records replace any previous batch.
    pub fn finish_extraction(&mut self, records: Vec<ExtractedRecord>) {
        if !matches!(self.phase, Phase::Extracting { .. }) {
            log::warn!("Extraction result arrived outside an extraction run; ignored");
            return;
        }
        self.batch = records;
        self.images.clear();
        self.phase = Phase::Review;
    }

    // --- GRID EDITING ---

    pub fn can_edit(&self) -> bool {
        self.has_batch_phase()
    }

    /// Overwrite one cell. No validation: any text is accepted.
    pub fn set_cell(&mut self, row: usize, field: Field, value: String) -> bool {
        if !self.can_edit() {
            return false;
        }
        match self.batch.get_mut(row) {
            Some(record) => {
                field.set(record, value);
                true
            }
            None => false,
        }
    }

    /// Append an empty row and return its index.
    pub fn add_row(&mut self) -> Option<usize> {
        if !self.can_edit() {
            return None;
        }
        self.batch.push(ExtractedRecord::default());
        Some(self.batch.len() - 1)
    }

    pub fn remove_row(&mut self, row: usize) -> Option<ExtractedRecord> {
        if !self.can_edit() || row >= self.batch.len() {
            return None;
        }
        Some(self.batch.remove(row))
    }

    // --- COMMIT ---

    /// Enter `Committing` and return a snapshot of the grid to save.
    pub fn begin_commit(&mut self) -> Option<Vec<ExtractedRecord>> {
        if !self.has_batch_phase() {
            return None;
        }
        self.phase = Phase::Committing;
        Some(self.batch.clone())
    }

    /// Saved: the batch is no longer needed.
    pub fn finish_commit_ok(&mut self) {
        if self.phase != Phase::Committing {
            return;
        }
        self.batch.clear();
        self.images.clear();
        self.phase = Phase::Idle;
    }

    /// Not saved: keep every row for another attempt.
    pub fn finish_commit_failed(&mut self, message: impl Into<String>) {
        if self.phase != Phase::Committing {
            return;
        }
        self.phase = Phase::CommitFailed(message.into());
    }

    /// Drop everything and start over.
    pub fn reset(&mut self) {
        if self.phase.is_busy() {
            return;
        }
        self.images.clear();
        self.batch.clear();
        self.phase = Phase::Idle;
    }
}
