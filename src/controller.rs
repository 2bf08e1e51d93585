// File: src/controller.rs
//! Session-scoped service handles and the two remote-facing steps of the
//! flow: sequential extraction and batch commit.
//!
//! Both handles are created once from [`Config`] and [`Secrets`]. A missing
//! credential disables its handle; the failure is reported and every later
//! call that needs the handle fails with a user-visible message instead.
//! No client error escapes this module: extraction degrades to placeholder
//! rows and commits reduce to a [`CommitOutcome`]. The session state itself
//! lives with the front end, which applies each outcome to its
//! [`ReviewSession`](crate::session::ReviewSession).
use crate::client::{
    GeminiClient, ServiceAccountAuth, SheetsClient, Spreadsheet, TokenProvider, build_client,
};
use crate::config::{Config, Secrets};
use crate::context::AppContext;
use crate::error::{ExtractionError, StorageError};
use crate::model::{ExtractedRecord, ImageItem};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

/// Anything that can turn one label image into a record.
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        image_bytes: &[u8],
    ) -> impl Future<Output = Result<ExtractedRecord, ExtractionError>> + Send;
}

impl Extractor for GeminiClient {
    fn extract(
        &self,
        image_bytes: &[u8],
    ) -> impl Future<Output = Result<ExtractedRecord, ExtractionError>> + Send {
        GeminiClient::extract(self, image_bytes)
    }
}

/// The durable store the reviewed batch is committed to.
pub trait InventoryStore: Send + Sync {
    fn append_batch(
        &self,
        records: &[ExtractedRecord],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn read_all(&self) -> impl Future<Output = Result<Vec<Vec<String>>, StorageError>> + Send;

    fn delete_row(&self, row_index: usize)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// A [`SheetsClient`] bound to the configured spreadsheet. The spreadsheet
/// is resolved on first use and remembered for the session.
#[derive(Debug)]
pub struct SheetStore {
    client: SheetsClient,
    identifier: String,
    opened: Mutex<Option<Spreadsheet>>,
}

impl SheetStore {
    pub fn new(client: SheetsClient, identifier: &str) -> Self {
        Self {
            client,
            identifier: identifier.to_string(),
            opened: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &SheetsClient {
        &self.client
    }

    async fn spreadsheet(&self) -> Result<Spreadsheet, StorageError> {
        let mut opened = self.opened.lock().await;
        if let Some(sheet) = opened.as_ref() {
            return Ok(sheet.clone());
        }
        let sheet = self.client.open_spreadsheet(&self.identifier).await?;
        *opened = Some(sheet.clone());
        Ok(sheet)
    }
}

impl InventoryStore for SheetStore {
    async fn append_batch(&self, records: &[ExtractedRecord]) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        let sheet = self.spreadsheet().await?;
        self.client.append_batch(&sheet, records).await
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, StorageError> {
        let sheet = self.spreadsheet().await?;
        self.client.read_all(&sheet).await
    }

    async fn delete_row(&self, row_index: usize) -> Result<(), StorageError> {
        let sheet = self.spreadsheet().await?;
        self.client.delete_row(&sheet, row_index).await
    }
}

/// Progress notifications emitted while a batch is being extracted.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// About to process image `position` (1-based) of `total`.
    Processing {
        position: usize,
        total: usize,
        name: String,
    },
    /// Image `position` failed; a placeholder row stands in for it.
    Failed { position: usize, message: String },
    /// `done` of `total` images finished.
    Progressed { done: usize, total: usize },
    Complete { total: usize },
}

impl ExtractionEvent {
    /// Status line for the event, as shown to the user.
    pub fn status_text(&self) -> String {
        match self {
            ExtractionEvent::Processing {
                position,
                total,
                name,
            } => format!("Processing {}/{}: {}...", position, total, name),
            ExtractionEvent::Failed { position, message } => {
                format!("Image {} failed: {}", position, message)
            }
            ExtractionEvent::Progressed { done, total } => format!("{}/{} done", done, total),
            ExtractionEvent::Complete { total } => format!("Processed {} images.", total),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Saved { count: usize },
    Failed { message: String },
}

impl CommitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, CommitOutcome::Saved { .. })
    }

    pub fn message(&self) -> String {
        match self {
            CommitOutcome::Saved { count } => format!("Successfully saved {} items!", count),
            CommitOutcome::Failed { message } => message.clone(),
        }
    }
}

pub struct InventoryController<E, S> {
    extractor: Option<E>,
    store: Option<S>,
    extraction_delay: Duration,
    confirm_pause: Duration,
    startup_errors: Vec<String>,
}

/// The controller wired to the real services.
pub type LabController = InventoryController<GeminiClient, SheetStore>;

impl LabController {
    /// Read `secrets.toml` through `ctx` and build the controller from it.
    /// An unreadable secrets file is the single startup error reported and
    /// leaves both handles disabled.
    pub fn from_context(config: &Config, ctx: &dyn AppContext) -> Self {
        match Secrets::load(ctx) {
            Ok(secrets) => Self::from_config(config, &secrets),
            Err(e) => {
                log::error!("{}", e);
                let mut controller = Self::new(None, None, config.extraction_delay());
                controller.confirm_pause = config.confirm_pause();
                controller.startup_errors = vec![e.to_string()];
                controller
            }
        }
    }

    /// Build both service handles. Credential problems are logged and kept
    /// in [`InventoryController::startup_errors`]; they never abort startup.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        let http = build_client();
        let mut startup_errors = Vec::new();

        let extractor = match secrets.api_key() {
            Ok(key) => {
                match GeminiClient::new(http.clone(), &config.gemini_api_base, &config.model, key) {
                    Ok(client) => {
                        log::info!("Vision model ready: {}", client.model());
                        Some(client)
                    }
                    Err(e) => {
                        startup_errors.push(format!("Vision model setup failed: {}", e));
                        None
                    }
                }
            }
            Err(e) => {
                startup_errors.push(e.to_string());
                None
            }
        };

        let store = match secrets
            .service_account()
            .and_then(|account| ServiceAccountAuth::new(account.clone(), http.clone()))
        {
            Ok(auth) => {
                log::info!("Using service account {}", auth.client_email());
                match SheetsClient::new(
                    http,
                    TokenProvider::ServiceAccount(auth),
                    &config.sheets_api_base,
                    &config.drive_api_base,
                    &config.worksheet,
                ) {
                    Ok(client) => Some(SheetStore::new(client, &config.spreadsheet)),
                    Err(e) => {
                        startup_errors.push(format!("Google Sheets Connection Error: {}", e));
                        None
                    }
                }
            }
            Err(e) => {
                startup_errors.push(e.to_string());
                None
            }
        };

        for err in &startup_errors {
            log::error!("{}", err);
        }

        let mut controller = Self::new(extractor, store, config.extraction_delay());
        controller.confirm_pause = config.confirm_pause();
        controller.startup_errors = startup_errors;
        controller
    }
}

impl<E: Extractor, S: InventoryStore> InventoryController<E, S> {
    pub fn new(extractor: Option<E>, store: Option<S>, extraction_delay: Duration) -> Self {
        Self {
            extractor,
            store,
            extraction_delay,
            confirm_pause: Duration::ZERO,
            startup_errors: Vec::new(),
        }
    }

    pub fn with_confirm_pause(mut self, pause: Duration) -> Self {
        self.confirm_pause = pause;
        self
    }

    pub fn startup_errors(&self) -> &[String] {
        &self.startup_errors
    }

    pub fn extraction_delay(&self) -> Duration {
        self.extraction_delay
    }

    pub fn confirm_pause(&self) -> Duration {
        self.confirm_pause
    }

    pub fn extractor(&self) -> Option<&E> {
        self.extractor.as_ref()
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    /// Extract one image. Failures are logged and returned as the message
    /// to show; the caller decides what stands in for the record.
    pub async fn extract_one(&self, image_bytes: &[u8]) -> Result<ExtractedRecord, String> {
        let result = match &self.extractor {
            Some(extractor) => extractor.extract(image_bytes).await,
            None => Err(ExtractionError::NotConfigured),
        };
        result.map_err(|e| {
            log::warn!("Extraction failed: {}", e);
            format!("Error extracting data: {}", e)
        })
    }

    /// Process `images` strictly in order, one call at a time, pausing for
    /// the configured delay between consecutive calls. The result always has
    /// one record per image; a failed image yields the placeholder record.
    pub async fn extract_all<F>(&self, images: &[ImageItem], mut on_event: F) -> Vec<ExtractedRecord>
    where
        F: FnMut(ExtractionEvent) + Send,
    {
        let total = images.len();
        let mut records = Vec::with_capacity(total);

        for (i, image) in images.iter().enumerate() {
            on_event(ExtractionEvent::Processing {
                position: i + 1,
                total,
                name: image.name.clone(),
            });

            match self.extract_one(&image.bytes).await {
                Ok(record) => {
                    log::info!("Extracted '{}' from {}", record.ingredient, image.name);
                    records.push(record);
                }
                Err(message) => {
                    on_event(ExtractionEvent::Failed {
                        position: i + 1,
                        message,
                    });
                    records.push(ExtractedRecord::failed());
                }
            }

            on_event(ExtractionEvent::Progressed { done: i + 1, total });

            if i + 1 < total {
                tokio::time::sleep(self.extraction_delay).await;
            }
        }

        on_event(ExtractionEvent::Complete { total });
        records
    }

    /// Append the batch in a single call.
    pub async fn commit(&self, records: &[ExtractedRecord]) -> CommitOutcome {
        let Some(store) = &self.store else {
            log::error!("Commit attempted without a spreadsheet connection");
            return CommitOutcome::Failed {
                message: StorageError::NotConnected.to_string(),
            };
        };

        match store.append_batch(records).await {
            Ok(()) => {
                log::info!("Committed {} record(s)", records.len());
                CommitOutcome::Saved {
                    count: records.len(),
                }
            }
            Err(e) => {
                log::error!("Batch commit failed: {}", e);
                CommitOutcome::Failed {
                    message: format!("Error saving batch to Sheet: {}", e),
                }
            }
        }
    }

    /// Every row currently in the worksheet.
    pub async fn read_inventory(&self) -> Result<Vec<Vec<String>>, String> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| StorageError::NotConnected.to_string())?;
        store.read_all().await.map_err(|e| {
            log::warn!("Reading inventory failed: {}", e);
            format!("Error reading Sheet: {}", e)
        })
    }

    /// Delete worksheet row `row_index` (1-based, header is row 1).
    pub async fn delete_row(&self, row_index: usize) -> Result<(), String> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| StorageError::NotConnected.to_string())?;
        store.delete_row(row_index).await.map_err(|e| {
            log::error!("Deleting row {} failed: {}", row_index, e);
            format!("Error deleting row: {}", e)
        })
    }
}
