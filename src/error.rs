// Error types reported at the boundaries of the two remote services.
use std::fmt;

/// Missing or unusable credentials at startup. Disables the affected client.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    MissingApiKey,
    MissingServiceAccount,
    InvalidServiceAccount(String),
    Io(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingApiKey => {
                write!(f, "Missing 'GEMINI_API_KEY' in secrets.toml or environment")
            }
            ConfigurationError::MissingServiceAccount => {
                write!(f, "Missing 'gcp_service_account' in secrets.toml")
            }
            ConfigurationError::InvalidServiceAccount(e) => {
                write!(f, "Invalid service account credentials: {}", e)
            }
            ConfigurationError::Io(e) => write!(f, "Could not read secrets: {}", e),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Failure of a single image extraction. Degrades to a placeholder row.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    NotConfigured,
    UndecodableImage(String),
    Network(String),
    Api { status: u16, message: String },
    Blocked(String),
    EmptyResponse,
    Parse(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::NotConfigured => write!(f, "Vision model is not configured"),
            ExtractionError::UndecodableImage(e) => write!(f, "Image could not be decoded: {}", e),
            ExtractionError::Network(e) => write!(f, "Network error: {}", e),
            ExtractionError::Api { status, message } => {
                write!(f, "Model API returned {}: {}", status, message)
            }
            ExtractionError::Blocked(reason) => write!(f, "Prompt blocked by model: {}", reason),
            ExtractionError::EmptyResponse => write!(f, "Model returned no text"),
            ExtractionError::Parse(e) => write!(f, "Response is not the expected JSON: {}", e),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Failure talking to the spreadsheet service. The in-memory batch is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    NotConnected,
    Auth(String),
    SpreadsheetNotFound(String),
    WorksheetCreate(String),
    Network(String),
    Api { status: u16, message: String },
    InvalidRow(usize),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotConnected => write!(f, "Not connected to Google Sheets."),
            StorageError::Auth(e) => write!(f, "Google authentication failed: {}", e),
            StorageError::SpreadsheetNotFound(id) => write!(f, "Spreadsheet not found: {}", id),
            StorageError::WorksheetCreate(e) => write!(f, "Could not create worksheet: {}", e),
            StorageError::Network(e) => write!(f, "Network error: {}", e),
            StorageError::Api { status, message } => {
                write!(f, "Sheets API returned {}: {}", status, message)
            }
            StorageError::InvalidRow(idx) => write!(f, "Invalid row index: {}", idx),
        }
    }
}

impl std::error::Error for StorageError {}
