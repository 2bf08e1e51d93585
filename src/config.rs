// File: ./src/config.rs
// Handles configuration and secrets loading, saving, and defaults.
use crate::context::AppContext;
use crate::error::ConfigurationError;
use anyhow::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WORKSHEET: &str = "Stock_In";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_extraction_delay() -> u64 {
    4
}
fn default_confirm_pause() -> u64 {
    2
}
fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}
fn default_drive_api_base() -> String {
    "https://www.googleapis.com".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Spreadsheet URL (`https://...`) or exact spreadsheet title.
    #[serde(default)]
    pub spreadsheet: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default = "default_model")]
    pub model: String,

    /// Pause between two consecutive extraction calls, in seconds.
    #[serde(default = "default_extraction_delay")]
    pub extraction_delay_secs: u64,
    /// How long the save confirmation stays up before the batch is cleared.
    #[serde(default = "default_confirm_pause")]
    pub confirm_pause_secs: u64,

    /// Directory the camera mode picks its newest photo from.
    #[serde(default)]
    pub capture_dir: Option<PathBuf>,

    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,
    #[serde(default = "default_drive_api_base")]
    pub drive_api_base: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet: String::new(),
            worksheet: default_worksheet(),
            model: default_model(),
            extraction_delay_secs: default_extraction_delay(),
            confirm_pause_secs: default_confirm_pause(),
            capture_dir: None,
            gemini_api_base: default_gemini_api_base(),
            sheets_api_base: default_sheets_api_base(),
            drive_api_base: default_drive_api_base(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        // Explicitly detect missing file so callers (onboarding) can behave accordingly.
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Detect whether an error from [`Config::load`] means the file is missing,
    /// either by our explicit message or by an IO NotFound in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            atomic_write(&path, toml_str)?;
            Ok(())
        })
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn extraction_delay(&self) -> Duration {
        Duration::from_secs(self.extraction_delay_secs)
    }

    pub fn confirm_pause(&self) -> Duration {
        Duration::from_secs(self.confirm_pause_secs)
    }
}

/// Google service-account key, as downloaded from the cloud console.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Contents of `secrets.toml`.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Secrets {
    #[serde(default, rename = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gcp_service_account: Option<ServiceAccountKey>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gcp_service_account", &self.gcp_service_account)
            .finish()
    }
}

impl Secrets {
    /// Read `secrets.toml`. A missing file yields empty secrets; the
    /// `GEMINI_API_KEY` environment variable takes precedence over the file.
    pub fn load(ctx: &dyn AppContext) -> Result<Self, ConfigurationError> {
        let path = ctx
            .get_secrets_file_path()
            .map_err(|e| ConfigurationError::Io(e.to_string()))?;

        let mut secrets = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| ConfigurationError::Io(format!("{}: {}", path.display(), e)))?;
            toml::from_str::<Secrets>(&contents)
                .map_err(|e| ConfigurationError::Io(format!("{}: {}", path.display(), e)))?
        } else {
            Secrets::default()
        };

        if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV)
            && !key.trim().is_empty()
        {
            secrets.gemini_api_key = Some(key);
        }

        Ok(secrets)
    }

    pub fn api_key(&self) -> Result<&str, ConfigurationError> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigurationError::MissingApiKey)
    }

    pub fn service_account(&self) -> Result<&ServiceAccountKey, ConfigurationError> {
        self.gcp_service_account
            .as_ref()
            .ok_or(ConfigurationError::MissingServiceAccount)
    }
}

fn lock_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    file_path.with_file_name(name)
}

fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(file_path))?;

    FileExt::lock_exclusive(&file)?;
    let result = f();
    FileExt::unlock(&file)?;
    result
}

/// Atomic write: Write to .tmp file then rename
fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
