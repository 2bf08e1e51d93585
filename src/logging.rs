// File logger setup. The terminal belongs to the UI, so logs go to disk.
use crate::context::AppContext;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;

pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install a `WriteLogger` appending to `labstock.log` in the data dir.
pub fn init(ctx: &dyn AppContext, level: &str) -> Result<()> {
    let path = ctx
        .get_log_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine log file location"))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let config = ConfigBuilder::new()
        .add_filter_allow_str("labstock")
        .build();

    WriteLogger::init(parse_level(level), config, file)
        .map_err(|e| anyhow::anyhow!("Logger already initialised: {}", e))?;
    log::info!("labstock v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}
