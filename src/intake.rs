// Image intake for both input modes, plus the decodability check run
// before an image is sent to the model.
use crate::error::ExtractionError;
use crate::model::ImageItem;
use anyhow::{Context, Result};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const CAMERA_PHOTO_NAME: &str = "Camera Photo";

/// Result of collecting images: what was accepted and what was passed over.
#[derive(Debug, Default)]
pub struct Intake {
    pub items: Vec<ImageItem>,
    pub skipped: Vec<String>,
}

pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check the bytes decode as a PNG or JPEG still image and return the MIME
/// type to send along with them.
pub fn decode_check(bytes: &[u8]) -> Result<&'static str, ExtractionError> {
    let format =
        image::guess_format(bytes).map_err(|e| ExtractionError::UndecodableImage(e.to_string()))?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        other => {
            return Err(ExtractionError::UndecodableImage(format!(
                "unsupported format {:?}",
                other
            )));
        }
    };
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ExtractionError::UndecodableImage(e.to_string()))?;
    Ok(mime)
}

/// Split a typed path list on whitespace; double quotes group a path
/// containing spaces.
pub fn parse_path_list(input: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

fn read_item(path: &Path) -> Result<ImageItem> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageItem::new(name, bytes))
}

fn sorted_images_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported_path(p))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Batch mode: files are taken in the order given, directories expand to
/// their images sorted by file name.
pub fn collect_batch(paths: &[PathBuf]) -> Intake {
    let mut intake = Intake::default();

    for path in paths {
        let candidates = if path.is_dir() {
            match sorted_images_in(path) {
                Ok(files) => files,
                Err(e) => {
                    intake.skipped.push(e.to_string());
                    continue;
                }
            }
        } else {
            vec![path.clone()]
        };

        for candidate in candidates {
            if !is_supported_path(&candidate) {
                intake
                    .skipped
                    .push(format!("{}: not a png/jpg/jpeg file", candidate.display()));
                continue;
            }
            match read_item(&candidate) {
                Ok(item) => intake.items.push(item),
                Err(e) => intake.skipped.push(e.to_string()),
            }
        }
    }

    log::info!(
        "Collected {} image(s), skipped {}",
        intake.items.len(),
        intake.skipped.len()
    );
    intake
}

/// Camera mode: the most recently modified image in the capture directory.
pub fn capture_latest(dir: &Path) -> Result<ImageItem> {
    let newest = sorted_images_in(dir)?
        .into_iter()
        .filter_map(|p| {
            let modified = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .max_by_key(|(modified, _): &(SystemTime, PathBuf)| *modified)
        .map(|(_, p)| p)
        .ok_or_else(|| anyhow::anyhow!("No photo found in {}", dir.display()))?;

    let item = read_item(&newest)?;
    log::info!("Captured {} from {}", item.name, dir.display());
    Ok(ImageItem::new(CAMERA_PHOTO_NAME, item.bytes))
}
