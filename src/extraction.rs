//! Prompt and response handling for label extraction.
//!
//! The model is told to answer with a bare JSON object. It does not always
//! listen, so the reply is trimmed of a leading ```` ```json ```` and a
//! trailing ```` ``` ```` before parsing. Nothing smarter is attempted: a
//! reply fenced any other way, or wrapped in prose, is a parse error.
use crate::error::ExtractionError;
use crate::model::ExtractedRecord;
use crate::quantity;
use serde_json::Value;

pub const EXTRACTION_PROMPT: &str = r#"
Extract the following fields from the product label:
'Ingredient Name', 'Manufacturer Name', 'Quantity in grams'.

Return ONLY a raw JSON object. Do not use Markdown formatting (no ```json blocks).
For 'quantity_g', return ONLY the number (e.g. 500, not 500g). If it is in kg, convert to grams.
Ignore marketing text.

JSON Structure: {"ingredient": str, "manufacturer": str, "quantity_g": str or number}
"#;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

pub fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text
}

/// Turn the model's reply text into a record with a normalised quantity.
///
/// Missing keys become empty strings. A reply that is not a JSON object is
/// an error.
pub fn parse_response(text: &str) -> Result<ExtractedRecord, ExtractionError> {
    let body = strip_fences(text);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ExtractionError::Parse(format!("expected an object, got: {}", value)))?;

    let field = |key: &str| obj.get(key).map(quantity::text_from_json).unwrap_or_default();
    let raw_quantity = field("quantity_g");

    Ok(ExtractedRecord {
        ingredient: field("ingredient"),
        manufacturer: field("manufacturer"),
        quantity_g: quantity::normalize(&raw_quantity).record_text(),
    })
}
