// Core data types: extracted records, intake images and spreadsheet cells.
use crate::quantity::{self, NormalizedQuantity, QuantityValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// Header row written when the worksheet is created.
pub const SHEET_HEADER: [&str; 4] = ["Date", "Ingredient Name", "Manufacturer", "Quantity (g)"];

pub const PLACEHOLDER_INGREDIENT: &str = "ERROR";
pub const PLACEHOLDER_MANUFACTURER: &str = "Failed to extract";

/// Fields read off one product label.
///
/// Rows in the review grid are plain copies of this type; they are
/// positional and carry no identifier beyond their index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub ingredient: String,
    pub manufacturer: String,
    pub quantity_g: String,
}

impl ExtractedRecord {
    pub fn new(ingredient: &str, manufacturer: &str, quantity_g: &str) -> Self {
        Self {
            ingredient: ingredient.to_string(),
            manufacturer: manufacturer.to_string(),
            quantity_g: quantity_g.to_string(),
        }
    }

    /// Visible stand-in for an image whose extraction failed.
    pub fn failed() -> Self {
        Self::new(PLACEHOLDER_INGREDIENT, PLACEHOLDER_MANUFACTURER, "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.ingredient == PLACEHOLDER_INGREDIENT && self.manufacturer == PLACEHOLDER_MANUFACTURER
    }

    /// Build the row appended to the worksheet. Column A stays empty for the
    /// spreadsheet-side date formula; the quantity cell is numeric only when
    /// the whole grid value reads as a number.
    pub fn to_sheet_row(&self) -> SheetRow {
        SheetRow {
            date: CellValue::Text(String::new()),
            ingredient: CellValue::Text(self.ingredient.clone()),
            manufacturer: CellValue::Text(self.manufacturer.clone()),
            quantity: quantity::coerce(&self.quantity_g).into(),
        }
    }
}

/// Editable column of the review grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Field {
    Ingredient,
    Manufacturer,
    Quantity,
}

impl Field {
    pub fn get(self, record: &ExtractedRecord) -> &str {
        match self {
            Field::Ingredient => &record.ingredient,
            Field::Manufacturer => &record.manufacturer,
            Field::Quantity => &record.quantity_g,
        }
    }

    pub fn set(self, record: &mut ExtractedRecord, value: String) {
        match self {
            Field::Ingredient => record.ingredient = value,
            Field::Manufacturer => record.manufacturer = value,
            Field::Quantity => record.quantity_g = value,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Ingredient => write!(f, "Ingredient Name"),
            Field::Manufacturer => write!(f, "Manufacturer"),
            Field::Quantity => write!(f, "Quantity (g)"),
        }
    }
}

/// One collected image: display name plus raw file bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageItem {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ImageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageItem")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
pub enum InputMethod {
    /// Newest photo from the capture directory.
    #[default]
    Camera,
    /// Any number of files or directories.
    Batch,
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMethod::Camera => write!(f, "Camera"),
            InputMethod::Batch => write!(f, "Upload Images (Batch)"),
        }
    }
}

/// A single spreadsheet cell as sent to the values API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl From<NormalizedQuantity> for CellValue {
    fn from(q: NormalizedQuantity) -> Self {
        match q.value {
            QuantityValue::Integer(i) => CellValue::Integer(i),
            QuantityValue::Decimal(d) => CellValue::Decimal(d),
            QuantityValue::Unparsed(raw) => CellValue::Text(raw),
        }
    }
}

/// `[Date, Ingredient, Manufacturer, Quantity]` as stored in the worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub date: CellValue,
    pub ingredient: CellValue,
    pub manufacturer: CellValue,
    pub quantity: CellValue,
}

impl SheetRow {
    pub fn into_cells(self) -> Vec<CellValue> {
        vec![self.date, self.ingredient, self.manufacturer, self.quantity]
    }
}
