//! Quantity normalisation shared by extraction cleanup and sheet coercion.
//!
//! Both paths end in [`classify`]: a finite number becomes an integer when it
//! has no fractional part and a decimal otherwise; anything else is kept as
//! [`QuantityValue::Unparsed`] with the raw input. They differ in how they
//! pick the text to read:
//!
//! - [`normalize`] (extraction) takes the first contiguous run of digits,
//!   dots and commas. The model is asked for a bare gram count but answers
//!   things like `"500 g"` or `"N/A"`; the run is what the record keeps.
//! - [`coerce`] (storage) reads the whole cell the reviewer left in the grid,
//!   after dropping spaces and one trailing unit (`g`, `kg`, `ml`, `l`).
//!   Text that is not a number as a whole goes to the sheet untouched.
//!
//! Units are never converted: `"1,5kg"` is 1.5, not 1500.
use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.,]+").expect("numeric run pattern is valid"));

/// Longest first so `kg` and `ml` are not cut down to `k` and `m`.
const UNIT_SUFFIXES: [&str; 4] = ["kg", "ml", "g", "l"];

/// Typed outcome of reading a quantity.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityValue {
    /// Whole-valued quantity, stored without a fractional part.
    Integer(i64),
    Decimal(f64),
    /// Nothing numeric could be read; carries the original input untouched.
    Unparsed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuantity {
    /// The cleaned text that was parsed (`"1.5"` for `"1,5kg"`), if any.
    pub numeric: Option<String>,
    pub value: QuantityValue,
}

impl NormalizedQuantity {
    pub fn is_parsed(&self) -> bool {
        !matches!(self.value, QuantityValue::Unparsed(_))
    }

    /// Text kept in an extracted record: the numeric run, or empty.
    pub fn record_text(&self) -> String {
        self.numeric.clone().unwrap_or_default()
    }
}

/// Extraction cleanup: read the first numeric run of a model answer.
pub fn normalize(raw: &str) -> NormalizedQuantity {
    let numeric = NUMERIC_RUN
        .find(raw)
        .map(|m| m.as_str().replace(',', "."));
    let value = read_number(numeric.as_deref(), raw);
    NormalizedQuantity { numeric, value }
}

/// Sheet coercion: read the whole cell as a number, or keep it as text.
pub fn coerce(raw: &str) -> NormalizedQuantity {
    let mut cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if let Some(unit) = UNIT_SUFFIXES.iter().find(|u| cleaned.ends_with(*u)) {
        cleaned.truncate(cleaned.len() - unit.len());
    }

    let value = read_number(Some(cleaned.as_str()), raw);
    let numeric = match value {
        QuantityValue::Unparsed(_) => None,
        _ => Some(cleaned),
    };
    NormalizedQuantity { numeric, value }
}

fn read_number(text: Option<&str>, raw: &str) -> QuantityValue {
    match text.map(str::parse::<f64>) {
        Some(Ok(v)) if v.is_finite() => classify(v),
        _ => QuantityValue::Unparsed(raw.to_string()),
    }
}

/// Whole values become `Integer`. The one exception is a whole value beyond
/// the `i64` range (|v| >= 2^63), which cannot be held as an integer and is
/// kept as `Decimal`.
fn classify(v: f64) -> QuantityValue {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        QuantityValue::Integer(v as i64)
    } else {
        QuantityValue::Decimal(v)
    }
}

/// Render a JSON value from the model as quantity text before normalising.
pub fn text_from_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
