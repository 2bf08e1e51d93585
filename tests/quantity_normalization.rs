// Quantity normalisation as seen by both the extracted record and the sheet cell.
use labstock::model::{CellValue, ExtractedRecord};
use labstock::quantity::{QuantityValue, coerce, normalize, text_from_json};
use serde_json::json;

#[test]
fn comma_decimal_with_kg_is_not_converted() {
    let q = normalize("1,5kg");
    assert_eq!(q.record_text(), "1.5");
    assert!(q.is_parsed());

    let row = ExtractedRecord::new("Sucrose", "Sigma", "1,5kg").to_sheet_row();
    assert_eq!(row.quantity, CellValue::Decimal(1.5));
}

#[test]
fn no_digits_leaves_cell_untouched() {
    let q = normalize("N/A");
    assert_eq!(q.record_text(), "");
    assert!(!q.is_parsed());

    let row = ExtractedRecord::new("Salt", "Merck", "N/A").to_sheet_row();
    assert_eq!(row.quantity, CellValue::Text("N/A".to_string()));
}

#[test]
fn whole_values_are_stored_as_integers() {
    let whole = ExtractedRecord::new("Salt", "Merck", "500").to_sheet_row();
    assert_eq!(whole.quantity, CellValue::Integer(500));
    assert_eq!(serde_json::to_value(&whole.quantity).unwrap(), json!(500));

    let frac = ExtractedRecord::new("Salt", "Merck", "500.5").to_sheet_row();
    assert_eq!(frac.quantity, CellValue::Decimal(500.5));
    assert_eq!(serde_json::to_value(&frac.quantity).unwrap(), json!(500.5));
}

#[test]
fn unit_suffixes_and_spacing_are_ignored() {
    assert_eq!(normalize("500 g").value, QuantityValue::Integer(500));
    assert_eq!(normalize("250ML").value, QuantityValue::Integer(250));
    assert_eq!(normalize("12,25 g").value, QuantityValue::Decimal(12.25));
}

#[test]
fn first_numeric_run_wins_even_if_it_is_punctuation() {
    let q = normalize("approx. 12,25 g");
    assert_eq!(q.record_text(), ".");
    assert_eq!(q.value, QuantityValue::Unparsed("approx. 12,25 g".to_string()));
}

#[test]
fn empty_quantity_stays_empty_text() {
    let row = ExtractedRecord::new("Water", "", "").to_sheet_row();
    assert_eq!(row.quantity, CellValue::Text(String::new()));
    assert_eq!(row.date, CellValue::Text(String::new()));
}

#[test]
fn sheet_row_column_order() {
    let cells = ExtractedRecord::new("Agar", "Fluka", "25").to_sheet_row().into_cells();
    assert_eq!(
        serde_json::to_value(&cells).unwrap(),
        json!(["", "Agar", "Fluka", 25])
    );
}

#[test]
fn json_values_render_as_plain_text() {
    assert_eq!(text_from_json(&json!(500)), "500");
    assert_eq!(text_from_json(&json!(1.5)), "1.5");
    assert_eq!(text_from_json(&json!("2 kg")), "2 kg");
    assert_eq!(text_from_json(&json!(null)), "");
}

fn stored(quantity: &str) -> CellValue {
    ExtractedRecord::new("Salt", "Merck", quantity).to_sheet_row().quantity
}

#[test]
fn edited_sign_survives_to_the_sheet() {
    assert_eq!(stored("-5"), CellValue::Integer(-5));
    assert_eq!(stored("-2,5 g"), CellValue::Decimal(-2.5));
}

#[test]
fn text_with_several_numbers_is_stored_verbatim() {
    assert_eq!(stored("2x500"), CellValue::Text("2x500".to_string()));
    assert_eq!(stored("Lot 42 500g"), CellValue::Text("Lot 42 500g".to_string()));
    assert!(!coerce("Lot 42 500g").is_parsed());
}

#[test]
fn whole_cell_is_read_as_one_number() {
    assert_eq!(stored("1e3"), CellValue::Integer(1000));
    assert_eq!(stored("1 500 ml"), CellValue::Integer(1500));
    assert_eq!(stored("250ML"), CellValue::Integer(250));
}

#[test]
fn extraction_and_storage_agree_on_plain_answers() {
    for raw in ["500", "500 g", "1,5kg", "12,25 g"] {
        let extracted = normalize(raw).value;
        assert_eq!(coerce(raw).value, extracted, "{}", raw);
    }
}
