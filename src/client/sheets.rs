// File: src/client/sheets.rs
// Spreadsheet client over the Sheets v4 and Drive v3 REST APIs.
use crate::client::auth::TokenProvider;
use crate::client::transport::{self, HttpReply, HttpsClient};
use crate::error::StorageError;
use crate::model::{CellValue, ExtractedRecord, SHEET_HEADER};
use http::{HeaderValue, Method, StatusCode, header};
use serde_json::{Value, json};
use url::Url;

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
pub const NEW_WORKSHEET_ROWS: u32 = 100;
pub const NEW_WORKSHEET_COLS: u32 = 20;

/// An opened spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spreadsheet {
    pub id: String,
}

/// A worksheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub spreadsheet_id: String,
    pub sheet_id: i64,
    pub title: String,
}

impl Worksheet {
    /// A1 range covering the whole tab.
    fn range(&self) -> String {
        format!("'{}'", self.title.replace('\'', "''"))
    }
}

/// Pull the spreadsheet id out of a `.../spreadsheets/d/<id>/...` URL.
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "spreadsheets")?;
    if segments.next()? != "d" {
        return None;
    }
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[derive(Debug)]
pub struct SheetsClient {
    http: HttpsClient,
    tokens: TokenProvider,
    sheets_base: Url,
    drive_base: Url,
    worksheet: String,
}

impl SheetsClient {
    pub fn new(
        http: HttpsClient,
        tokens: TokenProvider,
        sheets_base: &str,
        drive_base: &str,
        worksheet: &str,
    ) -> Result<Self, String> {
        let sheets_base = Url::parse(sheets_base).map_err(|e| format!("{}: {}", sheets_base, e))?;
        let drive_base = Url::parse(drive_base).map_err(|e| format!("{}: {}", drive_base, e))?;
        Ok(Self {
            http,
            tokens,
            sheets_base,
            drive_base,
            worksheet: worksheet.to_string(),
        })
    }

    pub fn worksheet_name(&self) -> &str {
        &self.worksheet
    }

    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Network(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<HttpReply, StorageError> {
        let token = self.tokens.access_token().await?;
        let mut req = transport::json_request(method, url, body).map_err(StorageError::Network)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| StorageError::Auth(e.to_string()))?;
        req.headers_mut().insert(header::AUTHORIZATION, bearer);

        transport::send(&self.http, req)
            .await
            .map_err(StorageError::Network)
    }

    async fn call_json(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Value, StorageError> {
        let reply = self.call(method, url, body).await?;
        if !reply.status.is_success() {
            return Err(StorageError::Api {
                status: reply.status.as_u16(),
                message: reply.error_message(),
            });
        }
        reply
            .json()
            .map_err(|e| StorageError::Api {
                status: reply.status.as_u16(),
                message: format!("unreadable response: {}", e),
            })
    }

    // --- SPREADSHEET / WORKSHEET ---

    /// Open a spreadsheet by URL (anything starting with `https://`) or by
    /// exact title.
    pub async fn open_spreadsheet(&self, identifier: &str) -> Result<Spreadsheet, StorageError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(StorageError::SpreadsheetNotFound("(no spreadsheet configured)".to_string()));
        }
        if identifier.starts_with("https://") {
            let id = spreadsheet_id_from_url(identifier)
                .ok_or_else(|| StorageError::SpreadsheetNotFound(identifier.to_string()))?;
            return Ok(Spreadsheet { id });
        }
        self.find_by_title(identifier).await
    }

    async fn find_by_title(&self, title: &str) -> Result<Spreadsheet, StorageError> {
        let mut url = Self::endpoint(&self.drive_base, &["drive", "v3", "files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            title.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME_TYPE
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        let listing = self.call_json(Method::GET, &url, None).await?;
        let id = listing["files"]
            .as_array()
            .and_then(|files| files.iter().find(|f| f["name"].as_str() == Some(title)))
            .and_then(|f| f["id"].as_str())
            .ok_or_else(|| StorageError::SpreadsheetNotFound(title.to_string()))?;

        log::info!("Resolved spreadsheet '{}' to {}", title, id);
        Ok(Spreadsheet { id: id.to_string() })
    }

    async fn find_worksheet(
        &self,
        spreadsheet: &Spreadsheet,
        name: &str,
    ) -> Result<Option<Worksheet>, StorageError> {
        let mut url = Self::endpoint(
            &self.sheets_base,
            &["v4", "spreadsheets", spreadsheet.id.as_str()],
        )?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        let reply = self.call(Method::GET, &url, None).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(StorageError::SpreadsheetNotFound(spreadsheet.id.clone()));
        }
        if !reply.status.is_success() {
            return Err(StorageError::Api {
                status: reply.status.as_u16(),
                message: reply.error_message(),
            });
        }
        let meta = reply.json().map_err(|e| StorageError::Api {
            status: reply.status.as_u16(),
            message: format!("unreadable response: {}", e),
        })?;

        let found = meta["sheets"].as_array().and_then(|sheets| {
            sheets
                .iter()
                .map(|s| &s["properties"])
                .find(|p| p["title"].as_str() == Some(name))
                .map(|p| Worksheet {
                    spreadsheet_id: spreadsheet.id.clone(),
                    sheet_id: p["sheetId"].as_i64().unwrap_or_default(),
                    title: name.to_string(),
                })
        });
        Ok(found)
    }

    /// Open the named worksheet, creating it with the header row if absent.
    pub async fn ensure_worksheet(
        &self,
        spreadsheet: &Spreadsheet,
        name: &str,
    ) -> Result<Worksheet, StorageError> {
        if let Some(ws) = self.find_worksheet(spreadsheet, name).await? {
            return Ok(ws);
        }

        log::info!("Worksheet '{}' not found in {}, creating it", name, spreadsheet.id);
        let url = Self::endpoint(
            &self.sheets_base,
            &["v4", "spreadsheets", format!("{}:batchUpdate", spreadsheet.id).as_str()],
        )?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": name,
                        "gridProperties": {
                            "rowCount": NEW_WORKSHEET_ROWS,
                            "columnCount": NEW_WORKSHEET_COLS,
                        }
                    }
                }
            }]
        });
        let reply = self
            .call_json(Method::POST, &url, Some(&body))
            .await
            .map_err(|e| StorageError::WorksheetCreate(e.to_string()))?;

        let sheet_id = reply["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .unwrap_or_default();
        let ws = Worksheet {
            spreadsheet_id: spreadsheet.id.clone(),
            sheet_id,
            title: name.to_string(),
        };

        let header: Vec<CellValue> = SHEET_HEADER
            .iter()
            .map(|h| CellValue::Text(h.to_string()))
            .collect();
        self.append_rows(&ws, vec![header])
            .await
            .map_err(|e| StorageError::WorksheetCreate(e.to_string()))?;
        Ok(ws)
    }

    async fn append_rows(&self, ws: &Worksheet, rows: Vec<Vec<CellValue>>) -> Result<(), StorageError> {
        let mut url = Self::endpoint(
            &self.sheets_base,
            &[
                "v4",
                "spreadsheets",
                ws.spreadsheet_id.as_str(),
                "values",
                format!("{}:append", ws.range()).as_str(),
            ],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let count = rows.len();
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        self.call_json(Method::POST, &url, Some(&body)).await?;
        log::info!("Appended {} row(s) to '{}'", count, ws.title);
        Ok(())
    }

    // --- RECORDS ---

    pub async fn append_one(
        &self,
        spreadsheet: &Spreadsheet,
        record: &ExtractedRecord,
    ) -> Result<(), StorageError> {
        let ws = self.ensure_worksheet(spreadsheet, &self.worksheet).await?;
        self.append_rows(&ws, vec![record.to_sheet_row().into_cells()])
            .await
    }

    /// Append every record in one values call. An empty list succeeds
    /// without touching the service.
    pub async fn append_batch(
        &self,
        spreadsheet: &Spreadsheet,
        records: &[ExtractedRecord],
    ) -> Result<(), StorageError> {
        if records.is_empty() {
            log::debug!("Nothing to append");
            return Ok(());
        }
        let rows: Vec<Vec<CellValue>> = records
            .iter()
            .map(|r| r.to_sheet_row().into_cells())
            .collect();

        let ws = self.ensure_worksheet(spreadsheet, &self.worksheet).await?;
        self.append_rows(&ws, rows).await
    }

    /// Every row of the worksheet as displayed text, padded to the widest row.
    pub async fn read_all(&self, spreadsheet: &Spreadsheet) -> Result<Vec<Vec<String>>, StorageError> {
        let ws = self
            .find_worksheet(spreadsheet, &self.worksheet)
            .await?
            .ok_or_else(|| StorageError::Api {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("worksheet '{}' not found", self.worksheet),
            })?;

        let url = Self::endpoint(
            &self.sheets_base,
            &["v4", "spreadsheets", ws.spreadsheet_id.as_str(), "values", ws.range().as_str()],
        )?;
        let reply = self.call_json(Method::GET, &url, None).await?;

        let mut rows: Vec<Vec<String>> = reply["values"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(crate::quantity::text_from_json).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Ok(rows)
    }

    /// Delete one row by its 1-based index.
    pub async fn delete_row(&self, spreadsheet: &Spreadsheet, row_index: usize) -> Result<(), StorageError> {
        if row_index == 0 {
            return Err(StorageError::InvalidRow(row_index));
        }
        let ws = self
            .find_worksheet(spreadsheet, &self.worksheet)
            .await?
            .ok_or_else(|| StorageError::Api {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("worksheet '{}' not found", self.worksheet),
            })?;

        let url = Self::endpoint(
            &self.sheets_base,
            &["v4", "spreadsheets", format!("{}:batchUpdate", ws.spreadsheet_id).as_str()],
        )?;
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": ws.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row_index - 1,
                        "endIndex": row_index,
                    }
                }
            }]
        });
        self.call_json(Method::POST, &url, Some(&body)).await?;
        log::info!("Deleted row {} from '{}'", row_index, ws.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_edit_url() {
        let url = "https://docs.google.com/spreadsheets/d/1AbC-xyz_09/edit#gid=0";
        assert_eq!(spreadsheet_id_from_url(url).as_deref(), Some("1AbC-xyz_09"));
    }

    #[test]
    fn id_from_url_without_d_segment() {
        assert_eq!(
            spreadsheet_id_from_url("https://docs.google.com/spreadsheets/u/0/"),
            None
        );
    }

    #[test]
    fn range_quotes_title() {
        let ws = Worksheet {
            spreadsheet_id: "x".into(),
            sheet_id: 0,
            title: "Bob's".into(),
        };
        assert_eq!(ws.range(), "'Bob''s'");
    }
}
