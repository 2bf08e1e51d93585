// File: ./src/client/mod.rs
pub mod auth;
pub mod gemini;
pub mod middleware;
pub mod sheets;
pub mod transport;

pub use crate::client::auth::{ServiceAccountAuth, TokenProvider};
pub use crate::client::gemini::GeminiClient;
pub use crate::client::sheets::{SheetsClient, Spreadsheet, Worksheet};
pub use crate::client::transport::{HttpsClient, build_client};
