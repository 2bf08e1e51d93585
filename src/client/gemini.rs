// Extraction client: one generateContent call per label image.
use crate::client::transport::{self, HttpsClient};
use crate::error::ExtractionError;
use crate::extraction::{self, EXTRACTION_PROMPT};
use crate::intake;
use crate::model::ExtractedRecord;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderValue, Method};
use serde_json::{Value, json};
use url::Url;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: HttpsClient,
    api_key: String,
    endpoint: Url,
    model: String,
}

impl GeminiClient {
    /// The model handle. Created once at startup and reused for every image.
    pub fn new(
        http: HttpsClient,
        api_base: &str,
        model: &str,
        api_key: &str,
    ) -> Result<Self, String> {
        let method = format!("{}:generateContent", model);
        let mut endpoint = Url::parse(api_base).map_err(|e| format!("{}: {}", api_base, e))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| format!("{} cannot be a base URL", api_base))?
            .pop_if_empty()
            .extend(["v1beta", "models", method.as_str()]);

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body(image_bytes: &[u8], mime_type: &str) -> Value {
        json!({
            "contents": [{
                "parts": [
                    { "text": EXTRACTION_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(image_bytes) } }
                ]
            }]
        })
    }

    /// Concatenated text of the first candidate, as the SDK's `response.text`.
    fn response_text(reply: &Value) -> Result<String, ExtractionError> {
        if let Some(reason) = reply["promptFeedback"]["blockReason"].as_str() {
            return Err(ExtractionError::Blocked(reason.to_string()));
        }

        let candidate = reply["candidates"]
            .get(0)
            .ok_or(ExtractionError::EmptyResponse)?;
        let text: String = candidate["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate["finishReason"].as_str().unwrap_or("no text");
            if reason == "SAFETY" {
                return Err(ExtractionError::Blocked(reason.to_string()));
            }
            return Err(ExtractionError::EmptyResponse);
        }
        Ok(text)
    }

    /// Extract the label fields from one image.
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<ExtractedRecord, ExtractionError> {
        let mime_type = intake::decode_check(image_bytes)?;

        let body = Self::request_body(image_bytes, mime_type);
        let mut req = transport::json_request(Method::POST, &self.endpoint, Some(&body))
            .map_err(ExtractionError::Network)?;
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| ExtractionError::Network(format!("invalid API key header: {}", e)))?;
        req.headers_mut().insert("x-goog-api-key", key);

        let reply = transport::send(&self.http, req)
            .await
            .map_err(ExtractionError::Network)?;
        if !reply.status.is_success() {
            return Err(ExtractionError::Api {
                status: reply.status.as_u16(),
                message: reply.error_message(),
            });
        }

        let json = reply.json().map_err(ExtractionError::Parse)?;
        let text = Self::response_text(&json)?;
        log::debug!("Model reply: {}", text.trim());
        extraction::parse_response(&text)
    }
}
