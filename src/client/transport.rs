// File: src/client/transport.rs
// Shared HTTPS transport for the model and spreadsheet clients.
use crate::client::middleware::{DefaultHeadersLayer, DefaultHeadersService};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tower::ServiceExt;
use tower_layer::Layer;
use url::Url;

pub type HttpsClient =
    DefaultHeadersService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>;

/// Build the HTTPS client. Plain `http://` is accepted too so local mock
/// servers and proxies work.
pub fn build_client() -> HttpsClient {
    let mut root_store = rustls::RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    root_store.add_parsable_certificates(result.certs);
    if root_store.is_empty() {
        log::warn!("No valid system certificates found; HTTPS requests will fail.");
    }

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let https_connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    DefaultHeadersLayer::new(format!("labstock/{}", env!("CARGO_PKG_VERSION"))).layer(http_client)
}

/// Status and collected body of a finished request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn json(&self) -> Result<Value, String> {
        serde_json::from_slice(&self.body).map_err(|e| e.to_string())
    }

    /// Google APIs report failures as `{"error": {"message": ...}}`; fall
    /// back to the raw body when that shape is absent.
    pub fn error_message(&self) -> String {
        self.json()
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(&self.body).trim().to_string())
    }
}

fn describe_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

pub fn json_request(method: Method, url: &Url, body: Option<&Value>) -> Result<Request<String>, String> {
    let builder = Request::builder().method(method).uri(url.as_str());
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(json.to_string()),
        None => builder.body(String::new()),
    };
    req.map_err(|e| e.to_string())
}

pub fn form_request(url: &str, form: &[(&str, &str)]) -> Result<Request<String>, String> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();
    Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .map_err(|e| e.to_string())
}

/// Send a request and collect the whole body. `Err` is a transport failure;
/// HTTP error statuses come back as `Ok` for the caller to judge.
pub async fn send(client: &HttpsClient, req: Request<String>) -> Result<HttpReply, String> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = client
        .clone()
        .oneshot(req)
        .await
        .map_err(|e| describe_error(&e))?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| describe_error(&e))?
        .to_bytes()
        .to_vec();

    log::debug!("{} {} -> {}", method, path, status);
    Ok(HttpReply { status, body })
}
