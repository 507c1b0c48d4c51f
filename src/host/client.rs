//! HTTP client wrapper - executes requests and formats responses

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::models::{ApiRequest, ApiResponse, Environment, HttpMethod};
use crate::request::{encode_pairs, EffectiveBody, EffectiveRequest};

/// Build a reqwest request from the effective representation
pub fn build_request(client: &reqwest::Client, request: &EffectiveRequest) -> reqwest::RequestBuilder {
    let method = match request.method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
    };
    let multipart = matches!(request.body, Some(EffectiveBody::Multipart(_)));

    let mut req_builder = client.request(method, &request.url);

    for (key, value) in &request.headers {
        // reqwest writes the multipart boundary itself
        if multipart && key.eq_ignore_ascii_case("content-type") {
            continue;
        }
        req_builder = req_builder.header(key, value);
    }

    match &request.body {
        None => {}
        Some(EffectiveBody::Json { raw, .. }) => req_builder = req_builder.body(raw.clone()),
        Some(EffectiveBody::Text(text)) => req_builder = req_builder.body(text.clone()),
        Some(EffectiveBody::UrlEncoded(fields)) => {
            req_builder = req_builder.body(encode_pairs(fields))
        }
        Some(EffectiveBody::Multipart(fields)) => {
            let form = fields
                .iter()
                .fold(reqwest::multipart::Form::new(), |form, (key, value)| {
                    form.text(key.clone(), value.clone())
                });
            req_builder = req_builder.multipart(form);
        }
    }

    req_builder
}

/// Execute a request. Never fails: transport errors become a status-0 response.
pub async fn execute_request(
    client: &reqwest::Client,
    request: &ApiRequest,
    environment: Option<&Environment>,
) -> ApiResponse {
    let effective = request.resolved(environment).effective();
    let start = Instant::now();

    let result = build_request(client, &effective).send().await;

    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            let elapsed = start.elapsed().as_millis() as u64;
            return ApiResponse::transport_error(describe_error(&e), elapsed);
        }
    };

    let status = resp.status();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in resp.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    match resp.bytes().await {
        Ok(bytes) => {
            let elapsed = start.elapsed().as_millis() as u64;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let body = serde_json::from_str::<serde_json::Value>(&text)
                .unwrap_or(serde_json::Value::String(text));
            ApiResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                time: elapsed,
                size: bytes.len() as u64,
                headers,
                body,
                error: None,
            }
        }
        Err(e) => ApiResponse::transport_error(
            format!("Error reading body: {}", e),
            start.elapsed().as_millis() as u64,
        ),
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_builder() {
        format!("Invalid request: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

/// Create an HTTP client; `None` disables the timeout
pub fn create_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to default HTTP client");
        reqwest::Client::new()
    })
}
