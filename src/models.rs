use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_REQUEST_NAME;

/// Fresh opaque identifier for rows, requests and collections
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn enabled_by_default() -> bool {
    true
}

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    pub fn parse(s: &str) -> Option<HttpMethod> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            _ => None,
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::OPTIONS,
            HttpMethod::OPTIONS => HttpMethod::GET,
        }
    }

    /// Everything except GET may carry a body
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::GET)
    }
}

/// One header, query parameter or form field row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            id: new_id(),
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// The empty trailing row every editable list ends with
    pub fn blank() -> Self {
        KeyValue::new("", "")
    }

    pub fn is_blank(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }

    /// Rows that take part in the outgoing request
    pub fn is_effective(&self) -> bool {
        self.enabled && !self.key.is_empty()
    }
}

/// Body encoding selected in the body editor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    #[default]
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "form-data")]
    FormData,
    #[serde(rename = "x-www-form-urlencoded", alias = "urlencoded")]
    UrlEncoded,
    #[serde(rename = "raw")]
    Raw,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Json => "json",
            BodyType::FormData => "form-data",
            BodyType::UrlEncoded => "x-www-form-urlencoded",
            BodyType::Raw => "raw",
        }
    }

    pub fn next(&self) -> BodyType {
        match self {
            BodyType::Json => BodyType::FormData,
            BodyType::FormData => BodyType::UrlEncoded,
            BodyType::UrlEncoded => BodyType::Raw,
            BodyType::Raw => BodyType::Json,
        }
    }

    /// Form types are edited as rows rather than free text
    pub fn uses_form_rows(&self) -> bool {
        matches!(self, BodyType::FormData | BodyType::UrlEncoded)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(rename = "type", default)]
    pub kind: BodyType,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "formData", default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Vec<KeyValue>>,
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody {
            kind: BodyType::Json,
            content: String::from("{}"),
            form_data: None,
        }
    }
}

/// Authentication type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthKind {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "bearer")]
    Bearer,
    #[serde(rename = "api-key")]
    ApiKey,
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl AuthKind {
    pub fn label(&self) -> &'static str {
        match self {
            AuthKind::None => "No Auth",
            AuthKind::Basic => "Basic Auth",
            AuthKind::Bearer => "Bearer Token",
            AuthKind::ApiKey => "API Key",
            AuthKind::OAuth2 => "OAuth 2.0",
        }
    }

    pub fn next(&self) -> AuthKind {
        match self {
            AuthKind::None => AuthKind::Basic,
            AuthKind::Basic => AuthKind::Bearer,
            AuthKind::Bearer => AuthKind::ApiKey,
            AuthKind::ApiKey => AuthKind::OAuth2,
            AuthKind::OAuth2 => AuthKind::None,
        }
    }
}

/// Where an API key is sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

/// Auth settings. Only the fields of the active `kind` are used; the rest are
/// kept so switching back and forth does not lose input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(rename = "type", default)]
    pub kind: AuthKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "addTo", default)]
    pub add_to: ApiKeyLocation,
}

/// A single HTTP request: the unit of execution, storage and code generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub params: Vec<KeyValue>,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub body: RequestBody,
    #[serde(default)]
    pub auth: Auth,
}

impl Default for ApiRequest {
    fn default() -> Self {
        ApiRequest {
            id: new_id(),
            name: String::from(DEFAULT_REQUEST_NAME),
            method: HttpMethod::GET,
            url: String::new(),
            params: vec![KeyValue::blank()],
            headers: vec![KeyValue::blank()],
            body: RequestBody::default(),
            auth: Auth::default(),
        }
    }
}

/// Response shown in the response panel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    /// Elapsed milliseconds
    pub time: u64,
    /// Body size in bytes
    pub size: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Response recorded when the request never reached a server
    pub fn transport_error(message: impl Into<String>, time_ms: u64) -> Self {
        let message = message.into();
        ApiResponse {
            status: 0,
            status_text: String::from("Error"),
            time: time_ms,
            size: 0,
            headers: BTreeMap::new(),
            body: serde_json::Value::String(message.clone()),
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as display text, pretty-printing structured payloads
    pub fn body_text(&self) -> String {
        match &self.body {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

/// A collection of requests. Folders share the same shape and nest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub requests: Vec<ApiRequest>,
}

pub type Folder = Collection;

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Collection {
            id: new_id(),
            name: name.into(),
            folders: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Number of requests including those in nested folders
    pub fn request_count(&self) -> usize {
        self.requests.len() + self.folders.iter().map(Collection::request_count).sum::<usize>()
    }
}

/// History entry: a request snapshot stamped at capture time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub request: ApiRequest,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Environment variables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub variables: Vec<KeyValue>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Environment {
            id: new_id(),
            name: name.into(),
            variables: Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.variables.iter_mut().find(|v| v.key == key) {
            Some(existing) => existing.value = value,
            None => self.variables.push(KeyValue::new(key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.is_effective() && v.key == key)
            .map(|v| v.value.as_str())
    }

    /// Substitutes {{variable}} patterns in text
    pub fn substitute(&self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }
        let mut result = text.to_string();
        for var in self.variables.iter().filter(|v| v.is_effective()) {
            let pattern = format!("{{{{{}}}}}", var.key);
            result = result.replace(&pattern, &var.value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_uses_store_field_names() {
        let mut request = ApiRequest::default();
        request.body.kind = BodyType::UrlEncoded;
        request.body.form_data = Some(vec![KeyValue::new("a", "1")]);
        request.auth.kind = AuthKind::ApiKey;

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["body"]["type"], "x-www-form-urlencoded");
        assert_eq!(json["body"]["formData"][0]["key"], "a");
        assert_eq!(json["auth"]["type"], "api-key");
        assert_eq!(json["auth"]["addTo"], "header");
    }

    #[test]
    fn urlencoded_alias_is_accepted() {
        let body: RequestBody =
            serde_json::from_str(r#"{"type":"urlencoded","content":"a=1"}"#).unwrap();
        assert_eq!(body.kind, BodyType::UrlEncoded);
    }

    #[test]
    fn history_entry_flattens_request_and_timestamp() {
        let entry = HistoryEntry {
            request: ApiRequest {
                url: "https://example.com".into(),
                ..ApiRequest::default()
            },
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);

        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn transport_error_has_status_zero() {
        let resp = ApiResponse::transport_error("connection refused", 12);
        assert_eq!(resp.status, 0);
        assert_eq!(resp.status_text, "Error");
        assert_eq!(resp.error.as_deref(), Some("connection refused"));
        assert_eq!(resp.body_text(), "connection refused");
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn environment_substitutes_enabled_variables_only() {
        let mut env = Environment::new("dev");
        env.set("host", "localhost:8080");
        env.variables.push(KeyValue {
            enabled: false,
            ..KeyValue::new("token", "secret")
        });

        assert_eq!(
            env.substitute("http://{{host}}/x?t={{token}}"),
            "http://localhost:8080/x?t={{token}}"
        );
        assert_eq!(env.get("host"), Some("localhost:8080"));
        assert_eq!(env.get("token"), None);
    }
}
