//! Request model & builder
//!
//! Partial updates, row editing rules for key/value lists, environment
//! resolution and the effective (outbound) representation shared by the
//! HTTP executor and the code generator.

use base64::Engine;
use serde::Deserialize;

use crate::models::{
    ApiKeyLocation, ApiRequest, Auth, AuthKind, BodyType, Environment, HttpMethod, KeyValue,
    RequestBody,
};

/// Partial update merged into the active request
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub params: Option<Vec<KeyValue>>,
    pub headers: Option<Vec<KeyValue>>,
    pub body: Option<RequestBody>,
    pub auth: Option<Auth>,
}

impl ApiRequest {
    /// Shallow merge: fields absent from the patch keep their value
    pub fn apply(&mut self, patch: RequestPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(params) = patch.params {
            self.params = params;
        }
        if let Some(headers) = patch.headers {
            self.headers = headers;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(auth) = patch.auth {
            self.auth = auth;
        }
    }

    /// Copy with `{{variable}}` placeholders replaced from the environment
    pub fn resolved(&self, environment: Option<&Environment>) -> ApiRequest {
        let Some(env) = environment else {
            return self.clone();
        };
        let rows = |rows: &[KeyValue]| -> Vec<KeyValue> {
            rows.iter()
                .map(|row| KeyValue {
                    key: env.substitute(&row.key),
                    value: env.substitute(&row.value),
                    ..row.clone()
                })
                .collect()
        };

        ApiRequest {
            url: env.substitute(&self.url),
            params: rows(&self.params),
            headers: rows(&self.headers),
            body: RequestBody {
                kind: self.body.kind,
                content: env.substitute(&self.body.content),
                form_data: self.body.form_data.as_deref().map(rows),
            },
            auth: Auth {
                username: env.substitute(&self.auth.username),
                password: env.substitute(&self.auth.password),
                token: env.substitute(&self.auth.token),
                key: env.substitute(&self.auth.key),
                value: env.substitute(&self.auth.value),
                ..self.auth.clone()
            },
            ..self.clone()
        }
    }

    /// The subset of this request that is actually sent
    pub fn effective(&self) -> EffectiveRequest {
        let mut query: Vec<(String, String)> = effective_pairs(&self.params);
        let mut headers: Vec<(String, String)> = Vec::new();
        for (key, value) in effective_pairs(&self.headers) {
            set_header(&mut headers, &key, value);
        }

        match self.auth.kind {
            AuthKind::None => {}
            AuthKind::Basic => {
                let credentials = format!("{}:{}", self.auth.username, self.auth.password);
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                set_header(&mut headers, "Authorization", format!("Basic {}", encoded));
            }
            AuthKind::Bearer | AuthKind::OAuth2 => {
                if !self.auth.token.is_empty() {
                    set_header(
                        &mut headers,
                        "Authorization",
                        format!("Bearer {}", self.auth.token),
                    );
                }
            }
            AuthKind::ApiKey => {
                if !self.auth.key.is_empty() {
                    match self.auth.add_to {
                        ApiKeyLocation::Header => {
                            set_header(&mut headers, &self.auth.key, self.auth.value.clone())
                        }
                        ApiKeyLocation::Query => {
                            query.push((self.auth.key.clone(), self.auth.value.clone()))
                        }
                    }
                }
            }
        }

        let body = if self.method.has_body() {
            effective_body(&self.body)
        } else {
            None
        };

        match &body {
            Some(EffectiveBody::Json { .. }) => {
                set_header(&mut headers, "Content-Type", "application/json".to_string());
            }
            Some(EffectiveBody::UrlEncoded(_)) => {
                if !has_header(&headers, "Content-Type") {
                    headers.push((
                        "Content-Type".to_string(),
                        "application/x-www-form-urlencoded".to_string(),
                    ));
                }
            }
            _ => {}
        }

        EffectiveRequest {
            method: self.method,
            url: append_query(&self.url, &query),
            headers,
            body,
        }
    }
}

/// Outbound request: only enabled, non-empty rows; query serialized into the URL
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<EffectiveBody>,
}

impl EffectiveRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EffectiveBody {
    /// JSON body; `parsed` is `None` when the text is not valid JSON
    Json {
        raw: String,
        parsed: Option<serde_json::Value>,
    },
    Text(String),
    UrlEncoded(Vec<(String, String)>),
    Multipart(Vec<(String, String)>),
}

impl EffectiveBody {
    /// Body as it would appear on the wire (form fields url-encoded)
    pub fn to_text(&self) -> String {
        match self {
            EffectiveBody::Json { raw, .. } => raw.clone(),
            EffectiveBody::Text(text) => text.clone(),
            EffectiveBody::UrlEncoded(fields) | EffectiveBody::Multipart(fields) => {
                encode_pairs(fields)
            }
        }
    }
}

fn effective_body(body: &RequestBody) -> Option<EffectiveBody> {
    let form_fields = body
        .form_data
        .as_deref()
        .map(effective_pairs)
        .unwrap_or_default();

    match body.kind {
        BodyType::Json if !body.content.is_empty() => Some(EffectiveBody::Json {
            raw: body.content.clone(),
            parsed: serde_json::from_str(&body.content).ok(),
        }),
        BodyType::Raw if !body.content.is_empty() => {
            Some(EffectiveBody::Text(body.content.clone()))
        }
        BodyType::FormData if !form_fields.is_empty() => {
            Some(EffectiveBody::Multipart(form_fields))
        }
        BodyType::UrlEncoded if !form_fields.is_empty() => {
            Some(EffectiveBody::UrlEncoded(form_fields))
        }
        BodyType::UrlEncoded if !body.content.is_empty() => {
            Some(EffectiveBody::Text(body.content.clone()))
        }
        _ => None,
    }
}

fn effective_pairs(rows: &[KeyValue]) -> Vec<(String, String)> {
    rows.iter()
        .filter(|row| row.is_effective())
        .map(|row| (row.key.clone(), row.value.clone()))
        .collect()
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

/// Insert or override a header; an existing entry keeps its position
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(existing) => existing.1 = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// Percent-encode `key=value` pairs joined with `&`
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append serialized query pairs with `?` or `&` as appropriate
pub fn append_query(url: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, encode_pairs(pairs))
}

// ========================
// Row editing
// ========================

/// Edit applied to one key/value row
#[derive(Clone, Debug, PartialEq)]
pub enum RowEdit {
    Key(String),
    Value(String),
    Enabled(bool),
}

/// Apply an edit to a row. Typing into the last row appends a fresh blank
/// row so the list always ends with an empty editable one.
pub fn edit_row(rows: &mut Vec<KeyValue>, index: usize, edit: RowEdit) {
    let last = rows.len().saturating_sub(1);
    let Some(row) = rows.get_mut(index) else {
        return;
    };

    let text_edit = !matches!(edit, RowEdit::Enabled(_));
    match edit {
        RowEdit::Key(key) => row.key = key,
        RowEdit::Value(value) => row.value = value,
        RowEdit::Enabled(enabled) => row.enabled = enabled,
    }

    if text_edit && index == last && !row.is_blank() {
        rows.push(KeyValue::blank());
    }
}

/// Remove a row, keeping at least one: the last remaining row is cleared
pub fn remove_row(rows: &mut Vec<KeyValue>, index: usize) {
    if rows.len() <= 1 {
        match rows.first_mut() {
            Some(row) => {
                row.key.clear();
                row.value.clear();
            }
            None => rows.push(KeyValue::blank()),
        }
        return;
    }
    if index < rows.len() {
        rows.remove(index);
    }
}

/// Make sure a row list ends with a blank row
pub fn ensure_trailing_blank(rows: &mut Vec<KeyValue>) {
    if rows.last().map_or(true, |row| !row.is_blank()) {
        rows.push(KeyValue::blank());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &str, value: &str, enabled: bool) -> KeyValue {
        KeyValue {
            enabled,
            ..KeyValue::new(key, value)
        }
    }

    fn sample() -> ApiRequest {
        ApiRequest {
            url: "https://api.example.com/x".into(),
            params: vec![kv("a", "1", true)],
            headers: vec![],
            body: RequestBody {
                kind: BodyType::Json,
                content: String::new(),
                form_data: None,
            },
            ..ApiRequest::default()
        }
    }

    #[test]
    fn apply_keeps_unnamed_fields() {
        let mut request = sample();
        let original = request.clone();

        request.apply(RequestPatch {
            method: Some(HttpMethod::POST),
            ..Default::default()
        });
        request.apply(RequestPatch {
            name: Some("Create".into()),
            ..Default::default()
        });

        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(request.name, "Create");
        assert_eq!(request.url, original.url);
        assert_eq!(request.params, original.params);
        assert_eq!(request.headers, original.headers);
        assert_eq!(request.body, original.body);
        assert_eq!(request.auth, original.auth);
        assert_eq!(request.id, original.id);
    }

    #[test]
    fn editing_last_row_appends_blank_row() {
        let mut rows = vec![KeyValue::blank()];
        edit_row(&mut rows, 0, RowEdit::Key("Accept".into()));
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_blank());
        assert!(rows[1].enabled);

        // Editing a row that is no longer last does not append
        edit_row(&mut rows, 0, RowEdit::Value("text/plain".into()));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn toggling_or_clearing_last_row_does_not_append() {
        let mut rows = vec![KeyValue::blank()];
        edit_row(&mut rows, 0, RowEdit::Enabled(false));
        edit_row(&mut rows, 0, RowEdit::Key(String::new()));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn edit_out_of_range_is_ignored() {
        let mut rows = vec![KeyValue::blank()];
        edit_row(&mut rows, 3, RowEdit::Key("x".into()));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_blank());
    }

    #[test]
    fn removing_only_row_clears_it() {
        let mut rows = vec![kv("a", "1", true)];
        let id = rows[0].id.clone();
        remove_row(&mut rows, 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert!(rows[0].is_blank());

        let mut rows = vec![kv("a", "1", true), KeyValue::blank()];
        remove_row(&mut rows, 0);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_blank());

        let mut empty = Vec::new();
        remove_row(&mut empty, 0);
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn query_params_are_encoded_and_joined() {
        let mut request = sample();
        request.params = vec![
            kv("q", "a b&c", true),
            kv("skip", "me", false),
            kv("", "orphan", true),
        ];
        assert_eq!(
            request.effective().url,
            "https://api.example.com/x?q=a%20b%26c"
        );

        request.url = "https://api.example.com/x?page=2".into();
        assert_eq!(
            request.effective().url,
            "https://api.example.com/x?page=2&q=a%20b%26c"
        );
    }

    #[test]
    fn disabled_headers_are_dropped() {
        let mut request = sample();
        request.headers = vec![kv("X-On", "1", true), kv("X-Off", "2", false)];
        let effective = request.effective();
        assert_eq!(effective.headers, vec![("X-On".to_string(), "1".to_string())]);
    }

    #[test]
    fn get_never_carries_a_body() {
        let mut request = sample();
        request.body.content = r#"{"a":1}"#.into();
        let effective = request.effective();
        assert!(effective.body.is_none());
        assert!(effective.header("Content-Type").is_none());
    }

    #[test]
    fn json_body_overrides_content_type() {
        let mut request = sample();
        request.method = HttpMethod::POST;
        request.headers = vec![kv("content-type", "text/plain", true)];
        request.body.content = r#"{"a":1}"#.into();

        let effective = request.effective();
        assert_eq!(effective.headers.len(), 1);
        assert_eq!(effective.header("Content-Type"), Some("application/json"));
        match effective.body {
            Some(EffectiveBody::Json { parsed, .. }) => {
                assert_eq!(parsed, Some(serde_json::json!({"a": 1})))
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn malformed_json_keeps_raw_text() {
        let mut request = sample();
        request.method = HttpMethod::PUT;
        request.body.content = "{not json".into();
        match request.effective().body {
            Some(EffectiveBody::Json { raw, parsed }) => {
                assert_eq!(raw, "{not json");
                assert!(parsed.is_none());
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn urlencoded_rows_win_over_content() {
        let mut request = sample();
        request.method = HttpMethod::POST;
        request.body = RequestBody {
            kind: BodyType::UrlEncoded,
            content: "ignored=1".into(),
            form_data: Some(vec![kv("name", "J Doe", true), kv("off", "x", false)]),
        };
        let effective = request.effective();
        assert_eq!(
            effective.body,
            Some(EffectiveBody::UrlEncoded(vec![(
                "name".to_string(),
                "J Doe".to_string()
            )]))
        );
        assert_eq!(
            effective.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(effective.body.unwrap().to_text(), "name=J%20Doe");
    }

    #[test]
    fn auth_contributes_headers_and_query() {
        let mut request = sample();
        request.auth = Auth {
            kind: AuthKind::Basic,
            username: "user".into(),
            password: "pass".into(),
            ..Auth::default()
        };
        assert_eq!(
            request.effective().header("Authorization"),
            Some("Basic dXNlcjpwYXNz")
        );

        request.auth.kind = AuthKind::Bearer;
        request.auth.token = "abc".into();
        assert_eq!(
            request.effective().header("Authorization"),
            Some("Bearer abc")
        );

        request.auth.kind = AuthKind::ApiKey;
        request.auth.key = "api_key".into();
        request.auth.value = "k1".into();
        request.auth.add_to = ApiKeyLocation::Query;
        let effective = request.effective();
        assert!(effective.header("Authorization").is_none());
        assert_eq!(effective.url, "https://api.example.com/x?a=1&api_key=k1");
    }

    #[test]
    fn switching_auth_kind_keeps_other_fields() {
        let mut request = sample();
        request.auth.token = "abc".into();
        request.auth.kind = AuthKind::None;
        assert!(request.effective().header("Authorization").is_none());
        assert_eq!(request.auth.token, "abc");
    }

    #[test]
    fn resolved_substitutes_environment() {
        let mut env = Environment::new("dev");
        env.set("base", "http://localhost:3000");
        env.set("token", "t0k");

        let mut request = sample();
        request.url = "{{base}}/users".into();
        request.headers = vec![kv("X-Token", "{{token}}", true)];

        let resolved = request.resolved(Some(&env));
        assert_eq!(resolved.url, "http://localhost:3000/users");
        assert_eq!(resolved.headers[0].value, "t0k");
        assert_eq!(resolved.id, request.id);
        assert_eq!(request.resolved(None), request);
    }
}
