//! cURL import - turns a pasted `curl` command into a request
//!
//! Export goes through [`crate::codegen`].

use anyhow::{anyhow, bail, Result};

use crate::models::{ApiRequest, AuthKind, BodyType, HttpMethod, KeyValue};
use crate::request::ensure_trailing_blank;

/// Parse a cURL command into a request
pub fn parse_curl(input: &str) -> Result<ApiRequest> {
    let mut request = ApiRequest {
        params: Vec::new(),
        headers: Vec::new(),
        ..ApiRequest::default()
    };
    request.body.content.clear();

    let normalized = input.replace("\\\r\n", " ").replace("\\\n", " ");
    let mut tokens = tokenize(&normalized)?;

    if tokens.first().map(|s| s.as_str()) == Some("curl") {
        tokens.remove(0);
    }

    let mut explicit_method = false;
    let mut form_rows: Vec<KeyValue> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let arg = tokens.get(i + 1).cloned();

        match token {
            "-X" | "--request" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                request.method = HttpMethod::parse(&value)
                    .ok_or_else(|| anyhow!("Unknown HTTP method: {}", value))?;
                explicit_method = true;
                i += 1;
            }
            "-H" | "--header" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                add_header(&mut request, &value)?;
                i += 1;
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                if !request.body.content.is_empty() {
                    request.body.content.push('&');
                }
                request.body.content.push_str(&value);
                i += 1;
            }
            "--data-urlencode" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                let (key, val) = split_pair(&value, '=');
                form_rows.push(KeyValue::new(key, val));
                request.body.kind = BodyType::UrlEncoded;
                i += 1;
            }
            "-F" | "--form" | "--form-string" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                let (key, val) = split_pair(&value, '=');
                form_rows.push(KeyValue::new(key, val));
                request.body.kind = BodyType::FormData;
                i += 1;
            }
            "-u" | "--user" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                let (user, pass) = split_pair(&value, ':');
                request.auth.kind = AuthKind::Basic;
                request.auth.username = user;
                request.auth.password = pass;
                i += 1;
            }
            "--url" => {
                let value = arg.ok_or_else(|| anyhow!("Missing value for {}", token))?;
                set_url(&mut request, &value);
                i += 1;
            }
            "--compressed" | "-k" | "--insecure" | "-L" | "--location" | "-s" | "--silent"
            | "-v" | "--verbose" | "-i" | "--include" => {
                // Ignored flags
            }
            other if other.starts_with('-') => {
                tracing::debug!(flag = other, "Ignoring unsupported curl flag");
            }
            other => {
                if request.url.is_empty() {
                    set_url(&mut request, other);
                }
            }
        }
        i += 1;
    }

    if request.url.is_empty() {
        bail!("No URL found in cURL command");
    }

    let has_body = !request.body.content.is_empty() || !form_rows.is_empty();
    if has_body && !explicit_method {
        request.method = HttpMethod::POST;
    }

    if !form_rows.is_empty() {
        ensure_trailing_blank(&mut form_rows);
        request.body.form_data = Some(form_rows);
    } else if !request.body.content.is_empty() {
        let declared_json = request
            .headers
            .iter()
            .any(|h| h.key.eq_ignore_ascii_case("content-type") && h.value.contains("json"));
        let parses = serde_json::from_str::<serde_json::Value>(&request.body.content).is_ok();
        request.body.kind = if declared_json || parses {
            BodyType::Json
        } else {
            BodyType::Raw
        };
    }

    if request.body.kind == BodyType::Json {
        // The JSON body type supplies its own Content-Type
        request
            .headers
            .retain(|h| !h.key.eq_ignore_ascii_case("content-type"));
    }

    ensure_trailing_blank(&mut request.params);
    ensure_trailing_blank(&mut request.headers);
    Ok(request)
}

/// Split the query string off into param rows
fn set_url(request: &mut ApiRequest, raw: &str) {
    match raw.split_once('?') {
        Some((base, query)) => {
            request.url = base.to_string();
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = split_pair(pair, '=');
                let key = urlencoding::decode(&key)
                    .map(|s| s.into_owned())
                    .unwrap_or(key);
                let value = urlencoding::decode(&value)
                    .map(|s| s.into_owned())
                    .unwrap_or(value);
                request.params.push(KeyValue::new(key, value));
            }
        }
        None => request.url = raw.to_string(),
    }
}

fn add_header(request: &mut ApiRequest, raw: &str) -> Result<()> {
    let (key, value) = raw
        .split_once(':')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| anyhow!("Invalid header format: {}", raw))?;

    if key.eq_ignore_ascii_case("authorization") {
        if let Some(token) = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
        {
            request.auth.kind = AuthKind::Bearer;
            request.auth.token = token.trim().to_string();
            return Ok(());
        }
    }

    // Don't add duplicate headers
    if !request.headers.iter().any(|h| h.key.eq_ignore_ascii_case(key)) {
        request.headers.push(KeyValue::new(key, value));
    }
    Ok(())
}

fn split_pair(s: &str, separator: char) -> (String, String) {
    match s.split_once(separator) {
        Some((k, v)) => (k.to_string(), v.to_string()),
        None => (s.to_string(), String::new()),
    }
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;
    let mut quoted = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                quoted = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                quoted = true;
            }
            ' ' | '\t' | '\n' | '\r' if !in_single_quote && !in_double_quote => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if in_single_quote || in_double_quote {
        bail!("Unterminated quote in cURL command");
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{generate, CodeFormat};

    #[test]
    fn test_parse_simple_get() {
        let req = parse_curl("curl https://api.example.com/users").unwrap();
        assert_eq!(req.url, "https://api.example.com/users");
        assert_eq!(req.method, HttpMethod::GET);
        assert_eq!(req.params.len(), 1);
        assert!(req.params[0].is_blank());
    }

    #[test]
    fn test_parse_post_with_data() {
        let curl = r#"curl -X POST -H "Content-Type: application/json" -d '{"name":"test"}' https://api.example.com/users"#;
        let req = parse_curl(curl).unwrap();
        assert_eq!(req.method, HttpMethod::POST);
        assert_eq!(req.body.kind, BodyType::Json);
        assert_eq!(req.body.content, r#"{"name":"test"}"#);
        assert!(req.headers.iter().all(|h| h.is_blank()));
    }

    #[test]
    fn data_without_method_implies_post() {
        let req = parse_curl("curl -d 'plain text' https://example.com").unwrap();
        assert_eq!(req.method, HttpMethod::POST);
        assert_eq!(req.body.kind, BodyType::Raw);
    }

    #[test]
    fn query_string_becomes_params() {
        let req = parse_curl("curl 'https://example.com/search?q=a%20b&page=2'").unwrap();
        assert_eq!(req.url, "https://example.com/search");
        assert_eq!(req.params[0].key, "q");
        assert_eq!(req.params[0].value, "a b");
        assert_eq!(req.params[1].key, "page");
        assert!(req.params[2].is_blank());
    }

    #[test]
    fn auth_flags_map_to_auth() {
        let req = parse_curl("curl -u admin:secret https://example.com").unwrap();
        assert_eq!(req.auth.kind, AuthKind::Basic);
        assert_eq!(req.auth.username, "admin");
        assert_eq!(req.auth.password, "secret");

        let req =
            parse_curl("curl -H 'Authorization: Bearer abc123' https://example.com").unwrap();
        assert_eq!(req.auth.kind, AuthKind::Bearer);
        assert_eq!(req.auth.token, "abc123");
    }

    #[test]
    fn form_flags_become_form_rows() {
        let req = parse_curl("curl -F 'name=jo' -F 'age=3' https://example.com").unwrap();
        assert_eq!(req.body.kind, BodyType::FormData);
        let rows = req.body.form_data.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].key, "age");
    }

    #[test]
    fn generated_curl_imports_back() {
        let original = parse_curl(
            r#"curl -X PUT 'https://example.com/items?id=7' -H 'X-Trace: 1' -d '{"ok":true}'"#,
        )
        .unwrap();
        let code = generate(&original, CodeFormat::Curl);
        let reparsed = parse_curl(&code).unwrap();

        assert_eq!(reparsed.method, HttpMethod::PUT);
        assert_eq!(reparsed.url, "https://example.com/items");
        assert_eq!(reparsed.params[0].value, "7");
        assert_eq!(reparsed.headers[0].key, "X-Trace");
        assert_eq!(reparsed.body.content, r#"{"ok":true}"#);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(parse_curl("curl -X GET").is_err());
        assert!(parse_curl("curl 'https://example.com").is_err());
    }
}
