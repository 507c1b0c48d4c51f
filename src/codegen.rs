//! Code generation - renders a request as a shell command or script
//!
//! Every renderer works from [`ApiRequest::effective`], so disabled rows and
//! GET bodies never leak into the output. Generation is total: malformed
//! bodies or URLs degrade to best-effort text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ApiRequest;
use crate::request::{EffectiveBody, EffectiveRequest};

/// Target output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeFormat {
    #[default]
    Curl,
    Fetch,
    Axios,
    NodeHttp,
}

impl CodeFormat {
    pub const ALL: [CodeFormat; 4] = [
        CodeFormat::Curl,
        CodeFormat::Fetch,
        CodeFormat::Axios,
        CodeFormat::NodeHttp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CodeFormat::Curl => "cURL",
            CodeFormat::Fetch => "JavaScript - Fetch",
            CodeFormat::Axios => "JavaScript - Axios",
            CodeFormat::NodeHttp => "Node.js - HTTP",
        }
    }

    pub fn next(&self) -> CodeFormat {
        match self {
            CodeFormat::Curl => CodeFormat::Fetch,
            CodeFormat::Fetch => CodeFormat::Axios,
            CodeFormat::Axios => CodeFormat::NodeHttp,
            CodeFormat::NodeHttp => CodeFormat::Curl,
        }
    }
}

/// Render `request` in the given format
pub fn generate(request: &ApiRequest, format: CodeFormat) -> String {
    let effective = request.effective();
    match format {
        CodeFormat::Curl => render_curl(&effective),
        CodeFormat::Fetch => render_fetch(&effective),
        CodeFormat::Axios => render_axios(&effective),
        CodeFormat::NodeHttp => render_node_http(&effective),
    }
}

/// Single-quote for a POSIX shell
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Single-quoted JavaScript string literal
fn js_quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("'{}'", escaped)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Indent every line after the first so nested JSON lines up
fn indent_continuation(text: &str, indent: &str) -> String {
    text.replace('\n', &format!("\n{}", indent))
}

fn headers_object(headers: &[(String, String)]) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

fn fields_object(fields: &[(String, String)]) -> Value {
    headers_object(fields)
}

fn render_curl(req: &EffectiveRequest) -> String {
    let mut parts = vec![format!(
        "curl -X {} {}",
        req.method.as_str(),
        shell_quote(&req.url)
    )];

    for (key, value) in &req.headers {
        parts.push(format!("-H {}", shell_quote(&format!("{}: {}", key, value))));
    }

    match &req.body {
        Some(EffectiveBody::Multipart(fields)) => {
            for (key, value) in fields {
                parts.push(format!("-F {}", shell_quote(&format!("{}={}", key, value))));
            }
        }
        Some(body) => parts.push(format!("-d {}", shell_quote(&body.to_text()))),
        None => {}
    }

    parts.join(" \\\n  ")
}

fn render_fetch(req: &EffectiveRequest) -> String {
    let mut options = Map::new();
    options.insert("method".into(), Value::String(req.method.as_str().into()));
    options.insert("headers".into(), headers_object(&req.headers));

    let mut preamble = String::new();
    let mut form_body = false;
    match &req.body {
        Some(EffectiveBody::Multipart(fields)) => {
            preamble.push_str("const formData = new FormData();\n");
            for (key, value) in fields {
                preamble.push_str(&format!(
                    "formData.append({}, {});\n",
                    js_quote(key),
                    js_quote(value)
                ));
            }
            preamble.push('\n');
            form_body = true;
        }
        Some(body) => {
            options.insert("body".into(), Value::String(body.to_text()));
        }
        None => {}
    }

    let mut options_text = pretty(&Value::Object(options));
    if form_body {
        // FormData is not JSON; splice the variable in as the last property
        if let Some(head) = options_text.strip_suffix("\n}") {
            options_text = format!("{},\n  \"body\": formData\n}}", head);
        }
    }

    format!(
        "{}fetch({}, {})\n  .then(response => response.json())\n  .then(data => console.log(data))\n  .catch(error => console.error('Error:', error));",
        preamble,
        js_quote(&req.url),
        options_text
    )
}

fn render_axios(req: &EffectiveRequest) -> String {
    let mut headers = req.headers.clone();
    let data = match &req.body {
        Some(EffectiveBody::Json { raw, parsed }) => {
            Some(parsed.clone().unwrap_or_else(|| Value::String(raw.clone())))
        }
        Some(EffectiveBody::Multipart(fields)) => {
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                headers.push(("Content-Type".into(), "multipart/form-data".into()));
            }
            Some(fields_object(fields))
        }
        Some(body) => Some(Value::String(body.to_text())),
        None => None,
    };

    let mut config = Map::new();
    config.insert(
        "method".into(),
        Value::String(req.method.as_str().to_lowercase()),
    );
    config.insert("url".into(), Value::String(req.url.clone()));
    config.insert("headers".into(), headers_object(&headers));
    if let Some(data) = data {
        config.insert("data".into(), data);
    }

    format!(
        "const axios = require('axios');\n\nconst config = {};\n\naxios(config)\n  .then(function (response) {{\n    console.log(JSON.stringify(response.data));\n  }})\n  .catch(function (error) {{\n    console.log(error);\n  }});",
        pretty(&Value::Object(config))
    )
}

/// Host/path pieces for `https.request`. Unparseable URLs give empty parts.
struct UrlParts {
    module: &'static str,
    hostname: String,
    port: Option<u16>,
    path: String,
}

fn url_parts(url: &str) -> UrlParts {
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            let path = match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            };
            UrlParts {
                module: if parsed.scheme() == "http" { "http" } else { "https" },
                hostname: parsed.host_str().unwrap_or_default().to_string(),
                port: parsed.port(),
                path,
            }
        }
        Err(_) => UrlParts {
            module: "https",
            hostname: String::new(),
            port: None,
            path: String::new(),
        },
    }
}

fn render_node_http(req: &EffectiveRequest) -> String {
    let parts = url_parts(&req.url);

    let mut headers = req.headers.clone();
    if let Some(EffectiveBody::Multipart(_)) = &req.body {
        // Fields are written url-encoded
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            headers.push((
                "Content-Type".into(),
                "application/x-www-form-urlencoded".into(),
            ));
        }
    }

    let mut options = vec![
        format!("  'method': {}", js_quote(req.method.as_str())),
        format!("  'hostname': {}", js_quote(&parts.hostname)),
    ];
    if let Some(port) = parts.port {
        options.push(format!("  'port': {}", port));
    }
    options.push(format!("  'path': {}", js_quote(&parts.path)));
    options.push(format!(
        "  'headers': {}",
        indent_continuation(&pretty(&headers_object(&headers)), "  ")
    ));

    let write = match &req.body {
        Some(body) => format!("req.write({});\n", Value::String(body.to_text())),
        None => String::new(),
    };

    format!(
        r#"const {module} = require('follow-redirects').{module};

const options = {{
{options}
}};

const req = {module}.request(options, function (res) {{
  const chunks = [];

  res.on("data", function (chunk) {{
    chunks.push(chunk);
  }});

  res.on("end", function (chunk) {{
    const body = Buffer.concat(chunks);
    console.log(body.toString());
  }});

  res.on("error", function (error) {{
    console.error(error);
  }});
}});

{write}req.end();"#,
        module = parts.module,
        options = options.join(",\n"),
        write = write,
    )
}
