use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::warn;

const REDACTED: &str = "***";
const SECRET_KEYS: [&str; 2] = ["sessionid", "password"];

/// Appends one JSON line per request and response to a transcript file.
/// Credentials and session ids never reach the file.
pub(crate) struct MessageLogger {
    file: File,
}

impl MessageLogger {
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn log_request(
        &mut self,
        method: &str,
        url: &str,
        params: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "url": url,
            "params": redact_pairs(params),
            "form": form.map(redact_pairs),
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, status: u16, body: &str) {
        let body = match serde_json::from_str::<Value>(body) {
            Ok(mut value) => {
                redact_value(&mut value);
                value
            }
            Err(_) => Value::String(body.to_string()),
        };
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "status": status,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_reauth(&mut self, url: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "auth",
            "reason": "unauthorized",
            "url": url,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write transcript entry: {e}");
        }
    }
}

fn is_secret(key: &str) -> bool {
    SECRET_KEYS.iter().any(|s| s.eq_ignore_ascii_case(key))
}

fn redact_pairs(pairs: &[(&str, String)]) -> Value {
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(key, value)| {
            let value = if is_secret(key) { REDACTED } else { value.as_str() };
            (key.to_string(), Value::String(value.to_string()))
        })
        .collect();
    Value::Object(map)
}

fn redact_value(value: &mut Value) {
    if let Value::Object(map) = value {
        for (key, v) in map.iter_mut() {
            if is_secret(key) {
                *v = Value::String(REDACTED.to_string());
            }
        }
    }
}
