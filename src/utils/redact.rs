use serde_json::Value as JsonValue;

/// Shorten an identity for logs: keeps the first three characters.
pub fn mask_identity(value: &str) -> String {
    let prefix: String = value.chars().take(3).collect();
    format!("{prefix}...")
}

/// Mask identity and credential fields anywhere in a JSON payload before it is logged.
pub fn redact_sensitive_data(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_string_value(key, val)
                } else {
                    redact_sensitive_data(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(redact_sensitive_data).collect()),
        _ => data.clone(),
    }
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "login" | "username" | "token" | "authorization"
    )
}

fn is_credential(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(lower.as_str(), "token" | "authorization")
}

fn redact_string_value(key: &str, value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() && is_credential(key) => {
            JsonValue::String("[REDACTED]".to_string())
        }
        JsonValue::String(s) if !s.is_empty() => JsonValue::String(mask_identity(s)),
        _ => value.clone(),
    }
}
