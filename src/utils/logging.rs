use serde::Serialize;
use serde_json::Value;

/// Pretty JSON for a debug line; skipped entirely unless DEBUG is enabled.
///
/// Top-level string fields listed in `redact` are replaced by a length marker so login secrets
/// (QR payloads, pairing codes) never reach the log sink.
pub(crate) fn with_redacted_json_debug<T, F>(value: &T, redact: &[&str], log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_value(value)
        .map(|mut json| {
            redact_fields(&mut json, redact);
            json
        })
        .and_then(|json| serde_json::to_string_pretty(&json))
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(pretty_json.as_str());
}

fn redact_fields(json: &mut Value, redact: &[&str]) {
    let Value::Object(map) = json else {
        return;
    };
    for key in redact {
        if let Some(slot) = map.get_mut(*key)
            && let Value::String(s) = slot
        {
            *slot = Value::String(format!("<redacted {} chars>", s.chars().count()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_only_named_string_fields() {
        let mut value = json!({ "qr": "2@secret", "connection": "connecting", "n": 3 });
        redact_fields(&mut value, &["qr", "n", "missing"]);
        assert_eq!(
            value,
            json!({ "qr": "<redacted 8 chars>", "connection": "connecting", "n": 3 })
        );
    }
}
