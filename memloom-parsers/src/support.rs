use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use memloom_core::models::Role;

/// Numeric timestamps below this are treated as seconds; at or above, as
/// milliseconds. `10^10` seconds is the year 2286, far past any realistic
/// second-precision export.
const SECONDS_MS_BOUNDARY: f64 = 1e10;

/// Normalizes a provider timestamp field. Numeric values follow the
/// seconds-vs-milliseconds heuristic; strings are parsed as a date; anything
/// invalid or absent defaults to "now" at parse time.
pub fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    match value {
        Some(Value::Number(n)) => {
            if let Some(f) = n.as_f64() {
                let millis = if f.abs() < SECONDS_MS_BOUNDARY {
                    (f * 1000.0) as i64
                } else {
                    f as i64
                };
                Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
            } else {
                Utc::now()
            }
        }
        Some(Value::String(s)) => parse_timestamp_str(s).unwrap_or_else(Utc::now),
        _ => Utc::now(),
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Maps a provider-native role string through `synonyms` onto the canonical
/// three-role set, defaulting unknown roles to `Assistant`.
pub fn map_role(raw: &str, synonyms: &[(&str, Role)]) -> Role {
    Role::from_provider_str(raw, synonyms)
}

/// Builds a metadata bag from every key in `object` not named in `known_keys`
/// — no provider field is ever silently dropped.
pub fn preserve_unknown_fields(object: &Map<String, Value>, known_keys: &[&str]) -> Value {
    let mut extra = Map::new();
    for (key, value) in object {
        if !known_keys.contains(&key.as_str()) {
            extra.insert(key.clone(), value.clone());
        }
    }
    Value::Object(extra)
}

/// A message is droppable per §4.2 iff its content is empty after trimming.
pub fn is_droppable_content(content: &str) -> bool {
    content.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seconds_below_boundary_are_scaled_to_millis() {
        let ts = parse_timestamp(Some(&json!(1_700_000_000)));
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn millis_at_or_above_boundary_pass_through() {
        let ts = parse_timestamp(Some(&json!(1_700_000_000_000i64)));
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn invalid_string_defaults_to_now() {
        let before = Utc::now();
        let ts = parse_timestamp(Some(&json!("not a date")));
        assert!(ts >= before);
    }

    #[test]
    fn missing_value_defaults_to_now() {
        let before = Utc::now();
        let ts = parse_timestamp(None);
        assert!(ts >= before);
    }

    #[test]
    fn unknown_role_defaults_to_assistant() {
        let role = map_role("narrator", &[("user", Role::User), ("bot", Role::Assistant)]);
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn preserve_unknown_fields_keeps_only_unrecognized_keys() {
        let object = serde_json::json!({"role": "user", "content": "hi", "custom_flag": true})
            .as_object()
            .unwrap()
            .clone();
        let metadata = preserve_unknown_fields(&object, &["role", "content"]);
        assert_eq!(metadata, serde_json::json!({"custom_flag": true}));
    }
}
