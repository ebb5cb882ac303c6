use serde_json::Value;

/// One named structural check in the pattern table: required top-level field
/// presence plus a nested-field check on a representative child element.
#[derive(Debug, Clone, Copy)]
pub struct StructuralPattern {
    pub provider: &'static str,
    pub name: &'static str,
    matches: fn(&Value) -> bool,
}

impl StructuralPattern {
    pub fn matches(&self, raw: &Value) -> bool {
        (self.matches)(raw)
    }
}

fn child_object<'a>(raw: &'a Value, field: &str) -> Option<&'a serde_json::Map<String, Value>> {
    raw.get(field)?.as_array()?.first()?.as_object()
}

fn bundle_pattern(raw: &Value) -> bool {
    let Some(convs) = raw.get("conversations").and_then(Value::as_array) else {
        return false;
    };
    if convs.is_empty() {
        // An empty bundle is still structurally a bundle.
        return true;
    }
    convs[0].as_object().is_some_and(|child| child.contains_key("messages") || child.contains_key("mapping"))
}

fn simple_pattern(raw: &Value) -> bool {
    raw.get("messages").and_then(Value::as_array).is_some()
}

fn simple_message_shape(raw: &Value) -> bool {
    match child_object(raw, "messages") {
        Some(child) => child.contains_key("role") || child.contains_key("author"),
        None => false,
    }
}

fn tree_pattern(raw: &Value) -> bool {
    raw.get("mapping").and_then(Value::as_object).is_some()
}

fn tree_node_shape(raw: &Value) -> bool {
    raw.get("mapping")
        .and_then(Value::as_object)
        .and_then(|mapping| mapping.values().next())
        .and_then(Value::as_object)
        .is_some_and(|node| node.contains_key("message") || node.contains_key("children") || node.contains_key("parent"))
}

/// Structural pattern table checked before any parser's own `canParse`.
/// Order matters only for presentation; `detect_structural` evaluates every
/// entry and returns all that matched.
const PATTERNS: &[StructuralPattern] = &[
    StructuralPattern { provider: "bundle", name: "top_level_conversations_array", matches: bundle_pattern },
    StructuralPattern { provider: "simple", name: "top_level_messages_array", matches: simple_pattern },
    StructuralPattern { provider: "simple", name: "message_has_role_or_author", matches: simple_message_shape },
    StructuralPattern { provider: "tree", name: "top_level_mapping_object", matches: tree_pattern },
    StructuralPattern { provider: "tree", name: "mapping_node_has_message_or_children", matches: tree_node_shape },
];

/// Runs the structural pattern table against `raw`, returning the provider
/// with the most matched patterns (ties broken by table order) together with
/// the names of every pattern it matched. `None` if nothing matched.
pub fn detect_structural(raw: &Value) -> Option<(&'static str, Vec<&'static str>)> {
    // Providers in first-seen table order, not a HashMap -- iteration order
    // must be deterministic so ties resolve to the earliest provider in
    // `PATTERNS`, matching this function's own contract.
    let mut by_provider: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for pattern in PATTERNS {
        if !pattern.matches(raw) {
            continue;
        }
        match by_provider.iter_mut().find(|(provider, _)| *provider == pattern.provider) {
            Some((_, patterns)) => patterns.push(pattern.name),
            None => by_provider.push((pattern.provider, vec![pattern.name])),
        }
    }

    let mut best: Option<(&'static str, Vec<&'static str>)> = None;
    for (provider, patterns) in by_provider {
        match &best {
            Some((_, best_patterns)) if best_patterns.len() >= patterns.len() => {}
            _ => best = Some((provider, patterns)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_shape_matches_both_simple_patterns() {
        let raw = json!({"messages": [{"role": "user", "content": "hi"}]});
        let (provider, patterns) = detect_structural(&raw).unwrap();
        assert_eq!(provider, "simple");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn bundle_shape_matches() {
        let raw = json!({"conversations": [{"messages": []}]});
        let (provider, _) = detect_structural(&raw).unwrap();
        assert_eq!(provider, "bundle");
    }

    #[test]
    fn tree_shape_matches() {
        let raw = json!({"mapping": {"root": {"message": null, "children": []}}});
        let (provider, patterns) = detect_structural(&raw).unwrap();
        assert_eq!(provider, "tree");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn unrecognized_shape_matches_nothing() {
        let raw = json!({"foo": "bar"});
        assert!(detect_structural(&raw).is_none());
    }

    #[test]
    fn tie_between_providers_breaks_by_table_order() {
        // Carries both a top-level "messages" array (matches "simple" twice:
        // top_level_messages_array + message_has_role_or_author) and a
        // top-level "mapping" object (matches "tree" twice: top_level_mapping_object
        // + mapping_node_has_message_or_children) -- an exact 2-2 tie.
        // "simple" appears earlier in PATTERNS, so it must win deterministically
        // across repeated calls, not whichever HashMap happened to iterate last.
        let raw = json!({
            "messages": [{"role": "user", "content": "hi"}],
            "mapping": {"root": {"message": null, "children": []}},
        });
        for _ in 0..50 {
            let (provider, patterns) = detect_structural(&raw).unwrap();
            assert_eq!(provider, "simple");
            assert_eq!(patterns.len(), 2);
        }
    }
}
