//! Dotted/indexed path extraction over parsed JSON.
//!
//! The path grammar is deliberately small: dot-separated segments, with
//! bracket indices `[n]` rewritten to `.n` before segmentation. A failed
//! traversal is not an error; it falls back to the raw document when the
//! document is itself a string, and to an empty string otherwise.

use serde_json::Value;

pub fn extract_path(document: &Value, path: &str) -> String {
    if document.is_null() {
        return String::new();
    }

    let trimmed = path.trim();
    if trimmed.is_empty() {
        return render_root(document);
    }

    let segments = split_segments(trimmed);

    let mut current = document;
    // Unwrap the common "response wrapped in a one-element array" shape when
    // the path does not address the array explicitly.
    if let Value::Array(items) = current {
        let first_is_index = segments
            .first()
            .map_or(false, |segment| segment.parse::<usize>().is_ok());
        if !first_is_index {
            match items.first() {
                Some(first) => current = first,
                None => return traversal_miss(document),
            }
        }
    }

    for segment in &segments {
        let next = match current {
            Value::Object(map) => map.get(segment.as_str()),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return traversal_miss(document),
        }
    }

    if current.is_null() {
        return traversal_miss(document);
    }
    render_result(current)
}

fn split_segments(path: &str) -> Vec<String> {
    rewrite_indices(path)
        .trim_start_matches('.')
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rewrite `[n]` bracket indices to `.n` so segmentation is uniform.
fn rewrite_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(position) = rest.find('[') {
        let after = &rest[position + 1..];
        if let Some(end) = after.find(']') {
            let inner = &after[..end];
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                out.push_str(&rest[..position]);
                out.push('.');
                out.push_str(inner);
                rest = &after[end + 1..];
                continue;
            }
        }
        out.push_str(&rest[..position + 1]);
        rest = &rest[position + 1..];
    }
    out.push_str(rest);
    out
}

fn traversal_miss(document: &Value) -> String {
    match document {
        Value::String(raw) => raw.clone(),
        _ => String::new(),
    }
}

fn render_root(document: &Value) -> String {
    match document {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(document).unwrap_or_default()
        }
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

fn render_result(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => serde_json::to_string_pretty(value).unwrap_or_default(),
        Value::String(raw) => raw.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_and_bracket_paths_are_equivalent() {
        let document = json!({"data": [{"prediction": "Leo will travel"}]});
        assert_eq!(extract_path(&document, "data.0.prediction"), "Leo will travel");
        assert_eq!(extract_path(&document, "data[0].prediction"), "Leo will travel");
    }

    #[test]
    fn bare_array_root_is_implicitly_unwrapped() {
        let document = json!([{"prediction": "ok"}]);
        assert_eq!(extract_path(&document, "prediction"), "ok");
    }

    #[test]
    fn dot_only_path_on_array_root_unwraps_to_first_element() {
        let document = json!([{"prediction": "ok"}]);
        assert_eq!(extract_path(&document, "."), "{\n  \"prediction\": \"ok\"\n}");
        let empty: Value = json!([]);
        assert_eq!(extract_path(&empty, "."), "");
    }

    #[test]
    fn explicit_index_skips_implicit_unwrap() {
        let document = json!([{"prediction": "first"}, {"prediction": "second"}]);
        assert_eq!(extract_path(&document, "1.prediction"), "second");
    }

    #[test]
    fn empty_path_pretty_prints_structured_documents() {
        let document = json!({"a": 1});
        assert_eq!(extract_path(&document, ""), "{\n  \"a\": 1\n}");
        assert_eq!(extract_path(&document, "   "), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn empty_path_on_primitive_returns_string_form() {
        assert_eq!(extract_path(&json!(42), ""), "42");
        assert_eq!(extract_path(&json!("plain"), ""), "plain");
    }

    #[test]
    fn leading_dot_and_empty_segments_are_ignored() {
        let document = json!({"data": {"prediction": "ok"}});
        assert_eq!(extract_path(&document, ".data..prediction"), "ok");
    }

    #[test]
    fn miss_on_structured_document_yields_empty_string() {
        let document = json!({"data": {"prediction": "ok"}});
        assert_eq!(extract_path(&document, "data.missing"), "");
        assert_eq!(extract_path(&document, "data.prediction.deeper"), "");
    }

    #[test]
    fn miss_on_string_document_returns_the_document() {
        let document = json!("just some text");
        assert_eq!(extract_path(&document, "prediction"), "just some text");
    }

    #[test]
    fn structured_result_is_pretty_printed() {
        let document = json!({"data": {"inner": {"a": 1}}});
        assert_eq!(extract_path(&document, "data.inner"), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn string_result_is_trimmed() {
        let document = json!({"prediction": "  padded  "});
        assert_eq!(extract_path(&document, "prediction"), "padded");
    }

    #[test]
    fn null_values_fall_back() {
        assert_eq!(extract_path(&Value::Null, "anything"), "");
        let document = json!({"prediction": null});
        assert_eq!(extract_path(&document, "prediction"), "");
    }

    #[test]
    fn out_of_bounds_index_misses() {
        let document = json!({"data": ["only"]});
        assert_eq!(extract_path(&document, "data.5"), "");
    }
}
