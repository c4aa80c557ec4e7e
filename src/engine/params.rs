//! Placeholder substitution for URL and header templates.
//!
//! Three token shapes are recognized per parameter key: `{{ key }}` and
//! `{ key }` (optional internal whitespace, ASCII case-insensitive key match)
//! and `:key` (case-sensitive, only at a word boundary). Keys are applied in
//! descending length order so a short key never corrupts a longer key's
//! token. Unmatched placeholders are left verbatim.

pub fn substitute_params(template: &str, params: &[(String, String)]) -> String {
    if template.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut result = template.to_string();
    for (key, value) in sorted {
        if key.is_empty() {
            continue;
        }
        result = replace_braced(&result, key, value, true);
        result = replace_braced(&result, key, value, false);
        result = replace_prefixed(&result, key, value);
    }
    result
}

fn replace_braced(input: &str, key: &str, value: &str, double: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(position) = rest.find('{') {
        if let Some(token_len) = braced_token_len(&rest[position..], key, double) {
            out.push_str(&rest[..position]);
            out.push_str(value);
            rest = &rest[position + token_len..];
        } else {
            out.push_str(&rest[..position + 1]);
            rest = &rest[position + 1..];
        }
    }
    out.push_str(rest);
    out
}

/// Length of a brace token for `key` at the start of `token`, if present.
fn braced_token_len(token: &str, key: &str, double: bool) -> Option<usize> {
    let (open, close) = if double { ("{{", "}}") } else { ("{", "}") };
    let mut rest = token.strip_prefix(open)?;
    rest = rest.trim_start();
    let candidate = rest.get(..key.len())?;
    if !candidate.eq_ignore_ascii_case(key) {
        return None;
    }
    rest = &rest[key.len()..];
    rest = rest.trim_start();
    rest = rest.strip_prefix(close)?;
    Some(token.len() - rest.len())
}

fn replace_prefixed(input: &str, key: &str, value: &str) -> String {
    let token = format!(":{key}");
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(position) = rest.find(&token) {
        let after = &rest[position + token.len()..];
        let at_boundary = after
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
        if at_boundary {
            out.push_str(&rest[..position]);
            out.push_str(value);
        } else {
            out.push_str(&rest[..position + token.len()]);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_all_three_token_shapes() {
        let vars = params(&[("sign", "leo")]);
        assert_eq!(
            substitute_params("/h/{{sign}}/{sign}/:sign", &vars),
            "/h/leo/leo/leo"
        );
    }

    #[test]
    fn brace_tokens_allow_internal_whitespace() {
        let vars = params(&[("sign", "leo")]);
        assert_eq!(substitute_params("/{{ sign }}/{ sign }", &vars), "/leo/leo");
    }

    #[test]
    fn brace_tokens_match_case_insensitively() {
        let vars = params(&[("sign", "leo")]);
        assert_eq!(substitute_params("/{{SIGN}}/{Sign}", &vars), "/leo/leo");
    }

    #[test]
    fn colon_token_is_case_sensitive() {
        let vars = params(&[("sign", "leo")]);
        assert_eq!(substitute_params("/:SIGN/:sign", &vars), "/:SIGN/leo");
    }

    #[test]
    fn colon_token_respects_word_boundary() {
        let vars = params(&[("id", "42")]);
        assert_eq!(substitute_params("/:id/:id2/:id_x/:id.", &vars), "/42/:id2/:id_x/42.");
    }

    #[test]
    fn short_key_does_not_corrupt_longer_key() {
        let vars = params(&[("id", "7"), ("orderId", "900")]);
        assert_eq!(
            substitute_params("/orders/{{orderId}}/items/{{id}}", &vars),
            "/orders/900/items/7"
        );
        assert_eq!(substitute_params("/o/:orderId/:id", &vars), "/o/900/7");
    }

    #[test]
    fn unmatched_placeholders_left_verbatim() {
        let vars = params(&[("sign", "leo")]);
        assert_eq!(
            substitute_params("/{{unknown}}/:other/{{sign}}", &vars),
            "/{{unknown}}/:other/leo"
        );
    }

    #[test]
    fn substitution_is_idempotent_once_resolved() {
        let vars = params(&[("sign", "leo"), ("day", "today")]);
        let once = substitute_params("/h/{{sign}}?d={day}", &vars);
        let twice = substitute_params(&once, &vars);
        assert_eq!(once, twice);
        assert_eq!(once, "/h/leo?d=today");
    }

    #[test]
    fn empty_template_yields_empty_string() {
        assert_eq!(substitute_params("", &params(&[("a", "b")])), "");
    }

    #[test]
    fn empty_key_is_ignored() {
        let vars = params(&[("", "x"), ("sign", "leo")]);
        assert_eq!(substitute_params("/{{sign}}", &vars), "/leo");
    }
}
