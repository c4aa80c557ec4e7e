//! Tolerant parser for captured cURL commands.
//!
//! Parsing never fails: anything it cannot make sense of simply leaves the
//! corresponding template field at its default, and the caller checks
//! [`CurlTemplate::is_usable`] before starting a batch.

use crate::domain::CurlTemplate;

pub fn parse_curl(input: &str) -> CurlTemplate {
    let clean = input.replace("\\\r\n", " ").replace("\\\n", " ");
    let tokens = tokenize(clean.trim());

    let mut template = CurlTemplate::default();
    let mut explicit_method = false;
    let mut saw_data_flag = false;

    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        if token.eq_ignore_ascii_case("-x") || token.eq_ignore_ascii_case("--request") {
            if let Some(value) = tokens.get(index + 1) {
                template.method = value.trim().to_ascii_uppercase();
                explicit_method = true;
                index += 1;
            }
        } else if token == "-H" || token == "--header" {
            if let Some(value) = tokens.get(index + 1) {
                // Split on the first colon only; header values may contain more.
                if let Some((name, header_value)) = value.split_once(':') {
                    insert_header(
                        &mut template.headers,
                        name.trim().to_string(),
                        header_value.trim().to_string(),
                    );
                }
                index += 1;
            }
        } else if matches!(
            token.as_str(),
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-urlencode"
        ) {
            saw_data_flag = true;
            if let Some(value) = tokens.get(index + 1) {
                if template.body.is_none() {
                    template.body = Some(value.clone());
                }
                index += 1;
            }
        } else if template.url.is_empty() {
            if let Some(url) = find_url(token) {
                template.url = url;
            }
        }
        index += 1;
    }

    if !explicit_method && saw_data_flag {
        template.method = "POST".to_string();
    }

    if let Some(body) = &template.body {
        let has_content_type = template
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        let trimmed = body.trim();
        if !has_content_type && (trimmed.starts_with('{') || trimmed.starts_with('[')) {
            template
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }
    }

    template
}

/// Split a command line into tokens, treating single- or double-quoted spans
/// as part of the surrounding token. Quote characters themselves are dropped.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// A later occurrence of the same name overwrites in place so insertion order
/// is preserved for undisturbed keys.
fn insert_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    if let Some(slot) = headers.iter_mut().find(|(existing, _)| *existing == name) {
        slot.1 = value;
    } else {
        headers.push((name, value));
    }
}

/// First HTTP/HTTPS URL embedded in the token, truncated at any whitespace a
/// quoted token may have carried.
fn find_url(token: &str) -> Option<String> {
    let lower = token.to_ascii_lowercase();
    let position = match (lower.find("http://"), lower.find("https://")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    let tail = &token[position..];
    let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
    Some(tail[..end].to_string())
}
