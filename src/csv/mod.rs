//! Header-driven CSV row source and report sink.
//!
//! Double-quoted fields may contain the delimiter and literal newlines, a
//! doubled quote (`""`) is one literal quote, fields are trimmed, and blank
//! rows are skipped. Output always quotes every value.

pub type Row = Vec<(String, String)>;

pub fn parse_csv(text: &str) -> Vec<Row> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => current_row.push(take_trimmed(&mut field)),
                '\n' | '\r' => {
                    current_row.push(take_trimmed(&mut field));
                    if current_row.iter().any(|value| !value.is_empty()) {
                        records.push(std::mem::take(&mut current_row));
                    } else {
                        current_row.clear();
                    }
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                other => field.push(other),
            }
        }
    }
    if !field.is_empty() || !current_row.is_empty() {
        current_row.push(take_trimmed(&mut field));
        records.push(current_row);
    }

    if records.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = records[0]
        .iter()
        .map(|header| strip_wrapping_quotes(header).trim().to_string())
        .collect();

    records[1..]
        .iter()
        .map(|record| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), record.get(idx).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Serialize rows back to CSV text. The header row comes from the first
/// row's keys; every value is quoted with internal quotes doubled.
pub fn write_csv(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let headers: Vec<&str> = first.iter().map(|(name, _)| name.as_str()).collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));

    for row in rows {
        let line = headers
            .iter()
            .map(|header| {
                let value = row_value(row, header).unwrap_or_default();
                format!("\"{}\"", value.replace('"', "\"\""))
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

pub fn row_value<'a>(row: &'a [(String, String)], key: &str) -> Option<&'a str> {
    row.iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn take_trimmed(field: &mut String) -> String {
    let value = field.trim().to_string();
    field.clear();
    value
}

fn strip_wrapping_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
