//! Text form of a cached option list.
//!
//! Lists are written as a JSON array of strings. Reading is lenient: older rows
//! may hold a hand-written bracketed list (quotes optional, no escaping
//! guarantees) or one entry per line. Anything unreadable decodes to an empty
//! list, which callers treat as a cache miss.

pub fn encode(options: &[String]) -> String {
    serde_json::to_string(options).unwrap_or_else(|_| "[]".to_string())
}

pub fn decode(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
        return decode_bracketed(trimmed).unwrap_or_default();
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_bracketed(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in inner.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quote.is_some() => {
                current.push(ch);
                escaped = true;
            }
            '"' | '\'' if quote == Some(ch) => {
                quote = None;
                current.push(ch);
            }
            '"' | '\'' if quote.is_none() && current.trim().is_empty() => {
                quote = Some(ch);
                current.push(ch);
            }
            ',' if quote.is_none() => {
                push_item(&mut items, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if quote.is_some() {
        return None;
    }
    push_item(&mut items, &current);
    Some(items)
}

fn push_item(items: &mut Vec<String>, raw: &str) {
    let value = raw.trim();
    let value = strip_quotes(value)
        .map(unescape)
        .unwrap_or_else(|| value.to_string());
    if !value.trim().is_empty() {
        items.push(value);
    }
}

fn strip_quotes(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return Some(&value[1..value.len() - 1]);
        }
    }
    None
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
