//! Text-level pre-passes applied to a candidate span before strict
//! parsing (spec §4.3 step B). Each function returns `(text, applied)`;
//! the repairing parser sets the matching `RepairMetadata` flag exactly
//! when `applied` is true.
//!
//! These are a deliberate departure from the donor crate's single-pass
//! "rewrite while parsing" style: the spec calls for a textual "fixed"
//! image distinct from the parsed value, so each repair here is its own
//! pass over owned `String`s rather than inline token substitution.

pub fn smart_quotes(s: &str) -> (String, bool) {
    use crate::classify::{is_double_quote_like, is_single_quote_like};
    let mut changed = false;
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch != '"' && is_double_quote_like(ch) {
            out.push('"');
            changed = true;
        } else if ch != '\'' && is_single_quote_like(ch) {
            out.push('\'');
            changed = true;
        } else {
            out.push(ch);
        }
    }
    (out, changed)
}

pub fn strip_json_comments(s: &str) -> (String, bool) {
    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut chars = s.chars().peekable();
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    while let Some(ch) = chars.next() {
        if in_str {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_str = false;
            }
            continue;
        }
        if ch == '"' || ch == '\'' {
            in_str = true;
            quote = ch;
            out.push(ch);
            continue;
        }
        if ch == '/' && chars.peek() == Some(&'/') {
            changed = true;
            chars.next();
            for c2 in chars.by_ref() {
                if c2 == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        if ch == '/' && chars.peek() == Some(&'*') {
            changed = true;
            chars.next();
            let mut prev = '\0';
            for c2 in chars.by_ref() {
                if prev == '*' && c2 == '/' {
                    break;
                }
                prev = c2;
            }
            continue;
        }
        out.push(ch);
    }
    (out, changed)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

pub fn replace_python_literals(s: &str) -> (String, bool) {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut i = 0usize;
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    while i < n {
        let ch = chars[i];
        if in_str {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_str = false;
            }
            i += 1;
            continue;
        }
        if ch == '"' || ch == '\'' {
            in_str = true;
            quote = ch;
            out.push(ch);
            i += 1;
            continue;
        }
        if is_ident_start(ch) {
            let start = i;
            let mut j = i + 1;
            while j < n && is_ident_continue(chars[j]) {
                j += 1;
            }
            let word: String = chars[start..j].iter().collect();
            let replacement = match word.as_str() {
                "True" => Some("true"),
                "False" => Some("false"),
                "None" => Some("null"),
                _ => None,
            };
            match replacement {
                Some(r) => {
                    out.push_str(r);
                    changed = true;
                }
                None => out.push_str(&word),
            }
            i = j;
            continue;
        }
        out.push(ch);
        i += 1;
    }
    (out, changed)
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    for ch in s.chars() {
        if in_str {
            current.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                in_str = true;
                quote = ch;
                current.push(ch);
            }
            ',' => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_continue)
}

fn looks_like_scalar_literal(v: &str) -> bool {
    v == "true"
        || v == "false"
        || v == "null"
        || v.starts_with('"')
        || v.starts_with('\'')
        || v.parse::<f64>().is_ok()
}

fn quote_scalar_if_needed(v: &str) -> String {
    if v.starts_with('\'') && v.ends_with('\'') && v.len() >= 2 {
        let inner = &v[1..v.len() - 1];
        return format!("\"{}\"", inner.replace('"', "\\\""));
    }
    if looks_like_scalar_literal(v) {
        return v.to_string();
    }
    format!("\"{}\"", v.replace('"', "\\\""))
}

/// Converts a top-level `ident = scalar[, ...]` shape into a JSON object
/// literal. Applies only when *every* comma-separated segment matches the
/// `ident = scalar` shape; otherwise the text is returned unchanged.
pub fn convert_kv_to_json(s: &str) -> (String, bool) {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') || trimmed.starts_with('[') {
        return (s.to_string(), false);
    }
    let parts = split_top_level_commas(trimmed);
    if parts.is_empty() {
        return (s.to_string(), false);
    }
    let mut pairs = Vec::with_capacity(parts.len());
    for part in &parts {
        let part = part.trim();
        if part.is_empty() {
            return (s.to_string(), false);
        }
        let eq = match part.find('=') {
            Some(i) => i,
            None => return (s.to_string(), false),
        };
        let key = part[..eq].trim();
        let val = part[eq + 1..].trim();
        if !is_ident(key) || val.is_empty() {
            return (s.to_string(), false);
        }
        pairs.push((key.to_string(), val.to_string()));
    }
    let mut out = String::from("{");
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(k);
        out.push_str("\":");
        out.push_str(&quote_scalar_if_needed(v));
    }
    out.push('}');
    (out, true)
}

pub fn quote_unquoted_keys(s: &str) -> (String, bool) {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(s.len() + 8);
    let mut changed = false;
    let mut i = 0usize;
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    let mut expect_key = true;
    while i < n {
        let ch = chars[i];
        if in_str {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_str = false;
            }
            i += 1;
            continue;
        }
        if ch == '"' || ch == '\'' {
            in_str = true;
            quote = ch;
            out.push(ch);
            i += 1;
            expect_key = false;
            continue;
        }
        if ch.is_whitespace() {
            out.push(ch);
            i += 1;
            continue;
        }
        if expect_key && is_ident_start(ch) {
            let start = i;
            let mut j = i + 1;
            while j < n && is_ident_continue(chars[j]) {
                j += 1;
            }
            let mut k = j;
            while k < n && chars[k].is_whitespace() {
                k += 1;
            }
            if k < n && chars[k] == ':' {
                out.push('"');
                for c in &chars[start..j] {
                    out.push(*c);
                }
                out.push('"');
                for c in &chars[j..k] {
                    out.push(*c);
                }
                i = k;
                changed = true;
                expect_key = false;
                continue;
            }
            for c in &chars[start..j] {
                out.push(*c);
            }
            i = j;
            expect_key = false;
            continue;
        }
        match ch {
            '{' | ',' => expect_key = true,
            _ => expect_key = false,
        }
        out.push(ch);
        i += 1;
    }
    (out, changed)
}

pub fn drop_trailing_commas(s: &str) -> (String, bool) {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    let mut i = 0usize;
    while i < n {
        let ch = chars[i];
        if in_str {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_str = false;
            }
            i += 1;
            continue;
        }
        if ch == '"' || ch == '\'' {
            in_str = true;
            quote = ch;
            out.push(ch);
            i += 1;
            continue;
        }
        if ch == ',' {
            let mut j = i + 1;
            while j < n && chars[j].is_whitespace() {
                j += 1;
            }
            if j < n && (chars[j] == '}' || chars[j] == ']') {
                changed = true;
                i += 1;
                continue;
            }
        }
        out.push(ch);
        i += 1;
    }
    (out, changed)
}

/// Converts `'...'` string literals (outside any existing `"..."` string)
/// into `"..."`, translating `\'` to `'` and escaping any raw `"` so the
/// result stays a valid double-quoted JSON string.
pub fn allow_single_quotes(s: &str) -> (String, bool) {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut i = 0usize;
    let mut in_dstr = false;
    let mut escape = false;
    while i < n {
        let ch = chars[i];
        if in_dstr {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_dstr = false;
            }
            i += 1;
            continue;
        }
        if ch == '"' {
            in_dstr = true;
            out.push(ch);
            i += 1;
            continue;
        }
        if ch == '\'' {
            changed = true;
            out.push('"');
            i += 1;
            let mut esc = false;
            while i < n {
                let c2 = chars[i];
                if esc {
                    match c2 {
                        '\'' => out.push('\''),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                    esc = false;
                    i += 1;
                    continue;
                }
                if c2 == '\\' {
                    esc = true;
                    i += 1;
                    continue;
                }
                if c2 == '\'' {
                    i += 1;
                    break;
                }
                if c2 == '"' {
                    out.push('\\');
                    out.push('"');
                    i += 1;
                    continue;
                }
                out.push(c2);
                i += 1;
            }
            out.push('"');
            continue;
        }
        out.push(ch);
        i += 1;
    }
    (out, changed)
}
