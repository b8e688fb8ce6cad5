//! Locates candidate payload substrings inside surrounding prose: fenced
//! code blocks first, then (JSON only) a balanced brace/bracket scan.
//!
//! Grounded on the donor crate's `parser::lex::fence_open_lang_newline_len`
//! / JSONP-trimming logic for fence recognition, generalized from "JSON
//! fences only" to a target-`Format` tag match, and rewritten over
//! `char_indices` rather than raw bytes since candidates returned here are
//! full `String`s, not zero-copy spans re-emitted token by token.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
    Xml,
    Sql,
    Generic,
}

fn tag_matches(tag: &str, format: Format) -> bool {
    let t = tag.trim().to_ascii_lowercase();
    match format {
        Format::Json => t.is_empty() || t == "json" || t == "jsonc",
        Format::Yaml => t == "yaml" || t == "yml",
        Format::Toml => t == "toml",
        Format::Xml => t == "xml" || t == "html",
        Format::Sql => t == "sql",
        Format::Generic => true,
    }
}

/// Up to four leading spaces on the fence's own line are tolerated; a tab
/// or more than four spaces disqualifies it.
fn preceded_by_allowed_indent(chars: &[char], pos: usize) -> bool {
    let mut k = pos;
    let mut count = 0;
    while k > 0 {
        match chars[k - 1] {
            ' ' => {
                count += 1;
                k -= 1;
                if count > 4 {
                    return false;
                }
            }
            '\n' | '\r' => return true,
            _ => return false,
        }
    }
    true
}

/// Finds the closing ``` for a fence body starting at `start`, skipping
/// over quoted string literals so an embedded ``` inside a JSON string
/// can't be mistaken for the real fence close.
fn find_fence_close(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    while i < chars.len() {
        let ch = chars[i];
        if in_str {
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
            i += 1;
            continue;
        }
        if ch == '`' && i + 2 < chars.len() && chars[i + 1] == '`' && chars[i + 2] == '`' {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn extract_fenced(text: &str, format: Format) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i + 2 < n {
        if chars[i] == '`' && chars[i + 1] == '`' && chars[i + 2] == '`' {
            if !preceded_by_allowed_indent(&chars, i) {
                i += 1;
                continue;
            }
            let mut j = i + 3;
            let tag_start = j;
            while j < n && chars[j] != '\n' && chars[j] != '\r' && !chars[j].is_whitespace() {
                j += 1;
            }
            let tag: String = chars[tag_start..j].iter().collect();
            while j < n && (chars[j] == ' ' || chars[j] == '\t') {
                j += 1;
            }
            if j < n && chars[j] == '\r' {
                j += 1;
            }
            if j < n && chars[j] == '\n' {
                j += 1;
            }
            let body_start = j;
            if let Some(end) = find_fence_close(&chars, body_start) {
                if tag_matches(&tag, format) {
                    let body: String = chars[body_start..end].iter().collect();
                    out.push(body.trim_end_matches(['\n', '\r']).to_string());
                }
                i = end + 3;
                continue;
            }
        }
        i += 1;
    }
    out
}

fn find_balanced_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_str = false;
    let mut quote = '"';
    let mut escape = false;
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        if in_str {
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
        match ch {
            '"' | '\'' => {
                in_str = true;
                quote = ch;
            }
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn balanced_scan(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < n {
        if chars[i] == '{' || chars[i] == '[' {
            if let Some(end) = find_balanced_end(&chars, i) {
                out.push(chars[i..=end].iter().collect());
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Returns every candidate found, in source order: fenced blocks if any
/// were found, else (JSON only) balanced-scan spans.
pub fn extract_candidates(text: &str, format: Format) -> Vec<String> {
    let fenced = extract_fenced(text, format);
    if !fenced.is_empty() {
        return fenced;
    }
    if format == Format::Json {
        return balanced_scan(text);
    }
    Vec::new()
}

/// Returns the first candidate, or the whole input if none was found.
pub fn extract_first_candidate(text: &str, format: Format) -> (String, bool) {
    let fenced = extract_fenced(text, format);
    if let Some(first) = fenced.into_iter().next() {
        return (first, true);
    }
    if format == Format::Json {
        if let Some(first) = balanced_scan(text).into_iter().next() {
            return (first, false);
        }
    }
    (text.to_string(), false)
}
