//! Cleanup of model output into a single documentation comment block.
//!
//! [`extract_comment`] runs a fixed sequence of stages. Each stage is a
//! total function: when it cannot do its job it hands the text on
//! unchanged, so the pipeline always yields some text.
//!
//! [`sanitize_generics`] runs separately, on the block about to be
//! written, so that `List<String>` in prose is not read as an HTML tag.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

const OPEN: &str = "/**";
const CLOSE: &str = "*/";
const FENCE: &str = "```";

/// HTML tags left untouched inside comment prose.
const ALLOWED_TAGS: [&str; 7] = ["p", "code", "pre", "br", "li", "em", "a"];

lazy_static! {
    static ref CONTENT_FIELD: Regex =
        Regex::new(r#"(?s)"content"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref LANGUAGE_TAG: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_+#.-]*$").unwrap();
}

/// Run every extraction stage in order.
pub fn extract_comment(raw: &str) -> String {
    let text = unescape_escaped(raw);
    let text = unwrap_json_envelope(&text);
    let text = strip_code_fence(&text);
    match comment_span(&text) {
        Some(span) => span,
        None => wrap_as_comment(&text),
    }
}

/// Stage 1 as the pipeline applies it. Text that already spans several
/// lines is taken as decoded and left alone, and JSON objects keep their
/// escapes for the envelope stage.
pub fn unescape_escaped(text: &str) -> String {
    if text.contains('\n') || text.trim_start().starts_with('{') {
        return text.to_string();
    }
    unescape(text)
}

/// JSON string escapes, plus `\uXXXX` / bare `uXXXX` forms of
/// `<`, `>`, `&`, `=` and `'`.
pub fn unescape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                let simple = match next {
                    'n' => Some('\n'),
                    'r' => Some('\r'),
                    't' => Some('\t'),
                    '"' => Some('"'),
                    '\'' => Some('\''),
                    '\\' => Some('\\'),
                    _ => None,
                };
                if let Some(replacement) = simple {
                    out.push(replacement);
                    i += 2;
                    continue;
                }
                if next == 'u' {
                    if let Some(decoded) = decode_unicode(&chars, i + 2) {
                        out.push(decoded);
                        i += 6;
                        continue;
                    }
                }
            }
        } else if c == 'u' && !preceded_by_word(&chars, i) {
            if let Some(decoded) = decode_unicode(&chars, i + 1) {
                out.push(decoded);
                i += 5;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }

    out
}

fn preceded_by_word(chars: &[char], i: usize) -> bool {
    i > 0 && chars[i - 1].is_ascii_alphanumeric()
}

/// Four hex digits at `start` naming one of the escaped characters.
fn decode_unicode(chars: &[char], start: usize) -> Option<char> {
    let digits: String = chars.get(start..start + 4)?.iter().collect();
    match digits.to_ascii_lowercase().as_str() {
        "003c" => Some('<'),
        "003e" => Some('>'),
        "0026" => Some('&'),
        "003d" => Some('='),
        "0027" => Some('\''),
        _ => None,
    }
}

/// Stage 2: pull `content` out of a JSON object; first match wins.
pub fn unwrap_json_envelope(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return text.to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(content) = find_content(&value) {
            return unescape_escaped(content);
        }
    }

    // Escapes are still raw here, so `\"` inside the value does not end it.
    match CONTENT_FIELD.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(content) => unescape(content.as_str()),
        None => text.to_string(),
    }
}

fn find_content(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(content)) = map.get("content") {
                return Some(content);
            }
            map.values().find_map(find_content)
        }
        Value::Array(items) => items.iter().find_map(find_content),
        _ => None,
    }
}

/// Stage 3: keep only the body of the first fenced block.
pub fn strip_code_fence(text: &str) -> String {
    let Some(open) = text.find(FENCE) else {
        return text.to_string();
    };
    let body_start = open + FENCE.len();
    let Some(close) = text[body_start..].find(FENCE) else {
        return text.to_string();
    };
    let inner = &text[body_start..body_start + close];

    let inner = match inner.split_once('\n') {
        Some((first, rest)) if LANGUAGE_TAG.is_match(first.trim()) => rest,
        _ => inner,
    };
    inner.trim().to_string()
}

/// Stage 4: the `/** … */` span, the open-ended tail after `/**`, or
/// the text itself when it already reads like comment lines.
pub fn comment_span(text: &str) -> Option<String> {
    if let Some(start) = text.find(OPEN) {
        let after_open = start + OPEN.len();
        return Some(match text[after_open..].find(CLOSE) {
            Some(end) => text[start..after_open + end + CLOSE.len()].to_string(),
            None => text[start..].trim_end().to_string(),
        });
    }

    let comment_like = text
        .lines()
        .any(|line| line.trim_start().starts_with('*'));
    if comment_like {
        return Some(text.to_string());
    }
    None
}

/// Stage 5: wrap plain text as a comment block; blank text stays empty.
pub fn wrap_as_comment(text: &str) -> String {
    let lines: Vec<&str> = text.trim().lines().map(str::trim_end).collect();
    if lines.iter().all(|line| line.trim().is_empty()) {
        return String::new();
    }

    let mut block = String::from("/**\n");
    for line in lines {
        if line.is_empty() {
            block.push_str(" *\n");
        } else {
            block.push_str(" * ");
            block.push_str(line.trim_start());
            block.push('\n');
        }
    }
    block.push_str(" */");
    block
}

/// Make angle brackets in prose safe for documentation rendering.
///
/// Generic types such as `Map<K, List<V>>` become `{@code …}`; any other
/// tag outside [`ALLOWED_TAGS`] becomes `{@literal …}`. Tag lines
/// (`@param`, `@throws`, …) pass through untouched.
pub fn sanitize_generics(comment: &str) -> String {
    comment
        .split('\n')
        .map(|line| {
            if is_tag_line(line) {
                line.to_string()
            } else {
                sanitize_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_tag_line(line: &str) -> bool {
    let body = line.trim_start();
    let body = body.strip_prefix(OPEN).unwrap_or(body);
    let body = body.trim_start_matches('*').trim_start();
    body.starts_with('@')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn sanitize_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Existing inline tags are already safe.
        if c == '{' && chars.get(i + 1) == Some(&'@') {
            let end = matching(&chars, i, '{', '}').unwrap_or(chars.len() - 1);
            out.extend(&chars[i..=end]);
            i = end + 1;
            continue;
        }

        if is_ident_start(c) && (i == 0 || !is_ident_char(chars[i - 1])) {
            let mut j = i;
            while j < chars.len() && (is_ident_char(chars[j]) || chars[j] == '.') {
                j += 1;
            }
            if chars.get(j) == Some(&'<') && chars[j - 1] != '.' {
                if let Some(close) = matching(&chars, j, '<', '>') {
                    let inner = &chars[j + 1..close];
                    if looks_like_type_arguments(inner) && !is_allowed_tag(inner) {
                        out.push_str("{@code ");
                        out.extend(&chars[i..=close]);
                        out.push('}');
                        i = close + 1;
                        continue;
                    }
                }
            }
            out.extend(&chars[i..j]);
            i = j;
            continue;
        }

        if c == '<' {
            if let Some(offset) = chars[i + 1..].iter().position(|&ch| ch == '>') {
                let close = i + 1 + offset;
                let span: String = chars[i..=close].iter().collect();
                if is_allowed_tag(&chars[i + 1..close]) {
                    out.push_str(&span);
                } else {
                    out.push_str("{@literal ");
                    out.push_str(&span);
                    out.push('}');
                }
                i = close + 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Index of the bracket closing the one at `open`.
fn matching(chars: &[char], open: usize, left: char, right: char) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &c) in chars[open..].iter().enumerate() {
        if c == left {
            depth += 1;
        } else if c == right {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

fn looks_like_type_arguments(inner: &[char]) -> bool {
    !inner.is_empty()
        && inner.iter().all(|&c| {
            is_ident_char(c) || matches!(c, '.' | ',' | ' ' | '?' | '<' | '>' | '[' | ']' | '&')
        })
}

fn is_allowed_tag(inner: &[char]) -> bool {
    let name: String = inner
        .iter()
        .skip_while(|c| **c == '/' || c.is_whitespace())
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    ALLOWED_TAGS.contains(&name.as_str())
}
