//! Best-effort JSON extraction from free-form provider output.
//!
//! The provider is asked for bare JSON but may wrap it in prose or markdown
//! fences, or answer with single-quoted pseudo-JSON. Everything here is pure so
//! it can be exercised against a corpus of bad replies.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("no JSON object found in provider output")]
    NoJsonObject,

    #[error("invalid JSON in provider output: {0}")]
    Invalid(String),
}

/// Finds and parses the JSON object embedded in `text`.
///
/// Candidates, in order: spans inside the first fenced block anywhere in the
/// reply, then the span from the first `{` to the last `}`, then each
/// top-level brace-balanced object. Every candidate is tried
/// strictly first, then all again after normalization (single quotes,
/// trailing commas).
pub fn extract_json_object(text: &str) -> Result<Value, ExtractError> {
    let text = strip_json_fences(text);
    if !text.contains('{') {
        return Err(ExtractError::NoJsonObject);
    }

    let candidates = candidate_spans(text);
    if candidates.is_empty() {
        return Err(ExtractError::Invalid("unterminated JSON object".to_string()));
    }

    let mut first_error = None;
    for candidate in &candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<Value>(&normalize_pseudo_json(candidate)) {
            return Ok(value);
        }
    }

    Err(ExtractError::Invalid(
        first_error.map(|e| e.to_string()).unwrap_or_default(),
    ))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

fn greedy_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn candidate_spans(text: &str) -> Vec<&str> {
    let fenced = fenced_block(text).filter(|body| body.contains('{'));
    let mut spans: Vec<&str> = Vec::new();

    for source in fenced.into_iter().chain(std::iter::once(text)) {
        let found = greedy_object(source)
            .into_iter()
            .chain(balanced_objects(source));
        for span in found {
            if !spans.contains(&span) {
                spans.push(span);
            }
        }
    }
    spans
}

/// Top-level balanced objects in order. Stops at the first `{` that never
/// closes, since everything after it sits inside a truncated object.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match balanced_object_at(text, start) {
            Some(object) => {
                objects.push(object);
                from = start + object.len();
            }
            None => break,
        }
    }
    objects
}

/// Body of the first ``` fenced block anywhere in `text`, language tag dropped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let body = text[open + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// The `{ ... }` span opening at byte `start` whose braces balance,
/// ignoring braces inside double-quoted strings.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrites single-quoted strings as double-quoted and drops trailing commas.
///
/// A `'` inside a single-quoted string only closes it when followed by a
/// structural character (`,` `:` `}` `]`) or the end of input, so apostrophes
/// like `What's` survive.
fn normalize_pseudo_json(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                i = copy_double_quoted(&chars, i, &mut out);
                continue;
            }
            '\'' => {
                i = convert_single_quoted(&chars, i, &mut out);
                continue;
            }
            ',' if matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) => {}
            c => out.push(c),
        }
        i += 1;
    }
    out
}

fn copy_double_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut j = start + 1;
    while j < chars.len() {
        let c = chars[j];
        out.push(c);
        if c == '\\' && j + 1 < chars.len() {
            out.push(chars[j + 1]);
            j += 2;
            continue;
        }
        if c == '"' {
            return j + 1;
        }
        j += 1;
    }
    chars.len()
}

fn convert_single_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' if j + 1 < chars.len() => {
                if chars[j + 1] == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(chars[j + 1]);
                }
                j += 2;
                continue;
            }
            '\'' if closes_string(chars, j + 1) => {
                out.push('"');
                return j + 1;
            }
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
        j += 1;
    }
    chars.len()
}

fn closes_string(chars: &[char], from: usize) -> bool {
    matches!(
        next_significant(chars, from),
        None | Some(',') | Some(':') | Some('}') | Some(']')
    )
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars
        .get(from..)?
        .iter()
        .find(|c| !c.is_whitespace())
        .copied()
}
