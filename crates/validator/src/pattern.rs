//! Pattern checks backing the second validation tier.
//!
//! None of these prove syntactic correctness; each is a cheap, precise
//! signal that a fragment is code- or config-shaped rather than prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Declaration shapes, one regex family per kind
static DECLARATION_PATTERNS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        // function/method heads
        Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:function|def|fn|func|fun)\s+\w+\s*\([^)]*\)")
            .expect("function regex is valid"),
        // type declarations
        Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:class|struct|trait|interface|enum|impl|module)\s+\w+")
            .expect("type regex is valid"),
        // variable bindings
        Regex::new(r"(?m)^\s*(?:pub\s+)?(?:const|let|var|val)\s+(?:mut\s+)?\w+\s*[:=]")
            .expect("binding regex is valid"),
        // imports and includes
        Regex::new(r"(?m)^\s*(?:import|from|use|require|#include|package|using)\b")
            .expect("import regex is valid"),
    ]
});

static KV_COLON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*["']?[A-Za-z0-9_.\-]+["']?\s*:(\s|$)"#).expect("colon kv regex is valid")
});

static KV_EQUALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[A-Za-z0-9_.\-]+\s*=").expect("equals kv regex is valid"));

static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]\n]+\]\s*$").expect("section regex is valid"));

/// Number of declaration families with at least one hit
pub(crate) fn declaration_hits(text: &str) -> usize {
    DECLARATION_PATTERNS
        .iter()
        .filter(|re| re.is_match(text))
        .count()
}

/// Bracket/brace/paren balance with string awareness
///
/// Double-quoted spans that close on the same line are skipped. Single
/// quotes are only skipped as short char literals (`'('`, `'\n'`); longer
/// spans are left in place so apostrophes and Rust lifetime ticks do not
/// swallow real delimiters. A closer with no matching opener fails
/// immediately; unclosed openers fail at the end.
pub(crate) fn check_balanced(text: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '"' => {
                    if let Some(close) = find_quote_close(&chars, i) {
                        i = close;
                    }
                }
                '\'' => {
                    if let Some(close) = find_quote_close(&chars, i) {
                        if close - i <= 3 {
                            i = close;
                        }
                    }
                }
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                '{' => stack.push('}'),
                c @ (')' | ']' | '}') => {
                    if stack.pop() != Some(c) {
                        return false;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
    stack.is_empty()
}

fn find_quote_close(chars: &[char], open: usize) -> Option<usize> {
    let quote = chars[open];
    let mut i = open + 1;
    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Strict JSON with an object or array root
///
/// Bare scalars parse as JSON too, but a fragment consisting of `42` is not
/// structured data worth keeping.
pub(crate) fn json_well_formed(text: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(text),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

/// YAML-like mapping shape: most non-blank lines are `key: value`
pub(crate) fn mapping_shape(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return false;
    }
    let hits = lines.iter().filter(|l| KV_COLON_RE.is_match(l)).count();
    hits as f32 / lines.len() as f32 >= 0.5
}

/// INI/properties shape: `key = value` lines, optionally under `[section]`
/// headers
pub(crate) fn config_shape(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let eq_hits = lines.iter().filter(|l| KV_EQUALS_RE.is_match(l)).count();
    let sections = lines.iter().filter(|l| SECTION_HEADER_RE.is_match(l)).count();
    let ratio = eq_hits as f32 / lines.len() as f32;

    if sections >= 1 && ratio >= 0.3 {
        return true;
    }
    lines.len() >= 2 && ratio >= 0.5
}
